//! Utilities to discover blockchain fixture files on disk and decide,
//! before a scenario runs, whether it should be skipped or is expected to fail.
pub mod constants;
pub mod dir_reader;
pub mod filter;
pub mod path;
pub mod utils;
