//! Validators comparing one fixture entity with what the node reports for it.
//!
//! Expected values always come from [`crate::projection`]; the validators only
//! decide which calls to issue and which fields to leave out.
pub mod account;
pub mod block;

pub use account::{validate_account_state, validate_accounts};
pub use block::{validate_block, validate_last_block};
