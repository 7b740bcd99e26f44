pub mod config;
pub mod models;
pub mod normalizers;
pub mod projection;
pub mod rpc;
pub mod scenario;
#[cfg(any(test, feature = "testing"))]
pub mod test_utils;
pub mod traits;
pub mod utils;
pub mod validators;
