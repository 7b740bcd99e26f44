//! JSON-RPC plumbing: wire types, the transport seam and the call driver.
pub mod client;
pub mod error;
pub mod methods;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{CallResult, RpcClient};
pub use transport::{HttpTransport, Transport};
