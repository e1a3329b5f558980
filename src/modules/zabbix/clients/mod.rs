pub mod jsonrpc;
pub mod traits;

pub use jsonrpc::{ZabbixClient, ZabbixError};
pub use traits::*;
