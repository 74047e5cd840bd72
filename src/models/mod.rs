//! Data models

mod diagnostic;
mod interface;
mod network;
mod node;
mod role;

pub use diagnostic::*;
pub use interface::*;
pub use network::*;
pub use node::*;
pub use role::*;
