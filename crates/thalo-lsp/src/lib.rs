//! Language server frontend: JSON-RPC transport, capability negotiation,
//! and request dispatch over the read-only services of `thalo-services`
//! plus `thalo-checker` for diagnostics. LSP transport wiring itself is
//! treated as an external collaborator, so this stays intentionally thin
//! next to the rest of the workspace.

mod capabilities;
mod protocol;
mod server;
mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::Server;
