/// MCP transport
///
/// `protocol` holds the JSON-RPC wire types and `server` the stdin/stdout loop
/// that routes tool calls to the progress tools.

pub mod protocol;
pub mod server;

pub use server::McpServer;
