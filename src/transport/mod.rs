// ABOUTME: Concrete transport adapters behind the core channel traits.
// ABOUTME: Request/response over HTTP, persistent channel over WebSocket.

pub mod http;
pub mod socket;

pub use http::RestTransport;
pub use socket::SocketTransport;
