//! Session transport: one persistent bidirectional stream to the live
//! endpoint, exposed as an outbound frame handle plus a tagged inbound
//! event stream.

pub mod protocol;
pub mod session;
pub mod websocket;

pub use protocol::{ServerMessage, SessionEvent};
pub use session::{MockTransport, Transport, TransportHandle};
pub use websocket::WsTransport;
