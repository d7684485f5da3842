//! The boundary between the strategy engine and its hosting platform.
//!
//! The engine consumes a single merged event stream ([`Host::next_event`])
//! plus three capabilities: periodic polling ([`Host::subscribe`]),
//! on-demand requests correlated by token ([`Host::send`]), and a
//! millisecond clock. Everything exchange- or transport-specific lives on
//! the far side of this boundary.

mod event;
mod fingerprint;
mod host;
mod notify;
mod request;
mod response;
mod transport;

pub use event::{Event, Interrupt};
pub use fingerprint::Fingerprint;
pub use host::{Host, Token};
pub use notify::{LogNotifier, Notifier};
pub use request::{Method, RequestPayload, SignSpec};
pub use response::{ResponsePayload, TransportFailure};
pub use transport::{TransportError, TransportErrorKind};
