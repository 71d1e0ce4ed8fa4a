//! Session synchronization engine for shared code rooms.
//!
//! A client joins a room through a relay, keeps one shared code buffer in
//! sync with the other members (whole-buffer, last writer wins), shows who
//! is present and who is typing, and forwards run requests to an execution
//! backend whose output every member sees.
//!
//! [`Session`] is the state machine and can be driven directly with explicit
//! instants. [`runtime::connect`] wires it to the relay transport and a
//! single-task event loop for hosts that just want a [`SessionHandle`].

pub mod assistant;
pub mod buffer;
pub mod config;
pub mod events;
pub mod execution;
pub mod files;
pub mod form;
pub mod language;
pub mod outbox;
pub mod presence;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod transport;
pub mod typing;

pub use config::{Config, ConfigError, SessionConfig, TransportConfig};
pub use events::{InboundEvent, OutboundEvent};
pub use execution::ResponsePolicy;
pub use form::JoinForm;
pub use language::Language;
pub use runtime::{RuntimeError, SessionHandle, connect};
pub use session::{MembershipState, Session, SessionError, SessionView};
