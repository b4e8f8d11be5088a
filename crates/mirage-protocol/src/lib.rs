//! # mirage-protocol
//!
//! The JSON side of the debugger bridge.
//!
//! - [`serializer`]: mirrors to protocol JSON
//! - [`command`]: text commands to JSON requests
//! - [`response`]: JSON responses to text
//! - [`event`]: break and exception events to text
//! - [`json`]: the encoding primitives all of the above share
//!
//! Translation in both directions is pure apart from the [`SessionState`]
//! cursor, which is passed in explicitly.
//!
//! ## Example
//!
//! ```rust
//! use mirage_protocol::{Session, Translation};
//!
//! let mut session = Session::new();
//! let Ok(Translation::Request(json)) = session.translate("step in 3") else {
//!     panic!("step produces a request");
//! };
//! assert_eq!(
//!     json,
//!     r#"{"seq":0,"type":"request","command":"continue","arguments":{"stepaction":"in","stepcount":3}}"#
//! );
//! ```

pub mod command;
pub mod error;
pub mod event;
pub mod json;
pub mod request;
pub mod response;
pub mod serializer;
pub mod session;

pub use command::{command_to_json_request, DebugCommand, ScriptTypes, StepAction, Translation, HELP_LINES};
pub use error::{CommandError, CommandResult, FormatError};
pub use event::{event_to_text, source_underline, BreakPointHit, DebugEvent, DebugEventType};
pub use json::ProtocolValue;
pub use request::RequestPacket;
pub use response::{format_response, ResponseDetails};
pub use serializer::{to_json_protocol, JsonProtocolSerializer};
pub use session::{Session, SessionState};
