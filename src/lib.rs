//! A SEMI E5 (SECS-II) / SEMI E37.1 (HSMS-SS) messaging stack for
//! semiconductor equipment, in pure rust.
//!
//! The crate covers the wire core of an equipment- or host-side
//! connection: the SECS-II item codec ([`SecsValue`]), the ten-byte message
//! header and framing ([`MessageHeader`], [`DataMessage`]), the per-port
//! HSMS-SS session engine ([`SecsPort`]), and the process-wide
//! [`MessageManager`] that owns ports, sequence counters, and the
//! stream/function handler table.
//!
//! ```rust,no_run
//! use hsmsconnect::{DataMessage, MessageManager, SecsResult, SecsValue, StreamFunction};
//!
//! fn main() -> SecsResult<()> {
//!     let manager = MessageManager::new();
//!     manager.register_handler(StreamFunction::new(2, 41, true), |msg| {
//!         // host command: accept unconditionally
//!         Some(SecsValue::List(vec![SecsValue::U1(0), SecsValue::List(vec![])]))
//!     })?;
//!
//!     let port = manager.create_port(
//!         "host-link",
//!         "hsms-passive://0.0.0.0:5000?device_id=17",
//!         None,
//!         true,
//!     )?;
//!     port.go_online()?;
//!     // ... the handler serves S2F41 until we leave
//!     manager.stop_ports_if_needed(true)?;
//!     Ok(())
//! }
//! ```
//!
//! Deliberately out of scope: HSMS-GS, TLS, the SECS-I serial transport,
//! and SML text parsing (values render SML-like for debugging only).

#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

mod conn;
mod manager;
mod protocol;
mod secs_error;

pub use crate::conn::{
    ConnectParams, ConnectParamsBuilder, IntoConnectParams, PendingReply, PortConfiguration,
    PortConnectionState, PortMode, SecsPort,
};
pub use crate::manager::{MessageHandler, MessageManager};
pub use crate::protocol::{
    DataMessage, DeselectStatus, ItemFormat, MessageBuilder, MessageHeader, RejectReason,
    SecsValue, SelectStatus, SessionType, StreamFunction, PTYPE_SECS_II, SESSION_ID_ALL,
};
pub use crate::secs_error::{SecsError, SecsResult, SendRejectReason};
