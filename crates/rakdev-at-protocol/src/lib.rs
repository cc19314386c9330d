//! RAK3172 / RAK3272 AT Command Protocol
//!
//! This crate provides the wire-level types for driving a RAKwireless LoRaWAN
//! module over its serial AT command interface. It performs no I/O; the
//! `rakdev-session` crate pairs it with a transport and a clock.
//!
//! # Protocol Overview
//!
//! The module speaks a newline-terminated text protocol:
//!
//! - **Requests** (host → module): `AT+<NAME>` followed by `=?` for a query or
//!   `=<value>` for a set, e.g. `AT+BAND=?`, `AT+DR=5`
//! - **Query responses**: the echoed name and the value, e.g. `AT+BAND=4`
//! - **Set / action responses**: a bare `OK`
//! - **Busy**: `AT_BUSY_ERROR` when the module cannot take a request yet
//! - **Unsolicited lines**: `+EVT:<TYPE>[:args]` asynchronous events, `+BC:` and
//!   `+PS:` beacon/ping-slot notices, `Restricted_Wait_<ms>_ms` duty-cycle
//!   notices and `Current Work Mode: <mode>.` banners
//!
//! # Command Families
//!
//! - **Actions** ([`Action`]): `SLEEP`, `RESET`, answered by `OK`
//! - **Queries** ([`Query`]): read-only values such as `VER`, `RSSI`, `ARSSI`
//! - **Attributes** ([`AttributeCommand`]): boolean, integer, text and hex
//!   settings that can be queried or set, each range-checked against its
//!   [`Attribute`] descriptor
//! - **Asynchronous operations**: [`JoinCommand`], [`SendCommand`],
//!   [`LinkCheckCommand`] and [`TimeRequestCommand`] return `OK` immediately and
//!   report their outcome later as an [`Event`]
//!
//! # Example
//!
//! ```rust,ignore
//! use rakdev_at_protocol::{catalog, Command, IntegerCommand, classify, Unsolicited};
//!
//! let mut band = IntegerCommand::set(&catalog::BAND, 4);
//! band.validate_request()?;
//! assert_eq!(band.build_request(), "AT+BAND=4");
//! band.parse_response("OK")?;
//!
//! match classify("+EVT:JOINED") {
//!     Unsolicited::Event(event) => assert_eq!(event.kind(), "JOINED"),
//!     _ => unreachable!(),
//! }
//! ```

mod codec;
mod commands;
mod error;
mod event;
mod types;
pub mod validate;

pub use codec::*;
pub use commands::*;
pub use error::*;
pub use event::*;
pub use types::*;
