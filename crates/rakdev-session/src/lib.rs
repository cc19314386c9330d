//! RAK LoRaWAN Module Session
//!
//! Drives a RAK3172 / RAK3272 module through its serial AT interface: brings
//! it up from a [`SessionConfig`], joins the network, keeps signal and time
//! status fresh, and sends and receives application data.
//!
//! # Layers
//!
//! - [`LineTransport`]: newline-delimited text over a byte stream
//!   ([`StreamTransport`] wraps any `Read + Write`, e.g. a serial port)
//! - [`Commander`]: one request/response exchange at a time, with busy retry
//!   and routing of unsolicited lines into events
//! - [`Session`]: the join lifecycle state machine and periodic work
//! - [`Messenger`]: optional uplink queue with retry and a downlink buffer
//!
//! All timing goes through a [`Clock`], so tests run on a [`ManualClock`].
//!
//! # Example
//!
//! ```rust,ignore
//! use rakdev_session::{Messenger, Message, Session, SessionConfig, StreamTransport, SystemClock};
//!
//! let config = SessionConfig::from_yaml_file("rakdev.yaml")?;
//! let clock = SystemClock::new();
//! let transport = StreamTransport::new(serial_port, clock.clone());
//!
//! let mut session = Session::new(config, transport, clock);
//! session.setup()?;
//!
//! let mut messenger = Messenger::new(session);
//! messenger.transmit(Message::new(2, b"hello".to_vec(), true));
//! loop {
//!     messenger.process();
//!     while let Some(downlink) = messenger.receive() {
//!         println!("port {}: {:02X?}", downlink.port, downlink.payload);
//!     }
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//! }
//! ```

mod clock;
mod commander;
mod config;
mod error;
mod messenger;
mod session;
mod status;
mod transport;

pub use clock::*;
pub use commander::*;
pub use config::*;
pub use error::*;
pub use messenger::*;
pub use session::*;
pub use status::*;
pub use transport::*;
