//! This crate talks to the SerDes block of a GateMate FPGA through its JTAG port, at a variety of
//! levels of abstraction.  At the lowest level is the JTAG cable: the FT2232H / FT232H MPSSE
//! engine on GateMate boards and programmers, or plain GPIO pins.  The Cable trait allows for
//! changing modes and shifting bits in and out of the JTAG chain.
//!
//! The next higher level of abstraction is the JtagSM, which keeps track of the mode of the TAPs.
//! You tell it which mode you want (e.g., Reset or Idle) and it gets there with the fewest number
//! of mode changes.  You can also read and write the instruction and data registers.
//!
//! `Taps` counts the TAPs on the chain from their IDCODEs, and shifts instructions and data for
//! one of them while keeping the others in BYPASS.  `SerdesJtag` uses that to run the GateMate's
//! register-file instructions, and `session` scans whole address ranges and decodes them with
//! the field catalog in `regfile`.
//!
//! # Example
//! ```no_run
//! use serdes_taps::cable;
//! use serdes_taps::discovery::{self, Board};
//! use serdes_taps::protocol::SerdesJtag;
//! use serdes_taps::regfile::Band;
//! use serdes_taps::statemachine::JtagSM;
//!
//! let identity = discovery::resolve(Board::Evb)?;
//! let cable = cable::open(&identity, "10M".parse()?)?;
//! let mut jtag = SerdesJtag::attach(JtagSM::new(cable)?, 0)?;
//!
//! for word in jtag.scan_band(Band::Pll) {
//!     for field in word?.decode() {
//!         println!("{} = {}", field.field.name, field.value);
//!     }
//! }
//! # Ok::<(), serdes_taps::error::Error>(())
//! ```

pub mod bits;
pub mod cable;
pub mod config;
pub mod discovery;
pub mod error;
pub mod protocol;
pub mod regfile;
pub mod session;
pub mod statemachine;
pub mod taps;
pub mod template;

pub use error::{Error, Result};
