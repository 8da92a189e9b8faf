use std::path::PathBuf;

use crate::cable::CableError;

/// Everything that can go wrong above the cable.  Nothing in this crate retries: a JTAG chain left
/// half way through a shift is worse off than one that reports the failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no FTDI adapter found (looked for FT2232H 0403:6010 and FT232H 0403:6014)")]
    NoAdapterFound,
    #[error("no devices found in JTAG chain: every IDCODE slot of the discovery scan read zero")]
    ChainEmpty,
    #[error("chain index {index} is out of range for a JTAG chain of {length} device(s)")]
    ChainIndexOutOfRange { index: usize, length: usize },
    #[error("JTAG transport failure")]
    Transport(#[from] CableError),
    #[error("reading register {address:#04x}")]
    Register {
        address: u8,
        #[source]
        source: Box<Error>,
    },
    #[error("field {name} has invalid bit range [{high}:{low}]")]
    InvalidFieldRange {
        name: &'static str,
        high: u8,
        low: u8,
    },
    #[error("reset value {value:#x} of field {name} does not fit in {width} bit(s)")]
    ResetValueTooWide {
        name: &'static str,
        value: u16,
        width: u8,
    },
    #[error("fields {first} and {second} overlap in register {address:#04x}")]
    FieldOverlap {
        first: &'static str,
        second: &'static str,
        address: u8,
    },
    #[error("configuration data needs at least two bytes, got {0}")]
    EmptyConfiguration(usize),
    #[error("expected {expected} bits, got {actual}")]
    BitLength { expected: usize, actual: usize },
    #[error("value {value:#x} does not fit in {bits} bits")]
    ValueTooWide { value: u128, bits: usize },
    #[error("field {0} is read-only")]
    ReadOnlyField(&'static str),
    #[error("value {value:#x} does not fit in field {name} ({width} bit(s))")]
    ValueOutOfRange {
        name: &'static str,
        value: u16,
        width: u8,
    },
    #[error("cannot tell template format from {0:?}; expected .v, .sv, .vhd or .vhdl")]
    UnknownTemplateFormat(PathBuf),
    #[error("invalid clock frequency {0:?}; expected e.g. 500k or 10M, at most 30M")]
    InvalidFrequency(String),
    #[error("invalid adapter identity {0:?}; expected e.g. ftdi://ftdi:2232h/1")]
    InvalidIdentity(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Tag a failure with the register address being read when it happened.
    pub fn at(address: u8, source: Error) -> Self {
        Error::Register {
            address,
            source: Box::new(source),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
