//! Implementations for different JTAG hardware adapters live here.  Hardware adapters should
//! implement the `Cable` trait.
pub mod gpio;
#[cfg(feature = "ftdi")]
pub mod mpsse;
#[cfg(test)]
pub(crate) mod sim;

use crate::bits::Bits;
#[cfg(feature = "ftdi")]
use crate::{config::Frequency, discovery::AdapterIdentity};

#[derive(Debug, thiserror::Error)]
pub enum CableError {
    #[cfg(feature = "ftdi")]
    #[error("FTDI driver error")]
    Ftdi(#[from] libftd2xx::FtStatus),
    #[cfg(feature = "ftdi")]
    #[error("FTDI transfer timed out")]
    Timeout(#[from] libftd2xx::TimeoutError),
    #[cfg(feature = "ftdi")]
    #[error("unexpected FTDI device type")]
    DeviceType(#[from] libftd2xx::DeviceTypeError),
    #[cfg(feature = "ftdi")]
    #[error("USB error")]
    Usb(#[from] rusb::Error),
    #[error("GPIO error: {0:?}")]
    Gpio(embedded_hal::digital::ErrorKind),
}

pub trait Cable {
    /// Clock out a series of TMS values to change the state of the JTAG chain.  Each element of
    /// `tms` determines the value of the TMS line, zero for low and any other value for high.
    /// `tdi` controls the state of the TDI line during mode changes.
    fn change_mode(&mut self, tms: &[usize], tdi: bool) -> Result<(), CableError>;

    /// Shift `data` out on TDI, index 0 first.  Should be called with state = ShiftIR or ShiftDR.
    /// State won't change unless `pause_after` is true, in which case the last bit is clocked with
    /// TMS high and the chain is left in PauseIR or PauseDR.
    fn write_data(&mut self, data: &Bits, pause_after: bool) -> Result<(), CableError>;

    /// Same as `write_data`, but returns the bits captured on TDO while shifting, first captured
    /// bit at index 0.
    fn read_write_data(&mut self, data: &Bits, pause_after: bool) -> Result<Bits, CableError>;

    /// Capture `bits` from TDO while shifting zeros in.
    fn read_data(&mut self, bits: usize, pause_after: bool) -> Result<Bits, CableError> {
        self.read_write_data(&Bits::zeros(bits), pause_after)
    }
}

/// Open the MPSSE engine behind `identity` with TCK running at `clock`.
#[cfg(feature = "ftdi")]
pub fn open(identity: &AdapterIdentity, clock: Frequency) -> Result<Box<dyn Cable>, CableError> {
    tracing::debug!("opening {identity} at {clock}");
    let cable = mpsse::open(identity, clock.hz())?;
    Ok(cable)
}
