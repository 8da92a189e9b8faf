//! Implement the `Cable` trait for FTDI chips with an MPSSE engine: the FT2232H on the GateMate
//! evaluation board and the FT232H in the GateMate programmer.
use crate::bits::{BitOrder, Bits, ByteOrder};
use crate::cable::{Cable, CableError};
use crate::discovery::{AdapterIdentity, AdapterKind};

use std::time::Duration;

use ftdi_mpsse::{ClockTMS, ClockTMSOut};
use libftd2xx::{ClockBits, ClockBitsOut, ClockData, ClockDataOut};
use libftd2xx::{Ft2232h, Ft232h, Ftdi, FtdiCommon, FtdiMpsse, MpsseCmdBuilder, MpsseCmdExecutor};

/// Fastest TCK the MPSSE engine can produce
pub const MAX_CLOCK_HZ: u32 = 30_000_000;
/// Slowest TCK the MPSSE engine can produce, with the divide-by-5 prescaler on
pub const MIN_CLOCK_HZ: u32 = 92;

// A single clock_data command moves at most this many bytes
const MAX_CHUNK: usize = 65536;

// Lower pins
const PIN_TCK: u8 = 1;
const PIN_TDI: u8 = 1 << 1;
//const PIN_TDO: u8 = 1 << 2;
const PIN_TMS: u8 = 1 << 3;
const LOWER_OUTPUT_PINS: u8 = PIN_TCK | PIN_TDI | PIN_TMS;

/// How a shift of `len` bits is split into MPSSE commands: whole bytes, then a partial byte, then
/// optionally the last bit clocked together with TMS high to leave Shift for Pause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Layout {
    bytes: usize,
    bits: u8,
    tms_exit: bool,
}

impl Layout {
    fn new(len: usize, pause_after: bool) -> Self {
        let tms_exit = pause_after && len > 0;
        let body = if tms_exit { len - 1 } else { len };
        Self {
            bytes: body / 8,
            bits: (body % 8) as u8,
            tms_exit,
        }
    }

    /// Number of bytes the engine hands back for a capturing shift
    fn response_len(&self) -> usize {
        self.bytes + usize::from(self.bits > 0) + usize::from(self.tms_exit)
    }
}

/// Build the commands that shift `data` out, capturing TDO if `read` is set.
fn build(data: &Bits, layout: Layout, read: bool) -> MpsseCmdBuilder {
    let packed = data.to_bytes();
    let mut builder = MpsseCmdBuilder::new();

    for chunk in packed[..layout.bytes].chunks(MAX_CHUNK) {
        builder = if read {
            builder.clock_data(ClockData::LsbPosIn, chunk)
        } else {
            builder.clock_data_out(ClockDataOut::LsbNeg, chunk)
        };
    }

    if layout.bits > 0 {
        let byte = packed[layout.bytes];
        builder = if read {
            builder.clock_bits(ClockBits::LsbPosIn, byte, layout.bits)
        } else {
            builder.clock_bits_out(ClockBitsOut::LsbNeg, byte, layout.bits)
        };
    }

    if layout.tms_exit {
        let last_bit = data.get(data.len() - 1).unwrap_or(false);
        // Shift -> Exit1 with the last data bit on TDI, then Exit1 -> Pause
        builder = if read {
            builder.clock_tms(ClockTMS::NegTMSPosTDO, 0b01, last_bit, 2)
        } else {
            builder.clock_tms_out(ClockTMSOut::NegEdge, 0b01, last_bit, 2)
        };
    }

    if read {
        builder = builder.send_immediate();
    }
    builder
}

/// Turn the engine's response back into captured bits.  Partial bytes come back in the top bits;
/// the bit captured on the Shift -> Exit1 edge lands in bit 6 of the TMS response byte.
fn unpack(response: &[u8], layout: Layout) -> Bits {
    let mut out = Bits::from_bytes(&response[..layout.bytes], BitOrder::LsbFirst, ByteOrder::MsbyFirst);
    let mut idx = layout.bytes;

    if layout.bits > 0 {
        let byte = response[idx] >> (8 - layout.bits);
        for i in 0..layout.bits {
            out.push((byte >> i) & 1 == 1);
        }
        idx += 1;
    }

    if layout.tms_exit {
        out.push((response[idx] >> 6) & 1 == 1);
    }
    out
}

/// Pack a TMS sequence into `clock_tms_out` commands of at most 7 bits each.
fn tms_commands(tms: &[usize], tdi: bool) -> MpsseCmdBuilder {
    let mut builder = MpsseCmdBuilder::new();
    for chunk in tms.chunks(7) {
        let buf = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, x)| if *x != 0 { acc | (1 << i) } else { acc });
        builder = builder.clock_tms_out(ClockTMSOut::NegEdge, buf, tdi, chunk.len() as u8);
    }
    builder
}

pub struct Mpsse<T> {
    ft: T,
}

impl<T> Mpsse<T>
where
    T: FtdiCommon + FtdiMpsse + MpsseCmdExecutor,
    CableError: From<<T as MpsseCmdExecutor>::Error>,
{
    /// Put `ft` into MPSSE mode with TCK at `clock` hertz and TMS idling high.
    pub fn new(mut ft: T, clock: u32) -> Result<Self, CableError> {
        let clock = clamp_clock(clock);

        ft.initialize_mpsse_default()?;
        ft.set_clock(clock)?;
        ft.set_latency_timer(Duration::from_millis(1))?;

        let builder = MpsseCmdBuilder::new()
            .disable_3phase_data_clocking()
            .disable_adaptive_data_clocking()
            .set_gpio_lower(PIN_TMS, LOWER_OUTPUT_PINS);
        MpsseCmdExecutor::send(&mut ft, builder.as_slice())?;

        Ok(Self { ft })
    }
}

fn clamp_clock(clock: u32) -> u32 {
    if clock < MIN_CLOCK_HZ {
        tracing::warn!("{clock} Hz is below what the MPSSE engine can do, using {MIN_CLOCK_HZ} Hz");
        MIN_CLOCK_HZ
    } else if clock > MAX_CLOCK_HZ {
        tracing::warn!("{clock} Hz is above what the MPSSE engine can do, using {MAX_CLOCK_HZ} Hz");
        MAX_CLOCK_HZ
    } else {
        clock
    }
}

impl<T> Cable for Mpsse<T>
where
    T: FtdiCommon + FtdiMpsse + MpsseCmdExecutor,
    CableError: From<<T as MpsseCmdExecutor>::Error>,
{
    fn change_mode(&mut self, tms: &[usize], tdi: bool) -> Result<(), CableError> {
        if tms.is_empty() {
            return Ok(());
        }
        let builder = tms_commands(tms, tdi);
        MpsseCmdExecutor::send(&mut self.ft, builder.as_slice())?;
        Ok(())
    }

    fn write_data(&mut self, data: &Bits, pause_after: bool) -> Result<(), CableError> {
        if data.is_empty() {
            return Ok(());
        }
        let layout = Layout::new(data.len(), pause_after);
        let builder = build(data, layout, false);
        MpsseCmdExecutor::send(&mut self.ft, builder.as_slice())?;
        Ok(())
    }

    fn read_write_data(&mut self, data: &Bits, pause_after: bool) -> Result<Bits, CableError> {
        if data.is_empty() {
            return Ok(Bits::new());
        }
        let layout = Layout::new(data.len(), pause_after);
        let builder = build(data, layout, true);
        let mut response = vec![0u8; layout.response_len()];
        self.ft.xfer(builder.as_slice(), &mut response)?;
        Ok(unpack(&response, layout))
    }
}

/// Open interface `identity.interface` of the adapter described by `identity`.
pub fn open(identity: &AdapterIdentity, clock: u32) -> Result<Box<dyn Cable>, CableError> {
    match identity.kind {
        AdapterKind::Ft2232h => {
            let description = if identity.interface == 2 {
                "Dual RS232-HS B"
            } else {
                "Dual RS232-HS A"
            };
            let ft = Ftdi::with_description(description)?;
            let ft = Ft2232h::try_from(ft)?;
            Ok(Box::new(Mpsse::new(ft, clock)?))
        }
        AdapterKind::Ft232h => {
            let ft = Ftdi::with_description("Single RS232-HS")?;
            let ft = Ft232h::try_from(ft)?;
            Ok(Box::new(Mpsse::new(ft, clock)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_reserves_last_bit_for_tms() {
        assert_eq!(
            Layout::new(41, true),
            Layout {
                bytes: 5,
                bits: 0,
                tms_exit: true
            }
        );
        assert_eq!(Layout::new(41, true).response_len(), 6);

        assert_eq!(
            Layout::new(6, true),
            Layout {
                bytes: 0,
                bits: 5,
                tms_exit: true
            }
        );
        assert_eq!(
            Layout::new(16, false),
            Layout {
                bytes: 2,
                bits: 0,
                tms_exit: false
            }
        );
        assert_eq!(Layout::new(1, true).response_len(), 1);
    }

    #[test]
    fn unpack_realigns_partial_bytes_and_tms_bit() {
        // 12 bits with pause: one whole byte, 3 bits, 1 TMS bit
        let layout = Layout::new(12, true);
        // Partial byte: 3 bits 0b101 sit in the top of the byte
        // TMS byte: captured bit in bit 6
        let response = [0xA5, 0b1010_0000, 0b0100_0000];
        let bits = unpack(&response, layout);
        assert_eq!(bits.len(), 12);
        assert_eq!(bits.to_value(BitOrder::LsbFirst).unwrap(), 0xA5 | (0b101 << 8) | (1 << 11));
    }

    #[test]
    fn unpack_ignores_second_tms_capture() {
        let layout = Layout::new(1, true);
        assert_eq!(unpack(&[0b1000_0000], layout).get(0), Some(false));
        assert_eq!(unpack(&[0b0100_0000], layout).get(0), Some(true));
    }

    #[test]
    fn clock_is_clamped_to_engine_range() {
        assert_eq!(clamp_clock(0), MIN_CLOCK_HZ);
        assert_eq!(clamp_clock(10_000_000), 10_000_000);
        assert_eq!(clamp_clock(60_000_000), MAX_CLOCK_HZ);
    }

    #[test]
    fn tms_sequences_split_into_seven_bit_commands() {
        let short = tms_commands(&[1, 1, 0], true);
        let long = tms_commands(&[1; 9], true);
        // Each clock_tms_out command is three bytes
        assert_eq!(short.as_slice().len(), 3);
        assert_eq!(long.as_slice().len(), 6);
        assert!(tms_commands(&[], false).as_slice().is_empty());
    }
}
