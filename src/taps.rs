//! A convenience wrapper for JTAG scan chains with multiple TAPs present.  `Taps` allows the
//! client to interact with one selected TAP as if it were the only TAP in the chain, so that the
//! client doesn't have to deal with putting the other TAPs into bypass and shifting data through
//! the bypass registers.
//!
//! Every TAP in the chain is assumed to have a 6-bit instruction register with BYPASS at all ones,
//! as the GateMate TAP does.
use std::ops::DerefMut;

use crate::bits::{BitOrder, Bits};
use crate::cable::Cable;
use crate::error::Error;
use crate::statemachine::{JtagSM, Register};

/// Instruction register length of every TAP in the chain
pub const IR_LEN: usize = 6;

/// Bits read by chain discovery: room for four 32-bit IDCODEs
pub const DISCOVERY_BITS: usize = 128;

/// Where the selected TAP sits.  `chain_index` counts the TAPs between TDI and the target,
/// `taps_before` the TAPs between the target and TDO.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainPosition {
    pub chain_index: usize,
    pub taps_before: usize,
}

impl ChainPosition {
    pub fn new(chain_index: usize, chain_length: usize) -> Result<Self, Error> {
        Ok(Self {
            chain_index,
            taps_before: compute_taps_before(chain_index, chain_length)?,
        })
    }

    pub fn chain_length(&self) -> usize {
        self.chain_index + self.taps_before + 1
    }
}

pub fn compute_taps_before(chain_index: usize, chain_length: usize) -> Result<usize, Error> {
    if chain_index >= chain_length {
        return Err(Error::ChainIndexOutOfRange {
            index: chain_index,
            length: chain_length,
        });
    }
    Ok(chain_length - chain_index - 1)
}

/// Count the TAPs in a discovery read: one per non-zero 32-bit chunk.
pub fn count_idcodes(bits: &Bits) -> usize {
    idcodes(bits).filter(|id| *id != 0).count()
}

fn idcodes(bits: &Bits) -> impl Iterator<Item = u32> + '_ {
    bits.as_bitslice().chunks_exact(32).map(|chunk| {
        Bits::from(chunk)
            .to_value(BitOrder::LsbFirst)
            .map(|v| v as u32)
            .unwrap_or(0)
    })
}

pub struct Taps<T> {
    pub sm: JtagSM<T>,
}

impl<T, U> Taps<T>
where
    T: DerefMut<Target = U>,
    U: Cable + ?Sized,
{
    /// Create an object using an existing `JtagSM` object
    pub fn new(sm: JtagSM<T>) -> Self {
        Self { sm }
    }

    /// Reset the chain and count the TAPs on it by their IDCODEs.  The chain is left in Run-Test/Idle.
    pub fn detect(&mut self) -> Result<usize, Error> {
        self.sm.mode_reset()?;
        let bits = self.sm.read_reg(Register::Data, DISCOVERY_BITS)?;
        self.sm.go_idle()?;

        for (i, id) in idcodes(&bits).enumerate().filter(|(_, id)| *id != 0) {
            tracing::info!("TAP {i} from TDO: IDCODE {id:#010x}");
        }

        let count = count_idcodes(&bits);
        if count == 0 {
            return Err(Error::ChainEmpty);
        }
        Ok(count)
    }

    /// Shift `ir` into the instruction register of the TAP at `pos`, and BYPASS into all others.
    /// The chain is left in PauseIR.
    pub fn write_ir(&mut self, pos: &ChainPosition, ir: &Bits) -> Result<(), Error> {
        if ir.len() != IR_LEN {
            return Err(Error::BitLength {
                expected: IR_LEN,
                actual: ir.len(),
            });
        }
        let seq = Bits::ones(IR_LEN * pos.taps_before) + ir + Bits::ones(IR_LEN * pos.chain_index);
        tracing::debug!("IR <- {seq:?}");
        self.sm.write_reg(Register::Instruction, &seq, true)?;
        Ok(())
    }

    /// Shift `dr` into the data register of the TAP at `pos`.  Every other TAP is in bypass and gets
    /// one zero.  The chain is left in PauseDR.
    pub fn write_dr(&mut self, pos: &ChainPosition, dr: &Bits) -> Result<(), Error> {
        let seq = Bits::zeros(pos.taps_before) + dr + Bits::zeros(pos.chain_index);
        tracing::debug!("DR <- {seq:?}");
        self.sm.write_reg(Register::Data, &seq, true)?;
        Ok(())
    }

    /// Read `bits` from the data register of the TAP at `pos`, dropping the bypass bits on either
    /// side.  The chain is left in PauseDR.
    pub fn read_dr(&mut self, pos: &ChainPosition, bits: usize) -> Result<Bits, Error> {
        let seq = self
            .sm
            .read_reg(Register::Data, pos.taps_before + bits + pos.chain_index)?;
        tracing::debug!("DR -> {seq:?}");
        seq.slice(pos.taps_before..pos.taps_before + bits)
    }

    pub fn go_idle(&mut self) -> Result<(), Error> {
        self.sm.go_idle()?;
        Ok(())
    }
}
