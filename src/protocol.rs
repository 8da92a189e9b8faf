//! The GateMate TAP's private instructions, and the shifts that make up each register-file
//! operation.  Every operation here loads its instruction, shifts its data and returns the chain to
//! Run-Test/Idle before handing back control.
use std::ops::DerefMut;

use crate::bits::{BitOrder, Bits};
use crate::cable::Cable;
use crate::error::Error;
use crate::regfile::{AccessMode, Field};
use crate::statemachine::JtagSM;
use crate::taps::{ChainPosition, Taps, IR_LEN};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    Idcode,
    Bypass,
    Configure,
    WriteSerdesRegfile,
    ReadSerdesRegfile,
}

impl Instruction {
    pub const fn opcode(self) -> u8 {
        match self {
            Instruction::Idcode => 0x00,
            Instruction::Bypass => 0x3F,
            Instruction::Configure => 0x06,
            Instruction::WriteSerdesRegfile => 0x25,
            Instruction::ReadSerdesRegfile => 0x26,
        }
    }

    /// The opcode as shifted into the instruction register, LSB first
    pub fn bits(self) -> Bits {
        lsb_first(u64::from(self.opcode()), IR_LEN)
    }
}

fn lsb_first(value: u64, len: usize) -> Bits {
    (0..len).map(|i| (value >> i) & 1 == 1).collect()
}

/// The data shifted with WRITE_SERDES_REGFILE.  With `write_enable` clear it only selects
/// `address` for the next READ_SERDES_REGFILE.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegfileCommand {
    pub address: u8,
    pub data: u16,
    /// Set bits of `data` are written, the rest of the register is left alone
    pub mask: u16,
    pub write_enable: bool,
}

impl RegfileCommand {
    pub const BITS: usize = 41;

    pub fn select(address: u8) -> Self {
        Self {
            address,
            data: 0,
            mask: 0,
            write_enable: false,
        }
    }

    /// address in bits 0..8, data in 8..24, mask in 24..40, write enable in bit 40
    pub fn encode(&self) -> Bits {
        lsb_first(u64::from(self.address), 8)
            + lsb_first(u64::from(self.data), 16)
            + lsb_first(u64::from(self.mask), 16)
            + lsb_first(u64::from(self.write_enable), 1)
    }

    pub fn decode(bits: &Bits) -> Result<Self, Error> {
        if bits.len() != Self::BITS {
            return Err(Error::BitLength {
                expected: Self::BITS,
                actual: bits.len(),
            });
        }
        let value = bits.to_value(BitOrder::LsbFirst)?;
        Ok(Self {
            address: value as u8,
            data: (value >> 8) as u16,
            mask: (value >> 24) as u16,
            write_enable: (value >> 40) & 1 == 1,
        })
    }
}

/// Lay out a bitstream for CONFIGURE: each byte LSB first, bytes in file order, and the final byte
/// left off.
pub fn configuration_bits(bytes: &[u8]) -> Result<Bits, Error> {
    if bytes.len() < 2 {
        return Err(Error::EmptyConfiguration(bytes.len()));
    }
    Ok(Bits::from_bytes(
        &bytes[..bytes.len() - 1],
        BitOrder::LsbFirst,
        crate::bits::ByteOrder::MsbyFirst,
    ))
}

/// An exclusive handle on one GateMate TAP in a scan chain.  The position is worked out once,
/// when the chain is discovered, and never changes afterwards.
pub struct SerdesJtag<T> {
    taps: Taps<T>,
    position: ChainPosition,
    chain_length: usize,
}

impl<T, U> SerdesJtag<T>
where
    T: DerefMut<Target = U>,
    U: Cable + ?Sized,
{
    /// Reset the chain, count its TAPs and address the one at `chain_index`.
    pub fn attach(sm: JtagSM<T>, chain_index: usize) -> Result<Self, Error> {
        let mut taps = Taps::new(sm);
        let chain_length = taps.detect()?;
        let position = ChainPosition::new(chain_index, chain_length)?;
        tracing::debug!("using TAP {chain_index}, {} TAP(s) towards TDO", position.taps_before);

        Ok(Self {
            taps,
            position,
            chain_length,
        })
    }

    pub fn position(&self) -> ChainPosition {
        self.position
    }

    pub fn chain_length(&self) -> usize {
        self.chain_length
    }

    pub fn taps(&self) -> &Taps<T> {
        &self.taps
    }

    fn instruction(&mut self, instruction: Instruction) -> Result<(), Error> {
        tracing::debug!("loading {instruction:?}");
        self.taps.write_ir(&self.position, &instruction.bits())
    }

    pub fn read_idcode(&mut self) -> Result<u32, Error> {
        self.instruction(Instruction::Idcode)?;
        let bits = self.taps.read_dr(&self.position, 32)?;
        self.taps.go_idle()?;
        Ok(bits.to_value(BitOrder::LsbFirst)? as u32)
    }

    /// Load a bitstream through CONFIGURE.  Buffers of fewer than two bytes are refused before
    /// anything is shifted.
    pub fn load_configuration(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let bits = configuration_bits(bytes)?;
        tracing::info!("configuring with {} bits", bits.len());
        self.instruction(Instruction::Configure)?;
        self.taps.write_dr(&self.position, &bits)?;
        self.taps.go_idle()
    }

    pub fn write_register(&mut self, address: u8, data: u16, mask: u16, write_enable: bool) -> Result<(), Error> {
        self.command(&RegfileCommand {
            address,
            data,
            mask,
            write_enable,
        })
    }

    pub fn command(&mut self, command: &RegfileCommand) -> Result<(), Error> {
        tracing::debug!("{command:x?}");
        self.instruction(Instruction::WriteSerdesRegfile)?;
        self.taps.write_dr(&self.position, &command.encode())?;
        self.taps.go_idle()
    }

    /// The word at the address selected by the last register command.
    pub fn read_register(&mut self) -> Result<u16, Error> {
        self.instruction(Instruction::ReadSerdesRegfile)?;
        let bits = self.taps.read_dr(&self.position, 16)?;
        self.taps.go_idle()?;
        Ok(bits.to_value(BitOrder::LsbFirst)? as u16)
    }

    /// Select `address`, then read it.  Read-self-clearing bits at `address` are cleared by this.
    pub fn read_address(&mut self, address: u8) -> Result<u16, Error> {
        self.command(&RegfileCommand::select(address))?;
        let word = self.read_register()?;
        tracing::trace!("{address:02X}: {word:#06x}");
        Ok(word)
    }

    /// Write `value` into `field`, leaving the rest of its register alone.
    pub fn write_field(&mut self, field: &Field, value: u16) -> Result<(), Error> {
        if field.mode == AccessMode::ReadOnly {
            return Err(Error::ReadOnlyField(field.name));
        }
        if value > field.max_value() {
            return Err(Error::ValueOutOfRange {
                name: field.name,
                value,
                width: field.width(),
            });
        }
        self.write_register(field.address, value << field.low_bit, field.mask(), true)
    }
}
