//! A scan chain simulated bit for bit, for exercising everything above the `Cable` trait without
//! hardware.  Every TAP runs the real controller state machine off the shared TCK/TMS, has a 6-bit
//! instruction register, and a data register chosen by the loaded instruction.
use crate::bits::Bits;
use crate::cable::{Cable, CableError};
use crate::regfile::{AccessMode, CATALOG};
use crate::statemachine::JtagState;

pub const SIM_IDCODE: u32 = 0x2000_0a95;

const IR_IDCODE: u8 = 0x00;
const IR_CONFIGURE: u8 = 0x06;
const IR_WRITE_REGFILE: u8 = 0x25;
const IR_READ_REGFILE: u8 = 0x26;

pub struct SimTap {
    pub idcode: u32,
    /// Whether this TAP has the SerDes register file behind it
    pub serdes: bool,
    pub instruction: u8,
    ir: Vec<bool>,
    dr: Vec<bool>,
    pub selected: u8,
    pub registers: [u16; 256],
    /// Bits shifted in under CONFIGURE since the last Capture-DR
    pub configuration: Bits,
    /// (address, bits) of every write that pulsed write-self-clearing bits
    pub pulses: Vec<(u8, u16)>,
    /// Number of READ_SERDES_REGFILE captures
    pub reads: usize,
}

impl SimTap {
    pub fn gatemate() -> Self {
        let mut registers = [0u16; 256];
        for field in CATALOG {
            registers[field.address as usize] |= field.reset_value << field.low_bit;
        }
        Self {
            serdes: true,
            registers,
            ..Self::other(SIM_IDCODE)
        }
    }

    /// A TAP with nothing but IDCODE and BYPASS
    pub fn other(idcode: u32) -> Self {
        Self {
            idcode,
            serdes: false,
            instruction: IR_IDCODE,
            ir: vec![false; 6],
            dr: Vec::new(),
            selected: 0,
            registers: [0; 256],
            configuration: Bits::new(),
            pulses: Vec::new(),
            reads: 0,
        }
    }

    fn mode_mask(address: u8, mode: AccessMode) -> u16 {
        CATALOG
            .iter()
            .filter(|f| f.address == address && f.mode == mode)
            .fold(0, |acc, f| acc | f.mask())
    }

    fn capture_dr(&mut self) {
        self.dr = match (self.serdes, self.instruction) {
            (_, IR_IDCODE) => (0..32).map(|i| (self.idcode >> i) & 1 == 1).collect(),
            (true, IR_WRITE_REGFILE) => vec![false; 41],
            (true, IR_READ_REGFILE) => {
                let address = self.selected;
                let word = self.registers[address as usize];
                self.registers[address as usize] &= !Self::mode_mask(address, AccessMode::ReadSelfClearing);
                self.reads += 1;
                (0..16).map(|i| (word >> i) & 1 == 1).collect()
            }
            (true, IR_CONFIGURE) => {
                self.configuration = Bits::new();
                Vec::new()
            }
            _ => vec![false],
        };
    }

    fn update_dr(&mut self) {
        if !self.serdes || self.instruction != IR_WRITE_REGFILE || self.dr.len() != 41 {
            return;
        }
        let field = |lo: usize, n: usize| {
            self.dr[lo..lo + n]
                .iter()
                .enumerate()
                .fold(0u16, |acc, (i, b)| acc | (u16::from(*b) << i))
        };
        let address = field(0, 8) as u8;
        let data = field(8, 16);
        let mask = field(24, 16);
        let write_enable = self.dr[40];

        self.selected = address;
        if write_enable {
            let reg = &mut self.registers[address as usize];
            *reg = (*reg & !mask) | (data & mask);

            let self_clearing = Self::mode_mask(address, AccessMode::WriteSelfClearing);
            if data & mask & self_clearing != 0 {
                self.pulses.push((address, data & mask & self_clearing));
            }
            *reg &= !self_clearing;
        }
    }

    fn configuring(&self) -> bool {
        self.serdes && self.instruction == IR_CONFIGURE
    }

    fn dr_out(&self) -> bool {
        if self.configuring() {
            return false;
        }
        self.dr.first().copied().unwrap_or(false)
    }

    fn shift_dr(&mut self, tdi: bool) {
        if self.configuring() {
            self.configuration.push(tdi);
        } else if !self.dr.is_empty() {
            self.dr.remove(0);
            self.dr.push(tdi);
        }
    }

    fn shift_ir(&mut self, tdi: bool) {
        self.ir.remove(0);
        self.ir.push(tdi);
    }
}

/// TAPs are kept in scan order: `taps[0]` drives TDO, TDI feeds the last one.
pub struct SimChain {
    taps: Vec<SimTap>,
    state: JtagState,
}

impl SimChain {
    pub fn new(taps: Vec<SimTap>) -> Self {
        Self {
            taps,
            state: JtagState::Reset,
        }
    }

    /// `devices` GateMate TAPs
    pub fn gatemate(devices: usize) -> Self {
        Self::new((0..devices).map(|_| SimTap::gatemate()).collect())
    }

    pub fn state(&self) -> JtagState {
        self.state
    }

    /// TAP at `chain_index`, counted from the TDI end
    pub fn tap(&self, chain_index: usize) -> &SimTap {
        &self.taps[self.taps.len() - 1 - chain_index]
    }

    pub fn tap_mut(&mut self, chain_index: usize) -> &mut SimTap {
        let len = self.taps.len();
        &mut self.taps[len - 1 - chain_index]
    }

    pub(crate) fn tdo(&self) -> bool {
        let Some(last) = self.taps.first() else {
            return false;
        };
        match self.state {
            JtagState::ShiftDR => last.dr_out(),
            JtagState::ShiftIR => last.ir[0],
            _ => false,
        }
    }

    /// One rising TCK edge
    pub(crate) fn clock(&mut self, tms: bool, tdi: bool) {
        match self.state {
            JtagState::ShiftDR => {
                let outs: Vec<bool> = self.taps.iter().map(SimTap::dr_out).collect();
                let n = self.taps.len();
                for (k, tap) in self.taps.iter_mut().enumerate() {
                    tap.shift_dr(if k + 1 == n { tdi } else { outs[k + 1] });
                }
            }
            JtagState::ShiftIR => {
                let outs: Vec<bool> = self.taps.iter().map(|t| t.ir[0]).collect();
                let n = self.taps.len();
                for (k, tap) in self.taps.iter_mut().enumerate() {
                    tap.shift_ir(if k + 1 == n { tdi } else { outs[k + 1] });
                }
            }
            _ => {}
        }

        self.state = self.state.next(tms);

        for tap in self.taps.iter_mut() {
            match self.state {
                JtagState::Reset => tap.instruction = IR_IDCODE,
                JtagState::CaptureDR => tap.capture_dr(),
                JtagState::CaptureIR => {
                    tap.ir = (0..6).map(|i| i == 0).collect();
                }
                JtagState::UpdateIR => {
                    tap.instruction = tap
                        .ir
                        .iter()
                        .enumerate()
                        .fold(0u8, |acc, (i, b)| acc | (u8::from(*b) << i));
                }
                JtagState::UpdateDR => tap.update_dr(),
                _ => {}
            }
        }
    }
}

impl Cable for SimChain {
    fn change_mode(&mut self, tms: &[usize], tdi: bool) -> Result<(), CableError> {
        for x in tms {
            self.clock(*x != 0, tdi);
        }
        Ok(())
    }

    fn write_data(&mut self, data: &Bits, pause_after: bool) -> Result<(), CableError> {
        self.read_write_data(data, pause_after).map(|_| ())
    }

    fn read_write_data(&mut self, data: &Bits, pause_after: bool) -> Result<Bits, CableError> {
        let last = data.len().saturating_sub(1);
        let mut captured = Bits::new();
        for (i, bit) in data.iter().enumerate() {
            captured.push(self.tdo());
            self.clock(pause_after && i == last, bit);
        }
        if pause_after && !data.is_empty() {
            self.clock(false, false);
        }
        Ok(captured)
    }
}
