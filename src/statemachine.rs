//! This provides a higher-level interface than the `Cable` trait.  Specifically, it keeps track of
//! the state of the JTAG state machine, and allows setting the state to any desired state.
//! `JtagSM` will get to that state by the most efficient path, based on the current state.
use std::collections::VecDeque;
use std::ops::DerefMut;

use crate::bits::Bits;
use crate::cable::{Cable, CableError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    Data,
    Instruction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JtagState {
    Reset = 0,
    Idle = 1,
    SelectDR = 2,
    CaptureDR = 3,
    ShiftDR = 4,
    Exit1DR = 5,
    PauseDR = 6,
    Exit2DR = 7,
    UpdateDR = 8,
    SelectIR = 9,
    CaptureIR = 10,
    ShiftIR = 11,
    Exit1IR = 12,
    PauseIR = 13,
    Exit2IR = 14,
    UpdateIR = 15,
}

impl JtagState {
    /// The state the TAP controller moves to on a rising TCK edge with the given TMS level
    pub fn next(self, tms: bool) -> JtagState {
        use JtagState::*;

        match (self, tms) {
            (Reset, false) => Idle,
            (Reset, true) => Reset,
            (Idle, false) => Idle,
            (Idle, true) => SelectDR,

            (SelectDR, false) => CaptureDR,
            (SelectDR, true) => SelectIR,
            (CaptureDR, false) | (ShiftDR, false) | (Exit2DR, false) => ShiftDR,
            (CaptureDR, true) | (ShiftDR, true) => Exit1DR,
            (Exit1DR, false) | (PauseDR, false) => PauseDR,
            (Exit1DR, true) | (Exit2DR, true) => UpdateDR,
            (PauseDR, true) => Exit2DR,
            (UpdateDR, false) => Idle,
            (UpdateDR, true) => SelectDR,

            (SelectIR, false) => CaptureIR,
            (SelectIR, true) => Reset,
            (CaptureIR, false) | (ShiftIR, false) | (Exit2IR, false) => ShiftIR,
            (CaptureIR, true) | (ShiftIR, true) => Exit1IR,
            (Exit1IR, false) | (PauseIR, false) => PauseIR,
            (Exit1IR, true) | (Exit2IR, true) => UpdateIR,
            (PauseIR, true) => Exit2IR,
            (UpdateIR, false) => Idle,
            (UpdateIR, true) => SelectDR,
        }
    }
}

#[derive(Clone)]
struct Path {
    path: Vec<usize>,
    state: JtagState,
}

impl Path {
    fn new(state: JtagState) -> Self {
        Self {
            state,
            path: Vec::new(),
        }
    }
}

/// Shortest TMS sequence leading from `from` to `to`
fn get_path(from: JtagState, to: JtagState) -> Vec<usize> {
    let mut seen = [false; 16];
    seen[from as usize] = true;

    let mut paths = VecDeque::new();
    paths.push_back(Path::new(from));

    while let Some(p) = paths.pop_front() {
        for tms in [0, 1] {
            let mut next = p.clone();
            next.state = p.state.next(tms != 0);
            next.path.push(tms);

            if next.state == to {
                return next.path;
            }
            if !seen[next.state as usize] {
                seen[next.state as usize] = true;
                paths.push_back(next);
            }
        }
    }
    // Every state is reachable from every other one
    unreachable!("no TMS path from {from:?} to {to:?}")
}

pub struct JtagSM<T> {
    pub cable: T,
    state: JtagState,
}

impl<T, U> JtagSM<T>
where
    T: DerefMut<Target = U>,
    U: Cable + ?Sized,
{
    /// Create a JTAG state machine using an existing `Cable`.  The chain is reset on the way in.
    pub fn new(mut cable: T) -> Result<Self, CableError> {
        cable.change_mode(&[1, 1, 1, 1, 1], true)?;

        Ok(Self {
            cable,
            state: JtagState::Reset,
        })
    }

    /// Reset the scan chain by driving TMS high for 5 clocks
    pub fn mode_reset(&mut self) -> Result<(), CableError> {
        self.cable.change_mode(&[1, 1, 1, 1, 1], true)?;
        self.state = JtagState::Reset;
        Ok(())
    }

    pub fn state(&self) -> JtagState {
        self.state
    }

    /// Use TMS to get into `state` by the most efficient path
    pub fn change_mode(&mut self, state: JtagState) -> Result<(), CableError> {
        if self.state == state {
            return Ok(());
        }

        let path = get_path(self.state, state);
        tracing::trace!("path from {:?} to {:?}: {:?}", self.state, state, path);
        self.cable.change_mode(&path, true)?;
        self.state = state;
        Ok(())
    }

    /// Return to Run-Test/Idle, passing through Update if a shift was left paused
    pub fn go_idle(&mut self) -> Result<(), CableError> {
        self.change_mode(JtagState::Idle)
    }

    fn enter_shift(&mut self, reg: Register) -> Result<(), CableError> {
        match reg {
            Register::Data => self.change_mode(JtagState::ShiftDR),
            Register::Instruction => self.change_mode(JtagState::ShiftIR),
        }
    }

    fn after_shift(&mut self, reg: Register, pause_after: bool) {
        if pause_after {
            self.state = match reg {
                Register::Data => JtagState::PauseDR,
                Register::Instruction => JtagState::PauseIR,
            };
        }
    }

    /// Read `bits` from either the instruction or data register, shifting zeros in.  The chain is
    /// left in PauseIR / PauseDR.
    pub fn read_reg(&mut self, reg: Register, bits: usize) -> Result<Bits, CableError> {
        if bits == 0 {
            return Ok(Bits::new());
        }
        self.enter_shift(reg)?;
        let data = self.cable.read_data(bits, true)?;
        self.after_shift(reg, true);
        Ok(data)
    }

    /// Write `data` into either the instruction or data register.  The mode will either be
    /// ShiftIR / ShiftDR if `pause_after` is false, or PauseIR / PauseDR if `pause_after` is true.
    /// This allows for setting the register with multiple calls to `write_reg`.
    pub fn write_reg(&mut self, reg: Register, data: &Bits, pause_after: bool) -> Result<(), CableError> {
        if data.is_empty() {
            return Ok(());
        }
        self.enter_shift(reg)?;
        self.cable.write_data(data, pause_after)?;
        self.after_shift(reg, pause_after);
        Ok(())
    }
}
