//! Bit-bang JTAG over four `embedded-hal` pins, for hosts that reach the FPGA's JTAG port through
//! their own GPIO instead of an FTDI bridge (e.g. an SBC running `linux-embedded-hal`).
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::bits::Bits;
use crate::cable::{Cable, CableError};

fn gpio_err<E: embedded_hal::digital::Error>(e: E) -> CableError {
    CableError::Gpio(e.kind())
}

pub struct Gpio<Clk, Tdi, Tdo, Tms, Delay>
where
    Clk: OutputPin,
    Tdi: OutputPin,
    Tdo: InputPin,
    Tms: OutputPin,
    Delay: DelayNs,
{
    half_period: u32,
    delay: Delay,
    clock: Clk,
    tdi: Tdi,
    tdo: Tdo,
    tms: Tms,
}

impl<Clk, Tdi, Tdo, Tms, Delay> Gpio<Clk, Tdi, Tdo, Tms, Delay>
where
    Clk: OutputPin,
    Tdi: OutputPin,
    Tdo: InputPin,
    Tms: OutputPin,
    Delay: DelayNs,
{
    pub fn new(freq_khz: u32, clock: Clk, tdi: Tdi, tdo: Tdo, tms: Tms, delay: Delay) -> Self {
        let period_ns = 1_000_000 / freq_khz.max(1);
        let half_period = period_ns / 2;
        Gpio {
            half_period,
            clock,
            tdi,
            tdo,
            tms,
            delay,
        }
    }

    /// One full TCK period.  TDO is sampled while TCK is still low, before the rising edge moves
    /// the chain on.
    fn cycle(&mut self, tms: bool, tdi: bool) -> Result<bool, CableError> {
        self.tms.set_state(PinState::from(tms)).map_err(gpio_err)?;
        self.tdi.set_state(PinState::from(tdi)).map_err(gpio_err)?;
        let tdo = self.tdo.is_high().map_err(gpio_err)?;

        self.clock.set_high().map_err(gpio_err)?;
        self.delay.delay_ns(self.half_period);
        self.clock.set_low().map_err(gpio_err)?;
        self.delay.delay_ns(self.half_period);
        Ok(tdo)
    }
}

impl<Clk, Tdi, Tdo, Tms, Delay> Cable for Gpio<Clk, Tdi, Tdo, Tms, Delay>
where
    Clk: OutputPin,
    Tdi: OutputPin,
    Tdo: InputPin,
    Tms: OutputPin,
    Delay: DelayNs,
{
    fn change_mode(&mut self, tms: &[usize], tdi: bool) -> Result<(), CableError> {
        for d in tms {
            self.cycle(*d != 0, tdi)?;
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
            // The last bit leaves Shift for Exit1 when we're supposed to pause after
            captured.push(self.cycle(pause_after && i == last, bit)?);
        }
        if pause_after && !data.is_empty() {
            // Exit1 -> Pause
            self.cycle(false, false)?;
        }
        Ok(captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::BitOrder;
    use crate::cable::sim::{SimChain, SIM_IDCODE};
    use crate::statemachine::{JtagSM, JtagState, Register};
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// The four JTAG wires, with TCK rising edges driving the simulated chain
    struct Bus {
        chain: SimChain,
        tck: bool,
        tdi: bool,
        tms: bool,
    }

    #[derive(Clone, Copy)]
    enum Wire {
        Tck,
        Tdi,
        Tms,
    }

    struct Pin(Rc<RefCell<Bus>>, Wire);
    struct TdoPin(Rc<RefCell<Bus>>);
    struct NoDelay;

    impl ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.set_state(PinState::Low)
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.set_state(PinState::High)
        }

        fn set_state(&mut self, state: PinState) -> Result<(), Infallible> {
            let level = state == PinState::High;
            let mut bus = self.0.borrow_mut();
            match self.1 {
                Wire::Tck => {
                    if level && !bus.tck {
                        let (tms, tdi) = (bus.tms, bus.tdi);
                        bus.chain.clock(tms, tdi);
                    }
                    bus.tck = level;
                }
                Wire::Tdi => bus.tdi = level,
                Wire::Tms => bus.tms = level,
            }
            Ok(())
        }
    }

    impl ErrorType for TdoPin {
        type Error = Infallible;
    }

    impl InputPin for TdoPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0.borrow().chain.tdo())
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|b| !b)
        }
    }

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn wired(chain: SimChain) -> (Rc<RefCell<Bus>>, impl Cable) {
        let bus = Rc::new(RefCell::new(Bus {
            chain,
            tck: false,
            tdi: false,
            tms: false,
        }));
        let gpio = Gpio::new(
            1000,
            Pin(bus.clone(), Wire::Tck),
            Pin(bus.clone(), Wire::Tdi),
            TdoPin(bus.clone()),
            Pin(bus.clone(), Wire::Tms),
            NoDelay,
        );
        (bus, gpio)
    }

    #[test]
    fn reads_idcode_through_pins() {
        let (bus, gpio) = wired(SimChain::gatemate(1));
        let mut sm = JtagSM::new(Box::new(gpio)).unwrap();
        let id = sm.read_reg(Register::Data, 32).unwrap();
        assert_eq!(id.to_value(BitOrder::LsbFirst).unwrap() as u32, SIM_IDCODE);
        assert_eq!(bus.borrow().chain.state(), JtagState::PauseDR);

        sm.go_idle().unwrap();
        assert_eq!(bus.borrow().chain.state(), JtagState::Idle);
    }

    #[test]
    fn instruction_lands_lsb_first() {
        let (bus, gpio) = wired(SimChain::gatemate(1));
        let mut sm = JtagSM::new(Box::new(gpio)).unwrap();
        let opcode = Bits::from_value(0x26, 6, BitOrder::LsbFirst).unwrap();
        sm.write_reg(Register::Instruction, &opcode, true).unwrap();
        sm.go_idle().unwrap();
        assert_eq!(bus.borrow().chain.tap(0).instruction, 0x26);
    }
}
