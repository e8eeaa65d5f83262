//! Actuator adapters: bolt motor H-bridge and alarm buzzer.
//!
//! [`GpioActuator`] drives three `embedded-hal` output pins.  It is the
//! only code in the crate that touches the motor lines.  [`LogActuator`]
//! stands in for it in the simulator.

use core::fmt::Debug;

use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::app::ports::Actuator;

/// H-bridge inputs plus the buzzer line.
///
/// Forward and reverse are never high together: each drive call lowers
/// the opposite input before raising its own.
pub struct GpioActuator<F, R, B> {
    forward: F,
    reverse: R,
    buzzer: B,
}

impl<F, R, B> GpioActuator<F, R, B>
where
    F: OutputPin,
    R: OutputPin,
    B: OutputPin,
{
    pub fn new(forward: F, reverse: R, buzzer: B) -> Self {
        Self {
            forward,
            reverse,
            buzzer,
        }
    }

    pub fn release(self) -> (F, R, B) {
        (self.forward, self.reverse, self.buzzer)
    }
}

/// Pin failures cannot be reported through the port; log and carry on.
fn check<E: Debug>(what: &str, result: Result<(), E>) {
    if let Err(e) = result {
        error!("actuator: {what} failed: {e:?}");
    }
}

impl<F, R, B> Actuator for GpioActuator<F, R, B>
where
    F: OutputPin,
    R: OutputPin,
    B: OutputPin,
{
    fn drive_forward(&mut self) {
        check("reverse low", self.reverse.set_low());
        check("forward high", self.forward.set_high());
    }

    fn drive_reverse(&mut self) {
        check("forward low", self.forward.set_low());
        check("reverse high", self.reverse.set_high());
    }

    fn stop(&mut self) {
        check("forward low", self.forward.set_low());
        check("reverse low", self.reverse.set_low());
    }

    fn alarm_on(&mut self) {
        check("buzzer high", self.buzzer.set_high());
    }

    fn alarm_off(&mut self) {
        check("buzzer low", self.buzzer.set_low());
    }
}

/// Simulator actuator: logs each output change.
#[derive(Debug, Default)]
pub struct LogActuator;

impl Actuator for LogActuator {
    fn drive_forward(&mut self) {
        info!("MOTOR | forward (unlocking)");
    }

    fn drive_reverse(&mut self) {
        info!("MOTOR | reverse (locking)");
    }

    fn stop(&mut self) {
        info!("MOTOR | stop");
    }

    fn alarm_on(&mut self) {
        info!("ALARM | on");
    }

    fn alarm_off(&mut self) {
        info!("ALARM | off");
    }
}
