//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements       | Connects to                      |
//! |------------|------------------|----------------------------------|
//! | `console`  | Keypad, Display  | stdin / log output (simulator)   |
//! | `eeprom`   | CredentialStore  | I2C EEPROM, image file, RAM      |
//! | `hardware` | Actuator         | H-bridge and buzzer GPIO, or log |
//! | `log_sink` | EventSink        | Log output                       |
//! | `timer`    | ActuationTimer   | Tick thread, or synchronous test |
//!
//! The byte link adapters live in [`crate::link`].

pub mod console;
pub mod eeprom;
pub mod hardware;
pub mod log_sink;
pub mod timer;
