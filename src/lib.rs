//! padnav: controller navigation input for launcher-style UIs.
//!
//! Polls an XInput slot backend first and a HID joystick backend second,
//! and reduces whatever is connected to an edge-triggered [`InputFrame`]
//! (`left`, `right`, `up`, `down`, `a`, `b`, `start`, `back`) once per tick.
//! Device loss, reconnects and backend fallback are handled internally;
//! callers only ever see "connected" or "not connected".
//!
//! ```no_run
//! use padnav::{Gamepad, InputConfig, PollDriver};
//! use std::sync::atomic::AtomicBool;
//!
//! let config = InputConfig::default();
//! let mut driver = PollDriver::from_config(Gamepad::native(&config), &config);
//! let stop = AtomicBool::new(false);
//! driver.run(&stop, |result| {
//!     if result.frame.a {
//!         println!("activate ({})", result.status());
//!     }
//! });
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod backends;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod frame;
pub mod manager;
pub mod metadata;
pub mod state;

pub use backends::{Backend, PollResult, Source};
pub use config::InputConfig;
pub use driver::{PauseHandle, PollDriver};
pub use error::{ConfigError, DeviceError};
pub use frame::InputFrame;
pub use manager::Gamepad;
pub use metadata::DeviceMeta;
