//! Sampling, spectrum and USB serial transport for the blue pill spectrum streamer.
//!
//! Everything in this crate is hardware-independent: peripherals are reached through
//! the handles in [`acquisition`] and the `usb-device` bus traits, so the same code runs
//! on the target (under the `firmware` crate) and on the host (under `cargo test`).

#![cfg_attr(not(test), no_std)]
#![allow(clippy::let_and_return, clippy::needless_range_loop)]
#![warn(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::ptr_as_ptr
)]

// must come first, so the logging macros are visible to every module below
#[macro_use]
mod fmt;

pub mod acquisition;
pub mod conditioner;
pub mod config;
pub mod indicator;
pub mod math;
pub mod scheduler;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod spectrum;
pub mod transport;
