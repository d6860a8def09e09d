#![cfg_attr(not(test), no_std)]

//! # plant-waterer
//! ## Waters a plant once a day
//!
//! A pump is switched on at a scheduled time of day (or with a press of the button) and runs for
//! a set number of seconds, as long as there is water in the tank. The duration, the schedule and
//! the clock itself are set with one button and two potentiometers, and shown on a 4-digit
//! display.
//!
//! Everything in this library is independent of the board: peripherals are reached through
//! [`embedded_hal`] traits or the small traits defined here, so the controller can be driven on
//! the host with fakes.

#[macro_use]
mod serial;

pub mod button;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod display;
pub mod mode;
pub mod store;
pub mod system;
pub mod timer;
pub mod tm1637;
pub mod watering;

pub use serial::NoSerial;
