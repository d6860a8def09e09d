//! Settings kept in non-volatile memory across power cycles
//!
//! Each setting is a single byte at a fixed address. There is no checksum and no transaction
//! across fields: losing power between writing the hour and the minute leaves a schedule made of
//! the new hour and the old minute.

use ufmt::derive::uDebug;

use crate::{
	clock::Schedule,
	config::Layout,
	watering::Duration,
};

/// Byte addressed non-volatile memory
pub trait Store {
	type Error;

	fn read(&mut self, address: u16) -> Result<u8, Self::Error>;
	fn write(&mut self, address: u16, value: u8) -> Result<(), Self::Error>;
}

/// The persisted settings
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Field {
	/// Scheduled hour
	Hours,
	/// Scheduled minute
	Minutes,
	/// Watering duration in seconds
	Duration,
}

/// Schedule and duration as last committed by the user
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Settings {
	pub schedule: Schedule,
	pub duration: Duration,
}

/// Reads and writes [`Settings`] at the addresses of a [`Layout`]
pub struct Persistence<S> {
	store: S,
	layout: Layout,
}

impl<S: Store> Persistence<S> {
	pub fn new(store: S, layout: Layout) -> Self {
		Self { store, layout }
	}

	fn address(&self, field: Field) -> u16 {
		match field {
			Field::Hours => self.layout.hours,
			Field::Minutes => self.layout.minutes,
			Field::Duration => self.layout.duration,
		}
	}

	pub fn read(&mut self, field: Field) -> Result<u8, S::Error> {
		let address = self.address(field);
		self.store.read(address)
	}

	/// Write a field, skipping the write if the byte already holds the value
	///
	/// EEPROM cells only survive a limited number of writes.
	pub fn write(&mut self, field: Field, value: u8) -> Result<(), S::Error> {
		let address = self.address(field);
		match self.store.read(address) {
			Ok(current) if current == value => Ok(()),
			_ => self.store.write(address, value),
		}
	}

	/// Load the settings, replacing anything unreadable or out of range with the defaults
	///
	/// Memory which was never written reads as `0xff`, which is never a valid value.
	pub fn load(&mut self, defaults: Settings) -> Settings {
		let hour = self.read(Field::Hours).ok();
		let minute = self.read(Field::Minutes).ok();
		let seconds = self.read(Field::Duration).ok();

		let schedule = match (hour, minute) {
			(Some(hour), Some(minute)) => Schedule::new(hour, minute),
			_ => None,
		};
		let duration = seconds.and_then(Duration::from_seconds);

		Settings {
			schedule: schedule.unwrap_or(defaults.schedule),
			duration: duration.unwrap_or(defaults.duration),
		}
	}

	/// Persist the schedule, hour first
	pub fn save_schedule(&mut self, schedule: &Schedule) -> Result<(), S::Error> {
		self.write(Field::Hours, schedule.hour)?;
		self.write(Field::Minutes, schedule.minute)
	}

	/// Persist the duration as whole seconds
	pub fn save_duration(&mut self, duration: Duration) -> Result<(), S::Error> {
		self.write(Field::Duration, duration.seconds())
	}
}
