//! Potentiometer readings and the hysteresis filter used while calibrating settings

use ufmt::derive::uDebug;

/// Number of distinct values the 10-bit ADC can report
pub const ANALOG_STEPS: u32 = 1024;

/// Highest raw value the ADC can report
pub const ANALOG_MAX: u16 = 1023;

/// Scale a raw analog reading into `0..max`
///
/// `convert(1023, max)` is `max - 1` for any `max` up to [`ANALOG_STEPS`], so the top of the scale
/// is never reached. Readings above [`ANALOG_MAX`] are treated as [`ANALOG_MAX`].
pub fn convert(value: u16, max: u16) -> u16 {
	let value = u32::from(value.min(ANALOG_MAX));
	(value * u32::from(max) / ANALOG_STEPS) as u16
}

/// Calibrated range a potentiometer is mapped onto
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Range {
	/// Hour of the day, 0-23
	Hours,
	/// Minute of the hour, 0-59
	Minutes,
	/// Minute of the day, 0-1439
	///
	/// The last reachable value is 1438 (23:58) because of the 10-bit input.
	MinutesOfDay,
	/// Watering duration, 0-60 seconds
	DurationSeconds,
}

impl Range {
	/// Exclusive upper bound of the calibrated value
	pub fn max(&self) -> u16 {
		match self {
			Self::Hours => 24,
			Self::Minutes => 60,
			Self::MinutesOfDay => 1440,
			Self::DurationSeconds => 61,
		}
	}

	/// Scale a raw reading into this range
	pub fn calibrate(&self, raw: u16) -> u16 {
		convert(raw, self.max())
	}
}

/// The two potentiometers on the front panel
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Knob {
	/// Duration when setting the duration, hours when setting a time
	Left,
	/// Minutes when setting a time, minute of the day in the combined flow
	Right,
}

/// Source of raw potentiometer readings
///
/// Readings are best effort: a driver which fails to sample should return the last value it saw
/// rather than an error.
pub trait Knobs {
	fn read(&mut self, knob: Knob) -> u16;
}

/// Hysteresis filter for a single analog channel
///
/// A sample is only accepted when it differs from the last accepted sample by more than the
/// threshold, which keeps potentiometer noise from flickering the display or changing the value
/// which would be committed.
pub struct Sampler {
	range: Range,
	threshold: u16,
	accepted: u16,
}

impl Sampler {
	/// Create a new [`Sampler`] seeded with the reading taken when calibration started
	///
	/// The seed counts as accepted, so it is the staged value until the knob moves.
	pub fn new(range: Range, threshold: u16, seed: u16) -> Self {
		Self {
			range,
			threshold,
			accepted: seed.min(ANALOG_MAX),
		}
	}

	/// Offer a new raw sample, returning the calibrated value if it was accepted
	pub fn offer(&mut self, raw: u16) -> Option<u16> {
		let raw = raw.min(ANALOG_MAX);
		let change = if raw > self.accepted {
			raw - self.accepted
		} else {
			self.accepted - raw
		};
		if change > self.threshold {
			self.accepted = raw;
			Some(self.value())
		} else {
			None
		}
	}

	/// Last accepted raw sample
	pub fn raw(&self) -> u16 {
		self.accepted
	}

	/// Calibrated value of the last accepted sample
	pub fn value(&self) -> u16 {
		self.range.calibrate(self.accepted)
	}
}
