//! Pump, water sensor, and the watering countdown

use embedded_hal::digital::v2::{InputPin, OutputPin};
use ufmt::derive::uDebug;

use crate::{
	calibration::Range,
	config::SensorPolarity,
	timer::{Deadline, Millis},
};

/// Longest watering duration in seconds
pub const MAX_SECONDS: u8 = 60;

/// Length of one countdown step
const SECOND_MS: Millis = 1_000;

/// How long the pump runs when watering
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Duration {
	seconds: u8,
}

impl Duration {
	/// Create a new [`Duration`], or `None` if it is longer than [`MAX_SECONDS`]
	pub fn from_seconds(seconds: u8) -> Option<Self> {
		if seconds <= MAX_SECONDS {
			Some(Self { seconds })
		} else {
			None
		}
	}

	/// Create a new [`Duration`], capped at [`MAX_SECONDS`]
	pub fn saturating(seconds: u8) -> Self {
		Self {
			seconds: seconds.min(MAX_SECONDS),
		}
	}

	/// Calibrate a raw potentiometer reading into a duration
	pub fn from_raw(raw: u16) -> Self {
		Self {
			seconds: Range::DurationSeconds.calibrate(raw) as u8,
		}
	}

	pub fn seconds(&self) -> u8 {
		self.seconds
	}
}

/// Relay driving the pump
///
/// The relay module is active-low: the pump runs while the pin is low.
pub struct Pump<P> {
	pin: P,
	running: bool,
}

impl<P: OutputPin> Pump<P> {
	/// Create a new [`Pump`], making sure it is off
	pub fn new(pin: P) -> Self {
		let mut pump = Self { pin, running: true };
		pump.stop();
		pump
	}

	pub fn start(&mut self) {
		let _ = self.pin.set_low();
		self.running = true;
	}

	pub fn stop(&mut self) {
		let _ = self.pin.set_high();
		self.running = false;
	}

	pub fn is_running(&self) -> bool {
		self.running
	}
}

/// Water sensor in the tank
pub struct WaterSensor<P> {
	pin: P,
	polarity: SensorPolarity,
}

impl<P: InputPin> WaterSensor<P> {
	pub fn new(pin: P, polarity: SensorPolarity) -> Self {
		Self { pin, polarity }
	}

	/// Whether there is water to pump; a sensor which can't be read counts as empty
	pub fn has_water(&self) -> bool {
		match (self.pin.is_low(), self.polarity) {
			(Ok(low), SensorPolarity::LowIsEmpty) => !low,
			(Ok(low), SensorPolarity::LowIsWater) => low,
			(Err(_), _) => false,
		}
	}
}

/// There is no water, the pump was not started
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub struct NoWater;

/// Progress of a watering run
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
	/// The pump is running with this many seconds left
	Remaining(u8),
	/// Nothing changed since the last step
	Running,
	/// The pump has been stopped
	Finished,
}

/// Countdown of the seconds left in a watering run
struct Countdown {
	remaining: u8,
	next: Deadline,
}

/// Runs the pump for a duration, as long as there is water
pub struct Actuator<P, W> {
	pump: Pump<P>,
	sensor: WaterSensor<W>,
	countdown: Option<Countdown>,
}

impl<P: OutputPin, W: InputPin> Actuator<P, W> {
	pub fn new(pump: Pump<P>, sensor: WaterSensor<W>) -> Self {
		Self {
			pump,
			sensor,
			countdown: None,
		}
	}

	/// Start watering for `duration`
	///
	/// Without water the pump is never started. Otherwise the pump starts and the seconds left
	/// are returned, or `None` for a zero duration which finishes straight away.
	pub fn start(&mut self, duration: Duration, now: Millis) -> Result<Option<u8>, NoWater> {
		if !self.sensor.has_water() {
			return Err(NoWater);
		}

		self.pump.start();
		if duration.seconds() == 0 {
			self.finish();
			return Ok(None);
		}

		self.countdown = Some(Countdown {
			remaining: duration.seconds(),
			next: Deadline::after(now, SECOND_MS),
		});
		Ok(Some(duration.seconds()))
	}

	/// Advance the countdown, stopping the pump once it reaches zero
	pub fn tick(&mut self, now: Millis) -> Step {
		let countdown = match &mut self.countdown {
			Some(countdown) => countdown,
			None => return Step::Finished,
		};

		if !countdown.next.has_passed(now) {
			return Step::Running;
		}

		countdown.remaining -= 1;
		if countdown.remaining == 0 {
			return self.finish();
		}

		// Late ticks must not stretch the run.
		countdown.next = countdown.next.then(SECOND_MS);
		Step::Remaining(countdown.remaining)
	}

	fn finish(&mut self) -> Step {
		self.countdown = None;
		self.pump.stop();
		Step::Finished
	}

	/// Make sure the pump is off while not watering
	pub fn release(&mut self) {
		if self.countdown.is_none() && self.pump.is_running() {
			self.pump.stop();
		}
	}
}
