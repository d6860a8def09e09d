//! Single push button turned into click and hold gestures

use embedded_hal::digital::v2::InputPin;
use ufmt::derive::uDebug;

use crate::timer::{elapsed, Millis};

/// Gesture recognised from the button
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Gesture {
	/// The button was pressed and released before the hold time passed
	Click,
	/// The button has been held down for the hold time
	///
	/// Reported once per press, while the button is still down. Releasing a held button does not
	/// produce a [`Gesture::Click`].
	Held,
}

/// Variants representing the current stage of a button press
#[derive(Clone, Copy, PartialEq, Eq)]
enum ButtonStage {
	/// Button is not pressed
	Up,
	/// Button has been pressed down at the given instant
	Down(Millis),
	/// Button is being held down and [`Gesture::Held`] has been reported
	Hold,
}

/// Debounced button wired to a digital input
pub struct Button<P> {
	pin: P,
	/// Whether a low level means pressed (button to ground with a pull-up)
	active_low: bool,
	debounce_ms: Millis,
	hold_ms: Millis,
	/// Raw level from the last reading, and when it last changed
	raw_pressed: bool,
	raw_since: Millis,
	stage: ButtonStage,
}

impl<P: InputPin> Button<P> {
	/// Create a new [`Button`] for a pin pulled up and pressed to ground
	pub fn new(pin: P, debounce_ms: Millis, hold_ms: Millis) -> Self {
		Self {
			pin,
			active_low: true,
			debounce_ms,
			hold_ms,
			raw_pressed: false,
			raw_since: 0,
			stage: ButtonStage::Up,
		}
	}

	/// Create a new [`Button`] for a pin which reads high while pressed
	pub fn active_high(pin: P, debounce_ms: Millis, hold_ms: Millis) -> Self {
		Self {
			active_low: false,
			..Self::new(pin, debounce_ms, hold_ms)
		}
	}

	/// Read the pin and advance the button's state, returning a gesture if one completed
	pub fn update(&mut self, now: Millis) -> Option<Gesture> {
		// A pin which can't be read is treated as released.
		let pressed = match (self.pin.is_low(), self.active_low) {
			(Ok(low), true) => low,
			(Ok(low), false) => !low,
			(Err(_), _) => false,
		};

		if pressed != self.raw_pressed {
			self.raw_pressed = pressed;
			self.raw_since = now;
		}

		// The level has to be stable for the debounce time before the stage may change.
		let stable = elapsed(now, self.raw_since) >= self.debounce_ms;

		match (self.stage, pressed) {
			(ButtonStage::Up, true) if stable => {
				self.stage = ButtonStage::Down(now);
				None
			}
			(ButtonStage::Down(since), true) if elapsed(now, since) >= self.hold_ms => {
				self.stage = ButtonStage::Hold;
				Some(Gesture::Held)
			}
			(ButtonStage::Down(_), false) if stable => {
				self.stage = ButtonStage::Up;
				Some(Gesture::Click)
			}
			(ButtonStage::Hold, false) if stable => {
				self.stage = ButtonStage::Up;
				None
			}
			_ => None,
		}
	}
}
