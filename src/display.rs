//! The 4-digit, 7-segment status display

use ufmt::derive::uDebug;

/// Brightest level accepted by [`Display::set_brightness`]
pub const MAX_BRIGHTNESS: u8 = 7;

/// Fixed 4-glyph status messages
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Message {
	/// "Cloc" - no real-time clock was found
	NoClock,
	/// "bAt " - the real-time clock lost its battery backed time
	LowBattery,
	/// "FiLL" - the water tank is empty
	NoWater,
	/// "SAUE" - a setting was committed
	Saved,
	/// "dUr " - setting the watering duration
	SetDuration,
	/// "CLOC" - setting the wall-clock time
	SetTime,
	/// "SCEd" - setting the daily watering schedule
	SetSchedule,
}

impl Message {
	/// Segment patterns for each of the four digits
	pub fn glyphs(&self) -> [u8; 4] {
		use segments::*;

		match self {
			Self::NoClock => [UPPER_C, LOWER_L, LOWER_O, LOWER_C],
			Self::LowBattery => [LOWER_B, UPPER_A, LOWER_T, BLANK],
			Self::NoWater => [UPPER_F, LOWER_I, UPPER_L, UPPER_L],
			Self::Saved => [UPPER_S, UPPER_A, UPPER_U, UPPER_E],
			Self::SetDuration => [LOWER_D, UPPER_U, LOWER_R, BLANK],
			Self::SetTime => [UPPER_C, UPPER_L, UPPER_O, UPPER_C],
			Self::SetSchedule => [UPPER_S, UPPER_C, UPPER_E, LOWER_D],
		}
	}
}

/// Segment patterns, bit 0 is segment A through bit 6 for segment G, bit 7 is the separator point
pub mod segments {
	pub const BLANK: u8 = 0x00;
	/// Separator point (the colon on clock displays)
	pub const POINT: u8 = 0x80;
	pub const DIGITS: [u8; 10] = [0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, 0x7f, 0x6f];

	pub const UPPER_A: u8 = 0x77;
	pub const UPPER_C: u8 = 0x39;
	pub const UPPER_E: u8 = 0x79;
	pub const UPPER_F: u8 = 0x71;
	pub const UPPER_L: u8 = 0x38;
	pub const UPPER_O: u8 = 0x3f;
	pub const UPPER_S: u8 = 0x6d;
	pub const UPPER_U: u8 = 0x3e;
	pub const LOWER_B: u8 = 0x7c;
	pub const LOWER_C: u8 = 0x58;
	pub const LOWER_D: u8 = 0x5e;
	pub const LOWER_I: u8 = 0x10;
	pub const LOWER_L: u8 = 0x30;
	pub const LOWER_O: u8 = 0x5c;
	pub const LOWER_R: u8 = 0x50;
	pub const LOWER_T: u8 = 0x78;
}

/// Segments for an integer, right aligned without leading zeros
///
/// Values which don't fit on four digits are shown as 9999.
pub fn number_segments(value: u16) -> [u8; 4] {
	let mut value = value.min(9999);
	let mut buf = [segments::BLANK; 4];
	for idx in (0..buf.len()).rev() {
		buf[idx] = segments::DIGITS[(value % 10) as usize];
		value /= 10;
		if value == 0 {
			break;
		}
	}
	buf
}

/// Segments for an `HH:MM` pair, zero padded
///
/// The separator point is left off; drivers add it according to their point state.
pub fn clock_segments(hour: u8, minute: u8) -> [u8; 4] {
	let hour = hour.min(99);
	let minute = minute.min(99);
	[
		segments::DIGITS[(hour / 10) as usize],
		segments::DIGITS[(hour % 10) as usize],
		segments::DIGITS[(minute / 10) as usize],
		segments::DIGITS[(minute % 10) as usize],
	]
}

/// Status display
///
/// Drivers are best effort; a failure to talk to the display is not reported.
pub trait Display {
	/// Show an integer, right aligned
	fn show_number(&mut self, value: u16);
	/// Show an `HH:MM` pair
	fn show_clock(&mut self, hour: u8, minute: u8);
	/// Show one of the fixed status messages
	fn show_message(&mut self, message: Message);
	/// Set the brightness, from 0 to [`MAX_BRIGHTNESS`]
	fn set_brightness(&mut self, level: u8);
	/// Turn the separator point between the hours and minutes on or off
	fn set_point(&mut self, on: bool);
	/// Blank all digits
	fn clear(&mut self);
}
