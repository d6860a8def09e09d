//! [`Display`] on a TM1637 based 4-digit module
//!
//! The bus protocol is handled by the `tm1637` driver crate. This adapter keeps the segments and
//! the separator point, and sends the whole frame whenever either changes.

use ::tm1637::TM1637;
use embedded_hal::{
	blocking::delay::DelayUs,
	digital::v2::{InputPin, OutputPin},
};

use crate::display::{clock_segments, number_segments, segments, Display, Message, MAX_BRIGHTNESS};

/// Index of the digit carrying the separator point
const POINT_DIGIT: usize = 1;

/// Register address of the leftmost digit
const FIRST_DIGIT: u8 = 0;

/// Segments to send for `digits`, with the separator point lit or not
fn frame(digits: [u8; 4], point: bool) -> [u8; 4] {
	let mut frame = digits;
	if point {
		frame[POINT_DIGIT] |= segments::POINT;
	}
	frame
}

pub struct Tm1637<CLK, DIO, D> {
	clk: CLK,
	dio: DIO,
	delay: D,
	/// Segments currently shown, without the separator point
	digits: [u8; 4],
	point: bool,
	brightness: u8,
}

impl<CLK, DIO, D, E> Tm1637<CLK, DIO, D>
where
	CLK: OutputPin<Error = E>,
	DIO: InputPin<Error = E> + OutputPin<Error = E>,
	D: DelayUs<u16>,
{
	/// Create a new display and blank it
	///
	/// `dio` has to be an open-drain pin (or have an external pull-up) since the chip pulls it low
	/// to acknowledge.
	pub fn new(clk: CLK, dio: DIO, delay: D) -> Self {
		let mut display = Self {
			clk,
			dio,
			delay,
			digits: [segments::BLANK; 4],
			point: false,
			brightness: 0,
		};
		display.flush();
		display
	}

	/// Segments last sent to the chip
	pub fn segments(&self) -> [u8; 4] {
		frame(self.digits, self.point)
	}

	/// Current brightness level
	pub fn brightness(&self) -> u8 {
		self.brightness
	}

	fn flush(&mut self) {
		let bytes = self.segments();
		// A display which doesn't acknowledge is left alone.
		let _ = TM1637::new(&mut self.clk, &mut self.dio, &mut self.delay)
			.print_raw(FIRST_DIGIT, &bytes);
	}

	fn show(&mut self, digits: [u8; 4]) {
		self.digits = digits;
		self.flush();
	}
}

impl<CLK, DIO, D, E> Display for Tm1637<CLK, DIO, D>
where
	CLK: OutputPin<Error = E>,
	DIO: InputPin<Error = E> + OutputPin<Error = E>,
	D: DelayUs<u16>,
{
	fn show_number(&mut self, value: u16) {
		self.show(number_segments(value));
	}

	fn show_clock(&mut self, hour: u8, minute: u8) {
		self.show(clock_segments(hour, minute));
	}

	fn show_message(&mut self, message: Message) {
		self.show(message.glyphs());
	}

	fn set_brightness(&mut self, level: u8) {
		let level = level.min(MAX_BRIGHTNESS);
		self.brightness = level;
		let _ = TM1637::new(&mut self.clk, &mut self.dio, &mut self.delay).set_brightness(level);
	}

	fn set_point(&mut self, on: bool) {
		if self.point != on {
			self.point = on;
			self.flush();
		}
	}

	fn clear(&mut self) {
		self.show([segments::BLANK; 4]);
	}
}
