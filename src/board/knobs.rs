use arduino_hal::{
	clock::MHz16,
	hal::{
		port::{PC2, PC3},
		Adc,
	},
	port::{mode::Analog, Pin},
};
use plant_waterer::calibration::{Knob, Knobs};

/// Potentiometers on the analog inputs, sharing the ADC
pub struct AnalogKnobs {
	/// Analog to digital converter used for reading analog input values
	adc: Adc<MHz16>,
	/// A3
	left: Pin<Analog, PC3>,
	/// A2
	right: Pin<Analog, PC2>,
}

impl AnalogKnobs {
	pub fn new(adc: Adc<MHz16>, left: Pin<Analog, PC3>, right: Pin<Analog, PC2>) -> Self {
		Self { adc, left, right }
	}
}

impl Knobs for AnalogKnobs {
	fn read(&mut self, knob: Knob) -> u16 {
		match knob {
			Knob::Left => self.left.analog_read(&mut self.adc),
			Knob::Right => self.right.analog_read(&mut self.adc),
		}
	}
}
