//! Arduino Nano wiring
//!
//! | Pin | Use |
//! | --- | --- |
//! | D2  | Button to ground |
//! | D3  | Water level switch to ground |
//! | D4  | Pump relay (active-low) |
//! | D5  | Display CLK |
//! | D6  | Display DIO |
//! | D13 | Status LED (kept off) |
//! | A2  | Right knob |
//! | A3  | Left knob |
//! | A4/A5 | DS3231 SDA/SCL |

mod eeprom;
mod knobs;
mod rtc;
mod timer;

use plant_waterer::{
	button::Button,
	config::Config,
	system::{System, SystemPeripherals},
	tm1637::Tm1637,
};

use eeprom::Eeprom;
use knobs::AnalogKnobs;
use rtc::Ds3231;

pub fn run(dp: arduino_hal::Peripherals) -> ! {
	let pins = arduino_hal::pins!(dp);

	// Initialize the serial interface for writing output when needed.
	let mut serial = arduino_hal::default_serial!(dp, pins, 57600);

	// Initialize the timer.
	timer::init(dp.TC0);

	// Turn on interrupts for this device.
	unsafe { avr_device::interrupt::enable() };

	let config = match Config::new().validate() {
		Ok(()) => Config::new(),
		Err(error) => {
			let _ = ufmt::uwriteln!(serial, "Invalid config: {:?}", error);
			Config::default()
		}
	};

	// Get all the peripherals attached to the device.
	let mut adc = arduino_hal::Adc::new(dp.ADC, Default::default());
	let left_knob = pins.a3.into_analog_input(&mut adc);
	let right_knob = pins.a2.into_analog_input(&mut adc);
	let knobs = AnalogKnobs::new(adc, left_knob, right_knob);

	let pump = pins.d4.into_output_high();
	let water_sensor = pins.d3.into_pull_up_input();
	let mut button = Button::new(
		pins.d2.into_pull_up_input(),
		config.debounce_ms,
		config.hold_ms,
	);
	let _status_led = pins.d13.into_output();

	let display = Tm1637::new(
		pins.d5.into_output(),
		pins.d6.into_opendrain(),
		arduino_hal::Delay::new(),
	);

	// The real-time clock is using the I2C interface.
	let i2c = arduino_hal::I2c::new(
		dp.TWI,
		pins.a4.into_pull_up_input(),
		pins.a5.into_pull_up_input(),
		100_000,
	);
	let rtc = Ds3231::new(i2c);
	let eeprom = Eeprom::new(dp.EEPROM);

	let peripherals = SystemPeripherals::new(pump, water_sensor, knobs);
	let mut control = System::new(config, display, rtc, eeprom, peripherals, serial);
	control.init(timer::millis());

	loop {
		let now = timer::millis();
		let gesture = button.update(now);

		// Run through control logic.
		control.tick(now, gesture);
	}
}
