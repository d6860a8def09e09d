//! DS3231 real-time clock on the I2C bus

use ds323x::{ic::DS3231, interface::I2cInterface, DateTimeAccess, Ds323x};
use embedded_hal::blocking::i2c;
use plant_waterer::clock::{DateTime, Rtc};

pub struct Ds3231<I2C> {
	inner: Ds323x<I2cInterface<I2C>, DS3231>,
}

impl<I2C, E> Ds3231<I2C>
where
	I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>,
{
	pub fn new(i2c: I2C) -> Self {
		Self {
			inner: Ds323x::new_ds3231(i2c),
		}
	}
}

impl<I2C, E> Rtc for Ds3231<I2C>
where
	I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>,
{
	type Error = ds323x::Error<E, ()>;

	fn datetime(&mut self) -> Result<DateTime, Self::Error> {
		let datetime = self.inner.datetime()?;
		DateTime::from_naive(&datetime).ok_or(ds323x::Error::InvalidDeviceState)
	}

	fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), Self::Error> {
		let naive = datetime
			.to_naive()
			.ok_or(ds323x::Error::InvalidInputData)?;
		self.inner.set_datetime(&naive)?;
		// The oscillator stop flag stays set until cleared, even once the time is valid again.
		self.inner.clear_has_been_stopped_flag()
	}

	fn lost_power(&mut self) -> Result<bool, Self::Error> {
		self.inner.has_been_stopped()
	}
}
