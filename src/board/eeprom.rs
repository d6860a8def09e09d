//! The ATmega328P's built-in EEPROM, driven through its registers

use arduino_hal::pac::EEPROM;
use plant_waterer::store::Store;
use ufmt::derive::uDebug;

/// Size of the EEPROM in bytes
const EEPROM_SIZE: u16 = 1024;

#[derive(uDebug)]
pub enum EepromError {
	/// The address is past the end of the EEPROM
	OutOfRange,
}

pub struct Eeprom {
	inner: EEPROM,
}

impl Eeprom {
	pub fn new(inner: EEPROM) -> Self {
		Self { inner }
	}

	/// Wait until a previous write has finished
	fn wait(&self) {
		while self.inner.eecr.read().eepe().bit_is_set() {}
	}
}

impl Store for Eeprom {
	type Error = EepromError;

	fn read(&mut self, address: u16) -> Result<u8, Self::Error> {
		if address >= EEPROM_SIZE {
			return Err(EepromError::OutOfRange);
		}

		self.wait();
		self.inner.eear.write(|w| unsafe { w.bits(address) });
		self.inner.eecr.write(|w| w.eere().set_bit());
		Ok(self.inner.eedr.read().bits())
	}

	fn write(&mut self, address: u16, value: u8) -> Result<(), Self::Error> {
		if address >= EEPROM_SIZE {
			return Err(EepromError::OutOfRange);
		}

		self.wait();
		self.inner.eear.write(|w| unsafe { w.bits(address) });
		self.inner.eedr.write(|w| unsafe { w.bits(value) });

		// EEPE has to be set within four cycles of EEMPE, so nothing may interrupt in between.
		avr_device::interrupt::free(|_cs| {
			self.inner.eecr.write(|w| w.eempe().set_bit());
			self.inner.eecr.write(|w| w.eempe().set_bit().eepe().set_bit());
		});

		Ok(())
	}
}
