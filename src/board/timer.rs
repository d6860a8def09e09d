//! Free-running millisecond counter driven by TIMER0
//!
//! Ref: https://blog.rahix.de/005-avr-hal-millis/

use avr_device::interrupt::Mutex;
use core::cell::Cell;

const PRESCALER: u32 = 64;
const TIMER_COUNTS: u32 = 250;

const MILLIS_INCREMENT: u32 = PRESCALER * TIMER_COUNTS / 16000;

static MILLIS_COUNTER: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Configure TIMER0 to fire a compare match interrupt every millisecond
///
/// Interrupts still have to be enabled globally afterwards.
pub fn init(tc0: arduino_hal::pac::TC0) {
	// Configure the timer for the above interval (in CTC mode)
	// and enable its interrupt.
	tc0.tccr0a.write(|w| w.wgm0().ctc());
	tc0.ocr0a.write(|w| unsafe { w.bits(TIMER_COUNTS as u8) });
	// Must match PRESCALER.
	tc0.tccr0b.write(|w| w.cs0().prescale_64());
	tc0.timsk0.write(|w| w.ocie0a().set_bit());

	// Reset the counter in case the board was soft-reset.
	avr_device::interrupt::free(|cs| MILLIS_COUNTER.borrow(cs).set(0));
}

/// Milliseconds since [`init`], wrapping after roughly 49 days
pub fn millis() -> u32 {
	avr_device::interrupt::free(|cs| MILLIS_COUNTER.borrow(cs).get())
}

#[avr_device::interrupt(atmega328p)]
#[allow(non_snake_case)]
fn TIMER0_COMPA() {
	avr_device::interrupt::free(|cs| {
		let counter_cell = MILLIS_COUNTER.borrow(cs);
		let counter = counter_cell.get();
		counter_cell.set(counter.wrapping_add(MILLIS_INCREMENT));
	})
}
