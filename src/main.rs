#![cfg_attr(target_arch = "avr", feature(llvm_asm))]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]
#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
mod board;

#[cfg(target_arch = "avr")]
#[arduino_hal::entry]
fn main() -> ! {
	let dp: arduino_hal::Peripherals = arduino_hal::Peripherals::take().unwrap();
	board::run(dp)
}

#[cfg(target_arch = "avr")]
#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
	loop {}
}

/// The firmware only runs on the board; on any other target there is nothing to do.
#[cfg(not(target_arch = "avr"))]
fn main() {}
