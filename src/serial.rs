//! Diagnostic output written to any [`ufmt::uWrite`] sink, usually the USART.
//!
//! Write errors are dropped: nothing depends on the log being read.

/// Write a line of formatted diagnostic output.
///
/// ```ignore
/// log!(self.serial, "{}, {}", my_value_1, my_value_2);
/// ```
macro_rules! log {
    ($serial:expr, $fmt:literal) => {{
		let _ = ufmt::uwriteln!($serial, $fmt);
	}};
    ($serial:expr, $fmt:literal, $($values:expr),*) => {{
		let _ = ufmt::uwriteln!($serial, $fmt, $($values),*);
	}}
}

/// A sink which discards everything, for boards without a serial port attached
pub struct NoSerial;

impl ufmt::uWrite for NoSerial {
	type Error = core::convert::Infallible;

	fn write_str(&mut self, _s: &str) -> Result<(), Self::Error> {
		Ok(())
	}
}
