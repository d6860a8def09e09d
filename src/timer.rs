//! Software timers measured against a free-running millisecond counter
//!
//! The counter wraps, so every comparison is done on the wrapping difference between two instants.

/// Milliseconds read from the board's free-running counter
pub type Millis = u32;

/// Milliseconds elapsed between `since` and `now`, tolerating a wrapped counter
pub fn elapsed(now: Millis, since: Millis) -> Millis {
	now.wrapping_sub(since)
}

/// A periodic timer which fires once every `period` milliseconds while running
pub struct Interval {
	period: Millis,
	last: Millis,
	running: bool,
}

impl Interval {
	/// Create a new stopped [`Interval`]
	pub const fn new(period: Millis) -> Self {
		Self {
			period,
			last: 0,
			running: false,
		}
	}

	/// Start (or restart) the timer so that it first fires one period after `now`
	pub fn start(&mut self, now: Millis) {
		self.last = now;
		self.running = true;
	}

	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Whether a period has passed since the timer last fired
	///
	/// Firing restarts the period from `now`, so a timer which wasn't ticked for several periods
	/// fires only once.
	pub fn tick(&mut self, now: Millis) -> bool {
		if self.running && elapsed(now, self.last) >= self.period {
			self.last = now;
			true
		} else {
			false
		}
	}
}

/// A one-shot point in time
#[derive(Clone, Copy)]
pub struct Deadline {
	start: Millis,
	length: Millis,
}

impl Deadline {
	/// A deadline `length` milliseconds after `now`
	pub fn after(now: Millis, length: Millis) -> Self {
		Self { start: now, length }
	}

	/// The deadline `length` milliseconds after this one
	pub fn then(&self, length: Millis) -> Self {
		Self {
			start: self.start.wrapping_add(self.length),
			length,
		}
	}

	pub fn has_passed(&self, now: Millis) -> bool {
		elapsed(now, self.start) >= self.length
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stopped_interval_never_fires() {
		let mut interval = Interval::new(100);
		assert!(!interval.tick(1_000));
	}

	#[test]
	fn interval_fires_once_per_period() {
		let mut interval = Interval::new(500);
		interval.start(1_000);
		assert!(!interval.tick(1_499));
		assert!(interval.tick(1_500));
		assert!(!interval.tick(1_600));
		assert!(interval.tick(2_000));

		// Missed periods collapse into a single firing.
		assert!(interval.tick(9_000));
		assert!(!interval.tick(9_001));

		interval.stop();
		assert!(!interval.tick(20_000));
	}

	#[test]
	fn interval_survives_counter_wrap() {
		let mut interval = Interval::new(100);
		interval.start(u32::MAX - 50);
		assert!(!interval.tick(u32::MAX));
		assert!(interval.tick(49));
	}

	#[test]
	fn deadline_passes_after_length() {
		let deadline = Deadline::after(u32::MAX - 10, 20);
		assert!(!deadline.has_passed(u32::MAX));
		assert!(!deadline.has_passed(8));
		assert!(deadline.has_passed(9));

		let next = deadline.then(5);
		assert!(!next.has_passed(13));
		assert!(next.has_passed(14));
	}
}
