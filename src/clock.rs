//! Wall-clock time, the watering schedule, and the real-time clock service

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use core::convert::TryFrom;
use ufmt::{derive::uDebug, uDisplay, uWrite};

/// Seconds since the Unix epoch at which this firmware was built, see [`DateTime::build`]
const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

/// Time of day as kept by the real-time clock
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ClockTime {
	pub hour: u8,
	pub minute: u8,
	pub second: u8,
}

impl ClockTime {
	pub fn new(hour: u8, minute: u8, second: u8) -> Self {
		Self {
			hour,
			minute,
			second,
		}
	}
}

/// Write a value below 100 with a leading zero
fn pad<W>(f: &mut ufmt::Formatter<'_, W>, value: u8) -> Result<(), W::Error>
where
	W: uWrite + ?Sized,
{
	if value < 10 {
		ufmt::uwrite!(f, "0{}", value)
	} else {
		ufmt::uwrite!(f, "{}", value)
	}
}

impl uDisplay for ClockTime {
	/// Formats as `HH:MM:SS`
	fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
	where
		W: uWrite + ?Sized,
	{
		pad(f, self.hour)?;
		f.write_str(":")?;
		pad(f, self.minute)?;
		f.write_str(":")?;
		pad(f, self.second)
	}
}

/// Calendar date and time of day
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub struct DateTime {
	pub year: u16,
	pub month: u8,
	pub day: u8,
	pub time: ClockTime,
}

impl DateTime {
	/// 1970-01-01 00:00:00
	pub const EPOCH: Self = Self {
		year: 1970,
		month: 1,
		day: 1,
		time: ClockTime {
			hour: 0,
			minute: 0,
			second: 0,
		},
	};

	/// Convert seconds since the Unix epoch into a date and time
	pub fn from_unix(timestamp: u64) -> Option<Self> {
		let seconds = i64::try_from(timestamp).ok()?;
		NaiveDateTime::from_timestamp_opt(seconds, 0)
			.and_then(|datetime| Self::from_naive(&datetime))
	}

	/// Convert from `chrono`, or `None` if the year doesn't fit
	pub fn from_naive(datetime: &NaiveDateTime) -> Option<Self> {
		Some(Self {
			year: u16::try_from(datetime.year()).ok()?,
			month: datetime.month() as u8,
			day: datetime.day() as u8,
			time: ClockTime::new(
				datetime.hour() as u8,
				datetime.minute() as u8,
				datetime.second() as u8,
			),
		})
	}

	/// Convert to `chrono`, or `None` if the date or time doesn't exist
	pub fn to_naive(&self) -> Option<NaiveDateTime> {
		NaiveDate::from_ymd_opt(
			i32::from(self.year),
			u32::from(self.month),
			u32::from(self.day),
		)?
		.and_hms_opt(
			u32::from(self.time.hour),
			u32::from(self.time.minute),
			u32::from(self.time.second),
		)
	}

	/// When the firmware was built, used to re-seed a clock which lost power
	///
	/// This is the builder's UTC time shifted by `BUILD_UTC_OFFSET` seconds when that was set for
	/// the build, so it is only the local wall-clock time if the offset was given.
	pub fn build() -> Self {
		BUILD_TIMESTAMP
			.parse()
			.ok()
			.and_then(Self::from_unix)
			.unwrap_or(Self::EPOCH)
	}

	/// The same date with a different time of day
	pub fn with_time(self, time: ClockTime) -> Self {
		Self { time, ..self }
	}
}

impl uDisplay for DateTime {
	/// Formats as `YYYY-MM-DD HH:MM:SS`
	fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
	where
		W: uWrite + ?Sized,
	{
		ufmt::uwrite!(f, "{}-", self.year)?;
		pad(f, self.month)?;
		f.write_str("-")?;
		pad(f, self.day)?;
		ufmt::uwrite!(f, " {}", self.time)
	}
}

/// Daily time at which the plants are watered
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Schedule {
	pub hour: u8,
	pub minute: u8,
}

impl Schedule {
	/// Create a new [`Schedule`], or `None` if the time of day doesn't exist
	pub fn new(hour: u8, minute: u8) -> Option<Self> {
		if hour < 24 && minute < 60 {
			Some(Self { hour, minute })
		} else {
			None
		}
	}

	/// Build a schedule from a minute of the day, wrapping past midnight
	pub fn from_minute_of_day(minutes: u16) -> Self {
		let minutes = minutes % 1_440;
		Self {
			hour: (minutes / 60) as u8,
			minute: (minutes % 60) as u8,
		}
	}

	/// Whether it is time to water: the hour and minute match exactly
	///
	/// There is no window, so whatever polls this has to do so more than once a minute.
	pub fn matches(&self, time: &ClockTime) -> bool {
		time.hour == self.hour && time.minute == self.minute
	}
}

/// A battery backed real-time clock chip
pub trait Rtc {
	type Error;

	/// Current date and time
	fn datetime(&mut self) -> Result<DateTime, Self::Error>;

	/// Set the date and time, and mark the clock as valid again
	fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), Self::Error>;

	/// Whether the clock stopped (usually because the backup battery ran flat) since it was last
	/// set
	fn lost_power(&mut self) -> Result<bool, Self::Error>;

	/// Whether the chip answers at all
	fn is_present(&mut self) -> bool {
		self.datetime().is_ok()
	}
}

/// Clock and schedule service
///
/// Wraps the [`Rtc`] so that callers always get a time, even if the chip is missing or stops
/// answering. In that case the last known time (initially midnight) is returned.
pub struct Clock<R> {
	rtc: R,
	present: bool,
	last: DateTime,
}

impl<R: Rtc> Clock<R> {
	pub fn new(rtc: R) -> Self {
		Self {
			rtc,
			present: true,
			last: DateTime::EPOCH,
		}
	}

	/// Probe the chip, remembering whether it was found
	pub fn is_present(&mut self) -> bool {
		self.present = self.rtc.is_present();
		self.present
	}

	/// Whether the chip lost its time; a chip which can't be asked is assumed fine
	pub fn lost_power(&mut self) -> bool {
		self.present && self.rtc.lost_power().unwrap_or(false)
	}

	/// Current date and time, best effort
	pub fn datetime(&mut self) -> DateTime {
		if self.present {
			if let Ok(datetime) = self.rtc.datetime() {
				self.last = datetime;
			}
		}
		self.last
	}

	/// Current time of day, best effort
	pub fn now(&mut self) -> ClockTime {
		self.datetime().time
	}

	/// Time of day as of the last read, without asking the chip again
	pub fn last_time(&self) -> ClockTime {
		self.last.time
	}

	/// Set the whole date and time
	pub fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), R::Error> {
		self.rtc.set_datetime(datetime)?;
		self.last = *datetime;
		Ok(())
	}

	/// Set the time of day, keeping the current date
	///
	/// If the date can't be read, the build date is used instead.
	pub fn set_time(&mut self, time: ClockTime) -> Result<(), R::Error> {
		let date = match self.rtc.datetime() {
			Ok(datetime) => datetime,
			Err(_) => DateTime::build(),
		};
		self.set_datetime(&date.with_time(time))?;
		// A clock which accepted the write is evidently there.
		self.present = true;
		Ok(())
	}

	/// Re-seed the clock from the build time, used once after a power loss
	pub fn reseed(&mut self) -> Result<(), R::Error> {
		self.set_datetime(&DateTime::build())
	}

	/// Whether it is time to water according to `schedule`
	pub fn should_run(&mut self, schedule: &Schedule) -> bool {
		let now = self.now();
		schedule.matches(&now)
	}
}
