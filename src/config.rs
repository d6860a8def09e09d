use ufmt::derive::uDebug;

use crate::timer::Millis;

/// Default minimum change in analog units before a potentiometer reading is accepted
const DEFAULT_THRESHOLD: u16 = 20;

/// Default EEPROM address of the scheduled hour
const DEFAULT_HOURS_ADDRESS: u16 = 3;
/// Default EEPROM address of the scheduled minute
const DEFAULT_MINUTES_ADDRESS: u16 = 5;
/// Default EEPROM address of the watering duration
const DEFAULT_DURATION_ADDRESS: u16 = 7;

/// Default time between schedule checks
const DEFAULT_SCHEDULE_CHECK_MS: Millis = 35_000;
/// The schedule only matches for one minute, so checks have to be closer together than this
const SCHEDULE_CHECK_LIMIT_MS: Millis = 60_000;

/// Default time a button has to be held down before it counts as held
const DEFAULT_HOLD_MS: Millis = 600;
/// Default time a button level has to be stable before it is believed
const DEFAULT_DEBOUNCE_MS: Millis = 50;

/// Default time status messages stay on the display
const DEFAULT_NOTICE_MS: Millis = 1_000;
/// Default pause after leaving the settings before input is accepted again
const DEFAULT_EXIT_PAUSE_MS: Millis = 300;
/// Default blink period of the separator point while setting the clock
const DEFAULT_BLINK_MS: Millis = 500;

/// Default display brightness while showing something
const DEFAULT_ACTIVE_BRIGHTNESS: u8 = 6;
/// Default display brightness while idle
const DEFAULT_IDLE_BRIGHTNESS: u8 = 0;

/// Watering duration in seconds used until one has been saved
const DEFAULT_DURATION_SECONDS: u8 = 2;

/// How the settings are walked through
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SettingsFlow {
	/// Duration, then schedule, then clock, one at a time.
	///
	/// A click moves on to the next setting and holding the button saves the current one.
	Nested,
	/// Duration and time of day are set together, one on each knob.
	///
	/// Holding the button saves both as the duration and schedule. Clicks are ignored.
	Combined,
}

/// Which level the water sensor reports when the tank is empty
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum SensorPolarity {
	/// Low means the tank is empty (a float switch to ground, with a pull-up)
	LowIsEmpty,
	/// Low means there is water
	LowIsWater,
}

/// EEPROM addresses of the persisted settings, one byte each
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Layout {
	pub hours: u16,
	pub minutes: u16,
	pub duration: u16,
}

/// Problems with a [`Config`]
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConfigError {
	/// The schedule check period is a minute or longer, so a scheduled minute could be skipped
	ScheduleCheckTooSlow,
	/// Two settings share an EEPROM address
	OverlappingAddresses,
	/// The threshold is larger than the analog range, so no reading would ever be accepted
	ThresholdTooLarge,
	/// The brightness is out of the display's range
	BrightnessOutOfRange,
	/// The default duration is longer than a duration can be set to
	DurationOutOfRange,
}

/// Configuration used to drive the system
#[derive(Clone, Copy, Debug)]
pub struct Config {
	/// Minimum change in analog units before a potentiometer reading is accepted
	pub threshold: u16,
	/// Where the settings live in EEPROM
	pub layout: Layout,
	/// How often the schedule is compared with the clock
	pub schedule_check_ms: Millis,
	/// How long the button has to be held down before it counts as held
	pub hold_ms: Millis,
	/// How long a button level has to be stable before it is believed
	pub debounce_ms: Millis,
	/// How long status messages stay on the display
	pub notice_ms: Millis,
	/// Pause after leaving the settings
	pub exit_pause_ms: Millis,
	/// Blink period of the separator point while setting the clock
	pub blink_ms: Millis,
	/// Display brightness while showing something
	pub active_brightness: u8,
	/// Display brightness while idle
	pub idle_brightness: u8,
	/// Watering duration in seconds used until one has been saved
	pub default_duration_seconds: u8,
	/// How the settings are walked through
	pub flow: SettingsFlow,
	/// Which level the water sensor reports when the tank is empty
	pub water_sensor: SensorPolarity,
}

impl Config {
	/// Create a new [`Config`] with default values
	pub const fn new() -> Self {
		Self {
			threshold: DEFAULT_THRESHOLD,
			layout: Layout {
				hours: DEFAULT_HOURS_ADDRESS,
				minutes: DEFAULT_MINUTES_ADDRESS,
				duration: DEFAULT_DURATION_ADDRESS,
			},
			schedule_check_ms: DEFAULT_SCHEDULE_CHECK_MS,
			hold_ms: DEFAULT_HOLD_MS,
			debounce_ms: DEFAULT_DEBOUNCE_MS,
			notice_ms: DEFAULT_NOTICE_MS,
			exit_pause_ms: DEFAULT_EXIT_PAUSE_MS,
			blink_ms: DEFAULT_BLINK_MS,
			active_brightness: DEFAULT_ACTIVE_BRIGHTNESS,
			idle_brightness: DEFAULT_IDLE_BRIGHTNESS,
			default_duration_seconds: DEFAULT_DURATION_SECONDS,
			flow: SettingsFlow::Nested,
			water_sensor: SensorPolarity::LowIsEmpty,
		}
	}

	/// Check that the configuration can work
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.schedule_check_ms >= SCHEDULE_CHECK_LIMIT_MS {
			return Err(ConfigError::ScheduleCheckTooSlow);
		}

		let Layout {
			hours,
			minutes,
			duration,
		} = self.layout;
		if hours == minutes || hours == duration || minutes == duration {
			return Err(ConfigError::OverlappingAddresses);
		}

		if self.threshold >= crate::calibration::ANALOG_MAX {
			return Err(ConfigError::ThresholdTooLarge);
		}

		let max = crate::display::MAX_BRIGHTNESS;
		if self.active_brightness > max || self.idle_brightness > max {
			return Err(ConfigError::BrightnessOutOfRange);
		}

		if self.default_duration_seconds > crate::watering::MAX_SECONDS {
			return Err(ConfigError::DurationOutOfRange);
		}

		Ok(())
	}
}

impl Default for Config {
	fn default() -> Self {
		Self::new()
	}
}
