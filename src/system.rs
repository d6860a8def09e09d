//! Logic for coordinating peripheral inputs and outputs

use embedded_hal::digital::v2::{InputPin, OutputPin};
use ufmt::uWrite;

use crate::{
	button::Gesture,
	calibration::{Knob, Knobs, Range, Sampler},
	clock::{Clock, ClockTime, Rtc, Schedule},
	config::{Config, SettingsFlow},
	display::{Display, Message},
	mode::{transition, Action, ControllerState, Event, Mode},
	store::{Persistence, Settings, Store},
	timer::{Deadline, Interval, Millis},
	watering::{Actuator, Duration, NoWater, Pump, Step, WaterSensor},
};

/// Holds peripherals for reading sensor values and controlling hardware
pub struct SystemPeripherals<P, W, K> {
	/// Pump relay
	pump: P,
	/// Water sensor in the tank
	water_sensor: W,
	/// Potentiometers
	knobs: K,
}

impl<P, W, K> SystemPeripherals<P, W, K>
where
	P: OutputPin,
	W: InputPin,
	K: Knobs,
{
	/// Create a new [`SystemPeripherals`] from the pump relay pin, water sensor pin and knobs
	pub fn new(pump: P, water_sensor: W, knobs: K) -> Self {
		Self {
			pump,
			water_sensor,
			knobs,
		}
	}
}

/// Knob samplers of the settings being calibrated
enum Session {
	None,
	/// Duration on the left knob, and the time of day on the right knob in the combined flow
	Duration {
		duration: Sampler,
		time_of_day: Option<Sampler>,
	},
	/// Hours on the left knob, minutes on the right knob
	Time { hours: Sampler, minutes: Sampler },
}

/// What to show once a notice has been taken down
#[derive(Clone, Copy)]
struct FollowUp {
	message: Option<Message>,
	length: Millis,
}

/// A status message (or a blank display) during which all input is ignored
#[derive(Clone, Copy)]
struct Notice {
	until: Deadline,
	then: Option<FollowUp>,
}

/// Central type which connects the components of the system
pub struct System<D, R, S, P, W, K, L> {
	config: Config,
	/// Display controller
	display: D,
	/// Real-time clock
	clock: Clock<R>,
	/// Saved settings
	persistence: Persistence<S>,
	/// Pump and water sensor
	actuator: Actuator<P, W>,
	/// Potentiometers
	knobs: K,
	/// Diagnostic output
	serial: L,
	state: ControllerState,
	session: Session,
	notice: Option<Notice>,
	/// Fires when the schedule should be compared with the clock
	schedule_timer: Interval,
	/// Blinks the separator point while setting the clock
	blink_timer: Interval,
	point: bool,
	/// The schedule which last started watering, until its minute has passed
	last_scheduled: Option<Schedule>,
}

impl<D, R, S, P, W, K, L> System<D, R, S, P, W, K, L>
where
	D: Display,
	R: Rtc,
	S: Store,
	P: OutputPin,
	W: InputPin,
	K: Knobs,
	L: uWrite,
{
	pub fn new(
		config: Config,
		display: D,
		rtc: R,
		store: S,
		peripherals: SystemPeripherals<P, W, K>,
		serial: L,
	) -> Self {
		let SystemPeripherals {
			pump,
			water_sensor,
			knobs,
		} = peripherals;
		let actuator = Actuator::new(
			Pump::new(pump),
			WaterSensor::new(water_sensor, config.water_sensor),
		);
		let state = ControllerState::new(
			Schedule::default(),
			Duration::saturating(config.default_duration_seconds),
		);

		Self {
			config,
			display,
			clock: Clock::new(rtc),
			persistence: Persistence::new(store, config.layout),
			actuator,
			knobs,
			serial,
			state,
			session: Session::None,
			notice: None,
			schedule_timer: Interval::new(config.schedule_check_ms),
			blink_timer: Interval::new(config.blink_ms),
			point: false,
			last_scheduled: None,
		}
	}

	/// Current mode and committed settings
	pub fn state(&self) -> &ControllerState {
		&self.state
	}

	/// Whether a status message is up and input is being ignored
	pub fn is_showing_notice(&self) -> bool {
		self.notice.is_some()
	}

	fn defaults(&self) -> Settings {
		Settings {
			schedule: Schedule::default(),
			duration: Duration::saturating(self.config.default_duration_seconds),
		}
	}

	/// Check the clock, restore the saved settings and start the schedule timer
	pub fn init(&mut self, now: Millis) {
		self.display.clear();
		self.display.set_point(false);
		self.display.set_brightness(self.config.idle_brightness);

		if !self.clock.is_present() {
			log!(self.serial, "DS3231 not found");
			self.notify(Message::NoClock, now);
		} else {
			let datetime = self.clock.datetime();
			log!(self.serial, "{}", datetime);

			if self.clock.lost_power() {
				log!(self.serial, "lost battery");
				self.notify(Message::LowBattery, now);
				if self.clock.reseed().is_err() {
					log!(self.serial, "Could not set the clock");
				}
			}
		}

		let settings = self.persistence.load(self.defaults());
		self.state.schedule = settings.schedule;
		self.state.duration = settings.duration;
		log!(
			self.serial,
			"Schedule: {}:{}, duration: {}s",
			settings.schedule.hour,
			settings.schedule.minute,
			settings.duration.seconds()
		);

		self.schedule_timer.start(now);
		log!(self.serial, "Start!");
	}

	/// Update the state of the system
	///
	/// `gesture` is whatever the button reported since the last tick. Gestures which arrive while
	/// the current mode doesn't handle them are dropped.
	pub fn tick(&mut self, now: Millis, gesture: Option<Gesture>) {
		// Nothing else happens while a notice is up.
		if let Some(notice) = self.notice {
			if notice.until.has_passed(now) {
				self.end_notice(notice.then, now);
			}
			return;
		}

		match self.state.mode {
			Mode::Idle => self.tick_idle(now, gesture),
			Mode::Watering => self.tick_watering(now),
			Mode::SettingsDuration => self.tick_duration(now, gesture),
			Mode::SettingsSchedule | Mode::SettingsClock => self.tick_time(now, gesture),
		}
	}

	fn handle(&mut self, event: Event, now: Millis) {
		let (mode, action) = transition(self.state.mode, event, self.config.flow);
		if mode != self.state.mode {
			log!(self.serial, "{:?} -> {:?}", self.state.mode, mode);
		}
		self.state.mode = mode;

		match action {
			Action::None => {}
			Action::StartWatering => self.start_watering(now),
			Action::StopWatering => self.stop_watering(),
			Action::EnterDuration => self.enter_duration(),
			Action::EnterSchedule => self.enter_time(Message::SetSchedule, now),
			Action::EnterClock => self.enter_time(Message::SetTime, now),
			Action::CommitDuration => {
				self.commit_duration();
				self.leave_settings(true, now);
			}
			Action::CommitSchedule => {
				self.commit_schedule();
				self.leave_settings(true, now);
			}
			Action::CommitClock => {
				self.commit_clock();
				self.leave_settings(true, now);
			}
			Action::Cancel => self.leave_settings(false, now),
		}
	}

	fn tick_idle(&mut self, now: Millis, gesture: Option<Gesture>) {
		// The pump must never run outside of watering.
		self.actuator.release();

		if self.schedule_timer.tick(now) && self.schedule_due() {
			log!(self.serial, "Scheduled run");
			self.handle(Event::ScheduleDue, now);
			return;
		}

		if let Some(gesture) = gesture {
			self.handle(gesture.into(), now);
		}
	}

	/// Compare the clock with the schedule, at most once per scheduled minute
	fn schedule_due(&mut self) -> bool {
		let schedule = self.state.schedule;
		let due = self.clock.should_run(&schedule);
		let time = self.clock.last_time();
		log!(
			self.serial,
			"{} {}={}; {}={}",
			time,
			time.hour,
			schedule.hour,
			time.minute,
			schedule.minute
		);

		if !due {
			self.last_scheduled = None;
			return false;
		}

		// A check period under a minute can see the same minute twice.
		if self.last_scheduled == Some(schedule) {
			return false;
		}
		self.last_scheduled = Some(schedule);
		true
	}

	fn start_watering(&mut self, now: Millis) {
		let duration = self.state.duration;
		log!(self.serial, "Duration: {}s", duration.seconds());

		match self.actuator.start(duration, now) {
			Err(NoWater) => {
				log!(self.serial, "No water");
				self.handle(Event::Finished, now);
				self.notify(Message::NoWater, now);
			}
			Ok(Some(seconds)) => {
				log!(self.serial, "Start pump");
				self.display.set_brightness(self.config.active_brightness);
				self.display.clear();
				self.display.show_number(seconds.into());
			}
			Ok(None) => {
				log!(self.serial, "Start pump");
				log!(self.serial, "End pump");
				self.handle(Event::Finished, now);
			}
		}
	}

	fn tick_watering(&mut self, now: Millis) {
		match self.actuator.tick(now) {
			Step::Remaining(seconds) => {
				self.display.clear();
				self.display.show_number(seconds.into());
			}
			Step::Finished => {
				log!(self.serial, "End pump");
				self.handle(Event::Finished, now);
			}
			Step::Running => {}
		}
	}

	fn stop_watering(&mut self) {
		self.actuator.release();
		self.display.clear();
		self.display.set_brightness(self.config.idle_brightness);
	}

	fn enter_duration(&mut self) {
		log!(self.serial, "Set duration");
		self.display.set_brightness(self.config.active_brightness);
		self.display.show_message(Message::SetDuration);

		let threshold = self.config.threshold;
		let duration = Sampler::new(
			Range::DurationSeconds,
			threshold,
			self.knobs.read(Knob::Left),
		);
		let time_of_day = match self.config.flow {
			SettingsFlow::Nested => None,
			SettingsFlow::Combined => Some(Sampler::new(
				Range::MinutesOfDay,
				threshold,
				self.knobs.read(Knob::Right),
			)),
		};
		self.session = Session::Duration {
			duration,
			time_of_day,
		};
	}

	fn tick_duration(&mut self, now: Millis, gesture: Option<Gesture>) {
		if let Session::Duration {
			duration,
			time_of_day,
		} = &mut self.session
		{
			if let Some(seconds) = duration.offer(self.knobs.read(Knob::Left)) {
				self.display.set_point(false);
				self.display.show_number(seconds);
			}

			if let Some(time_of_day) = time_of_day {
				if let Some(minutes) = time_of_day.offer(self.knobs.read(Knob::Right)) {
					let schedule = Schedule::from_minute_of_day(minutes);
					self.display.set_point(true);
					self.display.show_clock(schedule.hour, schedule.minute);
				}
			}
		}

		if let Some(gesture) = gesture {
			self.handle(gesture.into(), now);
		}
	}

	/// Start calibrating a time of day, for the schedule or for the clock
	fn enter_time(&mut self, message: Message, now: Millis) {
		if self.state.mode == Mode::SettingsClock {
			log!(self.serial, "Set time mode");
			self.blink_timer.start(now);
		} else {
			log!(self.serial, "Set schedule mode");
			self.blink_timer.stop();
		}

		self.display.set_brightness(self.config.active_brightness);
		self.display.show_message(message);
		self.point = true;
		self.display.set_point(true);

		let threshold = self.config.threshold;
		self.session = Session::Time {
			hours: Sampler::new(Range::Hours, threshold, self.knobs.read(Knob::Left)),
			minutes: Sampler::new(Range::Minutes, threshold, self.knobs.read(Knob::Right)),
		};
	}

	fn tick_time(&mut self, now: Millis, gesture: Option<Gesture>) {
		if self.blink_timer.tick(now) {
			self.point = !self.point;
			self.display.set_point(self.point);
		}

		if let Session::Time { hours, minutes } = &mut self.session {
			let hour = hours.offer(self.knobs.read(Knob::Left));
			let minute = minutes.offer(self.knobs.read(Knob::Right));
			if hour.is_some() || minute.is_some() {
				self.display
					.show_clock(hours.value() as u8, minutes.value() as u8);
			}
		}

		if let Some(gesture) = gesture {
			self.handle(gesture.into(), now);
		}
	}

	/// Staged hour and minute of a time session
	fn staged_time(&self) -> Option<(u8, u8)> {
		match &self.session {
			Session::Time { hours, minutes } => Some((hours.value() as u8, minutes.value() as u8)),
			_ => None,
		}
	}

	fn commit_duration(&mut self) {
		let (duration, schedule) = match &self.session {
			Session::Duration {
				duration,
				time_of_day,
			} => (
				Duration::from_raw(duration.raw()),
				time_of_day
					.as_ref()
					.map(|time_of_day| Schedule::from_minute_of_day(time_of_day.value())),
			),
			_ => return,
		};

		self.state.duration = duration;
		log!(self.serial, "Duration: {}s", duration.seconds());
		if self.persistence.save_duration(duration).is_err() {
			log!(self.serial, "Could not save the duration");
		}

		if let Some(schedule) = schedule {
			self.save_schedule(schedule);
		}
	}

	fn commit_schedule(&mut self) {
		let schedule = self
			.staged_time()
			.and_then(|(hour, minute)| Schedule::new(hour, minute));
		if let Some(schedule) = schedule {
			self.save_schedule(schedule);
		}
	}

	fn save_schedule(&mut self, schedule: Schedule) {
		self.state.schedule = schedule;
		self.last_scheduled = None;
		log!(self.serial, "Schedule: {}:{}", schedule.hour, schedule.minute);
		if self.persistence.save_schedule(&schedule).is_err() {
			log!(self.serial, "Could not save the schedule");
		}
	}

	fn commit_clock(&mut self) {
		if let Some((hour, minute)) = self.staged_time() {
			let time = ClockTime::new(hour, minute, 0);
			match self.clock.set_time(time) {
				Ok(()) => log!(self.serial, "Clock: {}", time),
				Err(_) => log!(self.serial, "Could not set the clock"),
			}
		}
	}

	/// Take down the settings, showing that they were saved if they were
	fn leave_settings(&mut self, saved: bool, now: Millis) {
		self.session = Session::None;
		self.blink_timer.stop();
		self.point = false;
		self.display.set_point(false);

		let pause = FollowUp {
			message: None,
			length: self.config.exit_pause_ms,
		};
		if saved {
			log!(self.serial, "Saved");
			self.start_notice(Some(Message::Saved), self.config.notice_ms, Some(pause), now);
		} else {
			self.display.clear();
			self.display.set_brightness(self.config.idle_brightness);
			self.start_notice(pause.message, pause.length, None, now);
		}
		log!(self.serial, "Exit settings mode");
	}

	/// Show a status message for the configured time
	fn notify(&mut self, message: Message, now: Millis) {
		self.start_notice(Some(message), self.config.notice_ms, None, now);
	}

	fn start_notice(
		&mut self,
		message: Option<Message>,
		length: Millis,
		then: Option<FollowUp>,
		now: Millis,
	) {
		if let Some(message) = message {
			self.display.set_brightness(self.config.active_brightness);
			self.display.show_message(message);
		}
		self.notice = Some(Notice {
			until: Deadline::after(now, length),
			then,
		});
	}

	fn end_notice(&mut self, then: Option<FollowUp>, now: Millis) {
		self.notice = None;
		self.display.clear();
		self.display.set_point(false);
		self.display.set_brightness(self.config.idle_brightness);

		if let Some(follow_up) = then {
			self.start_notice(follow_up.message, follow_up.length, None, now);
		}
	}
}
