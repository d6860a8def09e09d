//! End-to-end runs of the controller against fake hardware

use std::{
	cell::{Cell, RefCell},
	convert::Infallible,
	rc::Rc,
};

use embedded_hal::digital::v2::{InputPin, OutputPin};
use plant_waterer::{
	button::{Button, Gesture},
	calibration::{Knob, Knobs},
	clock::{ClockTime, DateTime, Rtc, Schedule},
	config::{Config, SettingsFlow},
	display::{Display, Message},
	mode::Mode,
	store::Store,
	system::{System, SystemPeripherals},
	timer::Millis,
};

/// Resolution of the simulated main loop
const STEP: Millis = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shown {
	Number(u16),
	Clock(u8, u8),
	Message(Message),
	Clear,
}

/// Everything the controller is wired to, shared with the test
#[derive(Clone)]
struct Hardware {
	shown: Rc<RefCell<Vec<Shown>>>,
	point: Rc<Cell<bool>>,
	point_changes: Rc<Cell<usize>>,
	brightness: Rc<Cell<u8>>,
	clock: Rc<Cell<Option<DateTime>>>,
	stopped: Rc<Cell<bool>>,
	memory: Rc<RefCell<[u8; 16]>>,
	writes: Rc<Cell<usize>>,
	/// Pump relay level, high is off
	pump: Rc<Cell<bool>>,
	/// Water switch level, high means there is water
	water: Rc<Cell<bool>>,
	left: Rc<Cell<u16>>,
	right: Rc<Cell<u16>>,
	log: Rc<RefCell<String>>,
}

impl Hardware {
	fn new(clock: Option<DateTime>) -> Self {
		Self {
			shown: Rc::new(RefCell::new(Vec::new())),
			point: Rc::new(Cell::new(false)),
			point_changes: Rc::new(Cell::new(0)),
			brightness: Rc::new(Cell::new(0)),
			clock: Rc::new(Cell::new(clock)),
			stopped: Rc::new(Cell::new(false)),
			memory: Rc::new(RefCell::new([0xff; 16])),
			writes: Rc::new(Cell::new(0)),
			pump: Rc::new(Cell::new(true)),
			water: Rc::new(Cell::new(true)),
			left: Rc::new(Cell::new(0)),
			right: Rc::new(Cell::new(0)),
			log: Rc::new(RefCell::new(String::new())),
		}
	}

	fn count(&self, message: Message) -> usize {
		self.shown
			.borrow()
			.iter()
			.filter(|shown| **shown == Shown::Message(message))
			.count()
	}

	fn numbers(&self) -> Vec<u16> {
		self.shown
			.borrow()
			.iter()
			.filter_map(|shown| match shown {
				Shown::Number(value) => Some(*value),
				_ => None,
			})
			.collect()
	}

	fn last_shown(&self) -> Option<Shown> {
		self.shown.borrow().last().copied()
	}

	fn forget_shown(&self) {
		self.shown.borrow_mut().clear();
	}
}

struct FakeDisplay(Hardware);

impl Display for FakeDisplay {
	fn show_number(&mut self, value: u16) {
		self.0.shown.borrow_mut().push(Shown::Number(value));
	}

	fn show_clock(&mut self, hour: u8, minute: u8) {
		self.0.shown.borrow_mut().push(Shown::Clock(hour, minute));
	}

	fn show_message(&mut self, message: Message) {
		self.0.shown.borrow_mut().push(Shown::Message(message));
	}

	fn set_brightness(&mut self, level: u8) {
		self.0.brightness.set(level);
	}

	fn set_point(&mut self, on: bool) {
		if self.0.point.get() != on {
			self.0.point_changes.set(self.0.point_changes.get() + 1);
		}
		self.0.point.set(on);
	}

	fn clear(&mut self) {
		self.0.shown.borrow_mut().push(Shown::Clear);
	}
}

/// A DS3231 whose time stands still unless the test moves it
struct FakeRtc(Hardware);

impl Rtc for FakeRtc {
	type Error = ();

	fn datetime(&mut self) -> Result<DateTime, Self::Error> {
		self.0.clock.get().ok_or(())
	}

	fn set_datetime(&mut self, datetime: &DateTime) -> Result<(), Self::Error> {
		self.0.clock.get().ok_or(())?;
		self.0.clock.set(Some(*datetime));
		self.0.stopped.set(false);
		Ok(())
	}

	fn lost_power(&mut self) -> Result<bool, Self::Error> {
		self.0.clock.get().ok_or(())?;
		Ok(self.0.stopped.get())
	}
}

struct FakeEeprom(Hardware);

impl Store for FakeEeprom {
	type Error = ();

	fn read(&mut self, address: u16) -> Result<u8, Self::Error> {
		self.0.memory.borrow().get(address as usize).copied().ok_or(())
	}

	fn write(&mut self, address: u16, value: u8) -> Result<(), Self::Error> {
		let mut memory = self.0.memory.borrow_mut();
		let cell = memory.get_mut(address as usize).ok_or(())?;
		*cell = value;
		self.0.writes.set(self.0.writes.get() + 1);
		Ok(())
	}
}

struct FakePin(Rc<Cell<bool>>);

impl OutputPin for FakePin {
	type Error = Infallible;

	fn set_low(&mut self) -> Result<(), Self::Error> {
		self.0.set(false);
		Ok(())
	}

	fn set_high(&mut self) -> Result<(), Self::Error> {
		self.0.set(true);
		Ok(())
	}
}

impl InputPin for FakePin {
	type Error = Infallible;

	fn is_high(&self) -> Result<bool, Self::Error> {
		Ok(self.0.get())
	}

	fn is_low(&self) -> Result<bool, Self::Error> {
		Ok(!self.0.get())
	}
}

struct FakeKnobs(Hardware);

impl Knobs for FakeKnobs {
	fn read(&mut self, knob: Knob) -> u16 {
		match knob {
			Knob::Left => self.0.left.get(),
			Knob::Right => self.0.right.get(),
		}
	}
}

struct Log(Hardware);

impl ufmt::uWrite for Log {
	type Error = Infallible;

	fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
		self.0.log.borrow_mut().push_str(s);
		Ok(())
	}
}

type Controller = System<FakeDisplay, FakeRtc, FakeEeprom, FakePin, FakePin, FakeKnobs, Log>;

/// A booted controller and the main loop driving it
struct Rig {
	system: Controller,
	hw: Hardware,
	now: Millis,
	/// Start and end of every pump run
	runs: Vec<(Millis, Option<Millis>)>,
}

impl Rig {
	fn boot(config: Config, hw: Hardware) -> Self {
		let peripherals = SystemPeripherals::new(
			FakePin(hw.pump.clone()),
			FakePin(hw.water.clone()),
			FakeKnobs(hw.clone()),
		);
		let mut system = System::new(
			config,
			FakeDisplay(hw.clone()),
			FakeRtc(hw.clone()),
			FakeEeprom(hw.clone()),
			peripherals,
			Log(hw.clone()),
		);
		system.init(0);

		let mut rig = Self {
			system,
			hw,
			now: 0,
			runs: Vec::new(),
		};
		rig.observe_pump();
		rig
	}

	fn step(&mut self, gesture: Option<Gesture>) {
		self.system.tick(self.now, gesture);
		self.observe_pump();
	}

	fn observe_pump(&mut self) {
		let on = !self.hw.pump.get();
		let open = matches!(self.runs.last(), Some((_, None)));
		if on && !open {
			self.runs.push((self.now, None));
		} else if !on && open {
			if let Some(run) = self.runs.last_mut() {
				run.1 = Some(self.now);
			}
		}
	}

	/// Run the main loop for `ms` milliseconds without touching the button
	fn advance(&mut self, ms: Millis) {
		let end = self.now + ms;
		while self.now < end {
			self.now += STEP;
			self.step(None);
		}
	}

	fn press(&mut self, gesture: Gesture) {
		self.step(Some(gesture));
	}

	fn mode(&self) -> Mode {
		self.system.state().mode
	}

	fn pump_is_on(&self) -> bool {
		!self.hw.pump.get()
	}

	/// Run the main loop until all notices and pauses are over
	fn settle(&mut self) {
		let mut waited = 0;
		while self.system.is_showing_notice() && waited < 10_000 {
			self.advance(STEP);
			waited += STEP;
		}
	}
}

fn at(hour: u8, minute: u8, second: u8) -> DateTime {
	DateTime {
		year: 2024,
		month: 5,
		day: 1,
		time: ClockTime::new(hour, minute, second),
	}
}

fn nested() -> Config {
	Config::new()
}

fn combined() -> Config {
	let mut config = Config::new();
	config.flow = SettingsFlow::Combined;
	config
}

#[test]
fn committed_duration_controls_the_next_run() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	hw.left.set(512);
	let mut rig = Rig::boot(nested(), hw.clone());

	rig.press(Gesture::Held);
	assert_eq!(rig.mode(), Mode::SettingsDuration);
	assert_eq!(hw.last_shown(), Some(Shown::Message(Message::SetDuration)));

	rig.advance(100);
	rig.press(Gesture::Held);
	assert_eq!(rig.mode(), Mode::Idle);
	assert_eq!(rig.system.state().duration.seconds(), 30);
	assert_eq!(hw.memory.borrow()[7], 30);
	assert_eq!(hw.count(Message::Saved), 1);

	rig.settle();
	hw.forget_shown();

	rig.press(Gesture::Click);
	assert_eq!(rig.mode(), Mode::Watering);
	assert!(rig.pump_is_on());
	let started = rig.now;

	rig.advance(31_000);
	assert_eq!(rig.mode(), Mode::Idle);
	assert!(!rig.pump_is_on());
	assert_eq!(rig.runs, vec![(started, Some(started + 30_000))]);
	assert_eq!(hw.numbers(), (1..=30).rev().collect::<Vec<u16>>());
	assert_eq!(hw.brightness.get(), Config::new().idle_brightness);
}

#[test]
fn settings_survive_a_reboot() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	hw.left.set(1023);
	let mut rig = Rig::boot(nested(), hw.clone());

	rig.press(Gesture::Held);
	rig.press(Gesture::Held);
	rig.settle();
	assert_eq!(rig.system.state().duration.seconds(), 60);

	let rebooted = Rig::boot(nested(), hw.clone());
	assert_eq!(rebooted.system.state().duration.seconds(), 60);
	assert_eq!(rebooted.system.state().schedule, Schedule::default());
}

#[test]
fn blank_memory_boots_with_defaults() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	let rig = Rig::boot(nested(), hw.clone());

	let state = rig.system.state();
	assert_eq!(state.mode, Mode::Idle);
	assert_eq!(state.schedule, Schedule::default());
	assert_eq!(state.duration.seconds(), 2);
	assert_eq!(hw.writes.get(), 0);
	assert!(!rig.pump_is_on());
}

#[test]
fn empty_tank_refuses_to_water() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	hw.water.set(false);
	let mut rig = Rig::boot(nested(), hw.clone());

	rig.press(Gesture::Click);
	assert_eq!(rig.mode(), Mode::Idle);
	assert!(rig.system.is_showing_notice());
	assert_eq!(hw.last_shown(), Some(Shown::Message(Message::NoWater)));

	// Presses during the notice are dropped.
	rig.advance(500);
	rig.press(Gesture::Click);
	rig.press(Gesture::Held);
	assert_eq!(rig.mode(), Mode::Idle);

	rig.settle();
	assert_eq!(hw.count(Message::NoWater), 1);
	assert!(rig.runs.is_empty());
	assert!(hw.log.borrow().contains("No water"));
}

#[test]
fn schedule_fires_only_in_its_minute() {
	let hw = Hardware::new(Some(at(7, 31, 0)));
	{
		let mut memory = hw.memory.borrow_mut();
		memory[3] = 7;
		memory[5] = 30;
		memory[7] = 5;
	}
	let mut rig = Rig::boot(nested(), hw.clone());
	assert_eq!(rig.system.state().schedule, Schedule { hour: 7, minute: 30 });

	rig.advance(40_000);
	assert!(rig.runs.is_empty());

	hw.clock.set(Some(at(7, 30, 10)));
	rig.advance(40_000);
	assert_eq!(rig.runs.len(), 1);
	let (start, end) = rig.runs[0];
	assert_eq!(end, Some(start + 5_000));
	assert_eq!(rig.mode(), Mode::Idle);

	// Still the same minute on the next check.
	hw.clock.set(Some(at(7, 30, 50)));
	rig.advance(40_000);
	assert_eq!(rig.runs.len(), 1);

	hw.clock.set(Some(at(7, 31, 20)));
	rig.advance(40_000);
	hw.clock.set(Some(DateTime { day: 2, ..at(7, 30, 5) }));
	rig.advance(40_000);
	assert_eq!(rig.runs.len(), 2);
}

#[test]
fn schedule_waits_while_in_settings() {
	let hw = Hardware::new(Some(at(7, 29, 50)));
	{
		let mut memory = hw.memory.borrow_mut();
		memory[3] = 7;
		memory[5] = 30;
	}
	// 10 seconds on the duration knob
	hw.left.set(170);
	let mut rig = Rig::boot(nested(), hw.clone());

	rig.press(Gesture::Held);
	assert_eq!(rig.mode(), Mode::SettingsDuration);

	hw.clock.set(Some(at(7, 30, 30)));
	rig.advance(40_000);
	assert_eq!(rig.mode(), Mode::SettingsDuration);
	assert!(rig.runs.is_empty());

	rig.press(Gesture::Held);
	assert_eq!(rig.system.state().duration.seconds(), 10);
	rig.settle();

	// The first check after returning to idle is overdue and fires at once.
	rig.advance(STEP);
	assert_eq!(rig.mode(), Mode::Watering);
	assert_eq!(rig.runs.len(), 1);
	assert_eq!(hw.clock.get().map(|datetime| datetime.time.minute), Some(30));

	rig.advance(11_000);
	let (start, end) = rig.runs[0];
	assert_eq!(end, Some(start + 10_000));
}

#[test]
fn button_presses_are_ignored_while_watering() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	let mut rig = Rig::boot(nested(), hw.clone());

	rig.press(Gesture::Click);
	rig.advance(500);
	rig.press(Gesture::Held);
	rig.press(Gesture::Click);
	assert_eq!(rig.mode(), Mode::Watering);

	rig.advance(2_000);
	assert_eq!(rig.mode(), Mode::Idle);
	assert_eq!(rig.runs.len(), 1);
}

#[test]
fn nested_flow_commits_the_schedule() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	hw.left.set(320);
	hw.right.set(512);
	let mut rig = Rig::boot(nested(), hw.clone());

	rig.press(Gesture::Held);
	rig.advance(100);
	rig.press(Gesture::Click);
	assert_eq!(rig.mode(), Mode::SettingsSchedule);
	assert_eq!(hw.last_shown(), Some(Shown::Message(Message::SetSchedule)));

	// Small wobbles stay below the threshold.
	hw.left.set(330);
	rig.advance(100);
	assert_eq!(hw.last_shown(), Some(Shown::Message(Message::SetSchedule)));

	hw.left.set(600);
	rig.advance(100);
	assert_eq!(hw.last_shown(), Some(Shown::Clock(14, 30)));

	// No blinking while setting the schedule.
	let changes = hw.point_changes.get();
	rig.advance(1_100);
	assert_eq!(hw.point_changes.get(), changes);
	assert!(hw.point.get());

	rig.press(Gesture::Held);
	assert_eq!(rig.mode(), Mode::Idle);
	assert_eq!(rig.system.state().schedule, Schedule { hour: 14, minute: 30 });
	assert_eq!(rig.system.state().duration.seconds(), 2);
	let memory = *hw.memory.borrow();
	assert_eq!((memory[3], memory[5], memory[7]), (14, 30, 0xff));
}

#[test]
fn nested_flow_sets_the_clock() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	let mut rig = Rig::boot(nested(), hw.clone());

	rig.press(Gesture::Held);
	rig.press(Gesture::Click);
	rig.press(Gesture::Click);
	assert_eq!(rig.mode(), Mode::SettingsClock);
	assert_eq!(hw.last_shown(), Some(Shown::Message(Message::SetTime)));

	let changes = hw.point_changes.get();
	rig.advance(1_050);
	assert!(hw.point_changes.get() >= changes + 2);

	hw.left.set(100);
	hw.right.set(900);
	rig.advance(20);
	assert_eq!(hw.last_shown(), Some(Shown::Clock(2, 52)));

	rig.press(Gesture::Held);
	assert_eq!(rig.mode(), Mode::Idle);
	assert_eq!(hw.clock.get(), Some(at(2, 52, 0)));
	assert_eq!(rig.system.state().schedule, Schedule::default());
	assert_eq!(hw.count(Message::Saved), 1);

	rig.settle();
	assert!(!hw.point.get());
	assert_eq!(hw.brightness.get(), Config::new().idle_brightness);
}

#[test]
fn clicking_through_the_clock_discards_everything() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	let mut rig = Rig::boot(nested(), hw.clone());

	rig.press(Gesture::Held);
	hw.left.set(900);
	hw.right.set(900);
	rig.advance(100);
	rig.press(Gesture::Click);
	rig.advance(100);
	rig.press(Gesture::Click);
	rig.advance(100);
	rig.press(Gesture::Click);
	assert_eq!(rig.mode(), Mode::Idle);

	rig.settle();
	assert_eq!(hw.count(Message::Saved), 0);
	assert_eq!(hw.writes.get(), 0);
	assert_eq!(hw.clock.get(), Some(at(12, 0, 0)));
	assert_eq!(rig.system.state().duration.seconds(), 2);
}

#[test]
fn combined_flow_sets_duration_and_schedule_together() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	hw.left.set(512);
	hw.right.set(320);
	let mut rig = Rig::boot(combined(), hw.clone());

	rig.press(Gesture::Held);
	assert_eq!(rig.mode(), Mode::SettingsDuration);

	rig.press(Gesture::Click);
	assert_eq!(rig.mode(), Mode::SettingsDuration);

	hw.right.set(640);
	rig.advance(100);
	assert_eq!(hw.last_shown(), Some(Shown::Clock(15, 0)));

	rig.press(Gesture::Held);
	assert_eq!(rig.mode(), Mode::Idle);
	let state = rig.system.state();
	assert_eq!(state.duration.seconds(), 30);
	assert_eq!(state.schedule, Schedule { hour: 15, minute: 0 });
	let memory = *hw.memory.borrow();
	assert_eq!((memory[3], memory[5], memory[7]), (15, 0, 30));
}

#[test]
fn saved_notice_is_followed_by_a_pause() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	let mut rig = Rig::boot(nested(), hw.clone());

	rig.press(Gesture::Held);
	rig.press(Gesture::Held);
	assert!(rig.system.is_showing_notice());

	rig.advance(1_000);
	assert!(rig.system.is_showing_notice());
	assert_eq!(hw.last_shown(), Some(Shown::Clear));

	rig.press(Gesture::Click);
	rig.advance(300);
	assert!(!rig.system.is_showing_notice());
	assert!(rig.runs.is_empty());
}

#[test]
fn missing_clock_is_reported_at_boot() {
	let hw = Hardware::new(None);
	let mut rig = Rig::boot(nested(), hw.clone());

	assert_eq!(hw.last_shown(), Some(Shown::Message(Message::NoClock)));
	assert_eq!(hw.count(Message::LowBattery), 0);
	assert!(hw.log.borrow().contains("DS3231 not found"));

	rig.press(Gesture::Click);
	assert!(rig.runs.is_empty());

	rig.settle();
	rig.press(Gesture::Click);
	rig.advance(3_000);
	assert_eq!(rig.runs.len(), 1);
	let (start, end) = rig.runs[0];
	assert_eq!(end, Some(start + 2_000));
}

#[test]
fn clock_which_lost_power_is_reseeded() {
	let hw = Hardware::new(Some(at(0, 0, 5)));
	hw.stopped.set(true);
	let mut rig = Rig::boot(nested(), hw.clone());

	assert_eq!(hw.last_shown(), Some(Shown::Message(Message::LowBattery)));
	assert_eq!(hw.clock.get(), Some(DateTime::build()));
	assert!(!hw.stopped.get());

	rig.settle();
	assert_eq!(rig.mode(), Mode::Idle);
	assert_eq!(hw.count(Message::NoClock), 0);
}

#[test]
fn debounced_button_drives_the_settings() {
	let hw = Hardware::new(Some(at(12, 0, 0)));
	let mut rig = Rig::boot(nested(), hw.clone());
	let config = Config::new();
	let level = Rc::new(Cell::new(true));
	let mut button = Button::new(FakePin(level.clone()), config.debounce_ms, config.hold_ms);

	let mut drive = |rig: &mut Rig, pressed: bool, ms: Millis| {
		level.set(!pressed);
		let end = rig.now + ms;
		while rig.now < end {
			rig.now += STEP;
			let gesture = button.update(rig.now);
			rig.step(gesture);
		}
	};

	drive(&mut rig, true, 800);
	assert_eq!(rig.mode(), Mode::SettingsDuration);
	drive(&mut rig, false, 200);
	assert_eq!(rig.mode(), Mode::SettingsDuration);

	drive(&mut rig, true, 150);
	drive(&mut rig, false, 200);
	assert_eq!(rig.mode(), Mode::SettingsSchedule);

	// A bounce shorter than the debounce time is not a click.
	drive(&mut rig, true, 20);
	drive(&mut rig, false, 200);
	assert_eq!(rig.mode(), Mode::SettingsSchedule);
}
