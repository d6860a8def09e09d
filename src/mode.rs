//! Controller modes and the transitions between them
//!
//! Transitions are a pure function of the current mode and an event. The side effects are
//! returned as an [`Action`] for the [`crate::system::System`] to carry out.

use ufmt::derive::uDebug;

use crate::{
	button::Gesture,
	clock::Schedule,
	config::SettingsFlow,
	watering::Duration,
};

/// Controller mode
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
	/// Waiting for the schedule or a button press. Initial mode.
	Idle,
	/// The pump is running
	Watering,
	/// Setting the watering duration (and the schedule in the combined flow)
	SettingsDuration,
	/// Setting the daily watering time
	SettingsSchedule,
	/// Setting the wall-clock time
	SettingsClock,
}

/// Something which can move the controller to another mode
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Event {
	/// Short button press
	Click,
	/// Long button press
	Held,
	/// The schedule check found that it is time to water
	ScheduleDue,
	/// Watering ended, either because the time ran out or because there was no water
	Finished,
}

impl From<Gesture> for Event {
	fn from(gesture: Gesture) -> Self {
		match gesture {
			Gesture::Click => Self::Click,
			Gesture::Held => Self::Held,
		}
	}
}

/// Side effect of a transition
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
	/// Nothing to do
	None,
	/// Start the pump
	StartWatering,
	/// Watering is over, return the display to idle
	StopWatering,
	/// Start calibrating the duration
	EnterDuration,
	/// Start calibrating the schedule
	EnterSchedule,
	/// Start calibrating the clock
	EnterClock,
	/// Save the staged duration (and schedule, in the combined flow)
	CommitDuration,
	/// Save the staged schedule
	CommitSchedule,
	/// Set the clock to the staged time
	CommitClock,
	/// Leave the settings without saving
	Cancel,
}

/// Mode, schedule and duration of the controller
///
/// The schedule and duration only ever change through a commit.
#[derive(uDebug, Clone, Copy, PartialEq, Eq, Debug)]
pub struct ControllerState {
	pub mode: Mode,
	pub schedule: Schedule,
	pub duration: Duration,
}

impl ControllerState {
	/// Create a new [`ControllerState`] in [`Mode::Idle`]
	pub fn new(schedule: Schedule, duration: Duration) -> Self {
		Self {
			mode: Mode::Idle,
			schedule,
			duration,
		}
	}
}

/// The next mode and the action to take for an `event` in `mode`
///
/// Events a mode doesn't handle leave the mode unchanged with [`Action::None`].
pub fn transition(mode: Mode, event: Event, flow: SettingsFlow) -> (Mode, Action) {
	match (mode, event) {
		(Mode::Idle, Event::ScheduleDue) | (Mode::Idle, Event::Click) => {
			(Mode::Watering, Action::StartWatering)
		}
		(Mode::Idle, Event::Held) => (Mode::SettingsDuration, Action::EnterDuration),

		(Mode::Watering, Event::Finished) => (Mode::Idle, Action::StopWatering),

		(Mode::SettingsDuration, Event::Click) => match flow {
			SettingsFlow::Nested => (Mode::SettingsSchedule, Action::EnterSchedule),
			SettingsFlow::Combined => (Mode::SettingsDuration, Action::None),
		},
		(Mode::SettingsDuration, Event::Held) => (Mode::Idle, Action::CommitDuration),

		(Mode::SettingsSchedule, Event::Click) => (Mode::SettingsClock, Action::EnterClock),
		(Mode::SettingsSchedule, Event::Held) => (Mode::Idle, Action::CommitSchedule),

		(Mode::SettingsClock, Event::Click) => (Mode::Idle, Action::Cancel),
		(Mode::SettingsClock, Event::Held) => (Mode::Idle, Action::CommitClock),

		(mode, _) => (mode, Action::None),
	}
}
