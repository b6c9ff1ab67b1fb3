use embassy_time::Duration;
use statig::prelude::*;

use super::engine::PhaseApplyStatus;
use super::events::CycleEvent;
use crate::config::SCAN_RETRY_DELAY;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AcquisitionPhase {
    WaitingForConnectivity,
    Scanning,
    Building,
    Requesting,
    Parsing,
    Committing,
    Sleeping,
}

impl AcquisitionPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaitingForConnectivity => "waiting_for_connectivity",
            Self::Scanning => "scanning",
            Self::Building => "building",
            Self::Requesting => "requesting",
            Self::Parsing => "parsing",
            Self::Committing => "committing",
            Self::Sleeping => "sleeping",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct AcquisitionMachine {
    pub(super) phase: AcquisitionPhase,
    pub(super) interval: Duration,
    pub(super) sleep_for: Duration,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct DispatchContext {
    pub(super) status: PhaseApplyStatus,
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self {
            status: PhaseApplyStatus::InvalidTransition,
        }
    }
}

impl AcquisitionMachine {
    pub(super) fn new(interval: Duration) -> Self {
        Self {
            phase: AcquisitionPhase::WaitingForConnectivity,
            interval,
            sleep_for: interval,
        }
    }

    fn advance(&mut self, context: &mut DispatchContext, phase: AcquisitionPhase) {
        self.phase = phase;
        context.status = PhaseApplyStatus::Applied;
    }

    fn fall_asleep(&mut self, context: &mut DispatchContext, delay: Duration) {
        self.sleep_for = delay;
        self.advance(context, AcquisitionPhase::Sleeping);
    }
}

#[state_machine(initial = "State::waiting_for_connectivity()")]
impl AcquisitionMachine {
    #[state]
    fn waiting_for_connectivity(
        &mut self,
        context: &mut DispatchContext,
        event: &CycleEvent,
    ) -> Outcome<State> {
        match event {
            CycleEvent::Connected => {
                self.advance(context, AcquisitionPhase::Scanning);
                Transition(State::scanning())
            }
            _ => Handled,
        }
    }

    #[state]
    fn scanning(&mut self, context: &mut DispatchContext, event: &CycleEvent) -> Outcome<State> {
        match event {
            CycleEvent::ScanCompleted { count: 0 } => {
                self.fall_asleep(context, self.interval);
                Transition(State::sleeping())
            }
            CycleEvent::ScanCompleted { .. } => {
                self.advance(context, AcquisitionPhase::Building);
                Transition(State::building())
            }
            CycleEvent::ScanFailed => {
                self.fall_asleep(context, SCAN_RETRY_DELAY);
                Transition(State::sleeping())
            }
            _ => Handled,
        }
    }

    #[state]
    fn building(&mut self, context: &mut DispatchContext, event: &CycleEvent) -> Outcome<State> {
        match event {
            CycleEvent::RequestBuilt => {
                self.advance(context, AcquisitionPhase::Requesting);
                Transition(State::requesting())
            }
            CycleEvent::StageFailed => {
                self.fall_asleep(context, self.interval);
                Transition(State::sleeping())
            }
            _ => Handled,
        }
    }

    #[state]
    fn requesting(&mut self, context: &mut DispatchContext, event: &CycleEvent) -> Outcome<State> {
        match event {
            CycleEvent::ResponseReceived => {
                self.advance(context, AcquisitionPhase::Parsing);
                Transition(State::parsing())
            }
            CycleEvent::StageFailed => {
                self.fall_asleep(context, self.interval);
                Transition(State::sleeping())
            }
            _ => Handled,
        }
    }

    #[state]
    fn parsing(&mut self, context: &mut DispatchContext, event: &CycleEvent) -> Outcome<State> {
        match event {
            CycleEvent::LocationParsed => {
                self.advance(context, AcquisitionPhase::Committing);
                Transition(State::committing())
            }
            CycleEvent::StageFailed => {
                self.fall_asleep(context, self.interval);
                Transition(State::sleeping())
            }
            _ => Handled,
        }
    }

    #[state]
    fn committing(&mut self, context: &mut DispatchContext, event: &CycleEvent) -> Outcome<State> {
        match event {
            CycleEvent::Committed => {
                self.fall_asleep(context, self.interval);
                Transition(State::sleeping())
            }
            _ => Handled,
        }
    }

    #[state]
    fn sleeping(&mut self, context: &mut DispatchContext, event: &CycleEvent) -> Outcome<State> {
        match event {
            CycleEvent::Woke => {
                self.advance(context, AcquisitionPhase::WaitingForConnectivity);
                Transition(State::waiting_for_connectivity())
            }
            _ => Handled,
        }
    }
}
