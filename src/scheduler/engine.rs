use embassy_time::Duration;
use statig::blocking::IntoStateMachineExt as _;

use super::events::CycleEvent;
use super::machine::{AcquisitionMachine, AcquisitionPhase, DispatchContext};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PhaseApplyStatus {
    Applied,
    InvalidTransition,
}

#[derive(Clone, Copy, Debug)]
pub struct PhaseApplyResult {
    pub before: AcquisitionPhase,
    pub after: AcquisitionPhase,
    pub status: PhaseApplyStatus,
}

impl PhaseApplyResult {
    pub fn applied(self) -> bool {
        matches!(self.status, PhaseApplyStatus::Applied)
    }
}

/// Phase bookkeeping for the acquisition loop.
pub struct AcquisitionEngine {
    machine: statig::blocking::StateMachine<AcquisitionMachine>,
}

impl AcquisitionEngine {
    pub fn new(interval: Duration) -> Self {
        Self {
            machine: AcquisitionMachine::new(interval).state_machine(),
        }
    }

    pub fn phase(&self) -> AcquisitionPhase {
        self.machine.inner().phase
    }

    /// Delay chosen when the machine last entered `Sleeping`.
    pub fn sleep_duration(&self) -> Duration {
        self.machine.inner().sleep_for
    }

    pub fn apply(&mut self, event: CycleEvent) -> PhaseApplyResult {
        let before = self.phase();
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        PhaseApplyResult {
            before,
            after: self.phase(),
            status: context.status,
        }
    }
}
