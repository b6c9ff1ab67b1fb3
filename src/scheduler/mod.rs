mod cycle;
mod engine;
mod events;
mod machine;
#[cfg(test)]
mod tests;

pub use cycle::{
    AccessPointScanner, AcquisitionScheduler, Connectivity, CycleOutcome, CycleReport,
    ScanResults,
};
pub use engine::{AcquisitionEngine, PhaseApplyResult, PhaseApplyStatus};
pub use events::CycleEvent;
pub use machine::AcquisitionPhase;
