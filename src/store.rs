use core::cell::Cell;

use embassy_sync::{
    blocking_mutex::{raw::CriticalSectionRawMutex, Mutex},
    signal::Signal,
};

use crate::types::{GeolocationResult, LocationState};

/// Last committed location plus the "location updated" notification.
///
/// Written only by the acquisition scheduler; readers always get a whole
/// `(current, valid)` pair from a single commit.
pub struct LocationStore {
    state: Mutex<CriticalSectionRawMutex, Cell<LocationState>>,
    updates: Signal<CriticalSectionRawMutex, GeolocationResult>,
}

impl LocationStore {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(LocationState::empty())),
            updates: Signal::new(),
        }
    }

    pub fn read(&self) -> LocationState {
        self.state.lock(Cell::get)
    }

    pub(crate) fn commit(&self, result: GeolocationResult) {
        self.state
            .lock(|state| state.set(LocationState::committed(result)));
        self.updates.signal(result);
    }

    /// Waits for the next commit. A commit that happened while nobody was
    /// waiting is delivered once.
    pub async fn wait_updated(&self) -> GeolocationResult {
        self.updates.wait().await
    }

    pub fn take_update(&self) -> Option<GeolocationResult> {
        self.updates.try_take()
    }
}

impl Default for LocationStore {
    fn default() -> Self {
        Self::new()
    }
}
