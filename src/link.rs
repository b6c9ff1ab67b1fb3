/// Next step for the Wi-Fi task before it waits for a disconnect again.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LinkAction {
    Serve,
    Reconnect,
}

impl LinkAction {
    /// Decides from the controller's association query. A disconnect that
    /// fired while the task was busy leaves no event behind, so the query is
    /// the only record of it. A failed query counts as a lost link.
    pub fn from_association<E>(connected: Result<bool, E>) -> Self {
        match connected {
            Ok(true) => Self::Serve,
            Ok(false) | Err(_) => Self::Reconnect,
        }
    }
}
