/// What the acquisition task reports back to the phase machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CycleEvent {
    Connected,
    ScanCompleted { count: usize },
    ScanFailed,
    RequestBuilt,
    ResponseReceived,
    LocationParsed,
    Committed,
    /// Building, requesting or parsing failed.
    StageFailed,
    Woke,
}
