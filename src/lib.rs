#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod display;
pub mod error;
pub mod http;
pub mod link;
#[cfg(feature = "graphics")]
pub mod oled;
pub mod parser;
pub mod request;
pub mod scheduler;
pub mod store;
pub mod transport;
pub mod types;

pub use error::{GeolocationError, ScanError, TransportFault};
pub use scheduler::{AcquisitionScheduler, CycleOutcome, CycleReport};
pub use store::LocationStore;
pub use types::{AccessPointObservation, GeolocationResult, LocationState, MacAddress};
