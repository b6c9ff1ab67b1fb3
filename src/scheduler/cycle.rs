use embassy_time::{Duration, Timer};
use heapless::Vec;

use super::engine::AcquisitionEngine;
use super::events::CycleEvent;
use super::machine::AcquisitionPhase;
use crate::config::{GeolocatorConfig, LOGGED_ACCESS_POINTS_MAX, SCAN_RESULTS_MAX};
use crate::error::{GeolocationError, ScanError};
use crate::parser::parse_location;
use crate::request::build_request_body;
use crate::store::LocationStore;
use crate::transport::{GeolocationTransport, HttpConnector, ResponseBuffer};
use crate::types::{AccessPointObservation, GeolocationResult};

pub type ScanResults = Vec<AccessPointObservation, SCAN_RESULTS_MAX>;

#[allow(async_fn_in_trait)]
pub trait Connectivity {
    /// Resolves once the station has an address; immediately if it already does.
    async fn wait_connected(&mut self);
}

#[allow(async_fn_in_trait)]
pub trait AccessPointScanner {
    /// Fills `out` (already cleared) with the access points of one scan.
    async fn scan(&mut self, out: &mut ScanResults) -> Result<(), ScanError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CycleOutcome {
    Committed(GeolocationResult),
    NoAccessPoints,
    ScanFailed(ScanError),
    Failed(GeolocationError),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub sleep: Duration,
}

/// The single flow of control that drives acquisition cycles and the only
/// writer of the [`LocationStore`].
pub struct AcquisitionScheduler<'a, N, S, C> {
    engine: AcquisitionEngine,
    connectivity: N,
    scanner: S,
    transport: GeolocationTransport<'a, C>,
    api_key: &'a str,
    store: &'a LocationStore,
    scan_results: ScanResults,
    response: ResponseBuffer,
}

impl<'a, N, S, C> AcquisitionScheduler<'a, N, S, C>
where
    N: Connectivity,
    S: AccessPointScanner,
    C: HttpConnector,
{
    pub fn new(
        config: &GeolocatorConfig<'a>,
        connectivity: N,
        scanner: S,
        connector: C,
        store: &'a LocationStore,
    ) -> Self {
        Self {
            engine: AcquisitionEngine::new(config.update_interval()),
            connectivity,
            scanner,
            transport: GeolocationTransport::new(
                connector,
                config.provider_host,
                config.provider_port,
            ),
            api_key: config.api_key,
            store,
            scan_results: Vec::new(),
            response: ResponseBuffer::new(),
        }
    }

    pub fn phase(&self) -> AcquisitionPhase {
        self.engine.phase()
    }

    pub async fn run(mut self) -> ! {
        loop {
            let report = self.run_cycle().await;
            Timer::after(report.sleep).await;
        }
    }

    /// One acquisition cycle, ending in `Sleeping`. The caller owns the wait.
    pub async fn run_cycle(&mut self) -> CycleReport {
        if self.engine.phase() == AcquisitionPhase::Sleeping {
            self.advance(CycleEvent::Woke);
        }

        self.connectivity.wait_connected().await;
        self.advance(CycleEvent::Connected);

        let outcome = self.acquire().await;
        CycleReport {
            outcome,
            sleep: self.engine.sleep_duration(),
        }
    }

    async fn acquire(&mut self) -> CycleOutcome {
        self.scan_results.clear();
        log::info!("scheduler: starting wifi scan");
        if let Err(err) = self.scanner.scan(&mut self.scan_results).await {
            log::error!("scheduler: wifi scan failed: {}", err);
            self.advance(CycleEvent::ScanFailed);
            return CycleOutcome::ScanFailed(err);
        }

        let count = self.scan_results.len();
        log::info!("scheduler: found {} access points", count);
        for (idx, ap) in self
            .scan_results
            .iter()
            .take(LOGGED_ACCESS_POINTS_MAX)
            .enumerate()
        {
            log::info!(
                "scheduler: ap {} ssid={} rssi={} channel={} mac={}",
                idx,
                ap.ssid,
                ap.signal_strength,
                ap.channel,
                ap.mac_address
            );
        }

        self.advance(CycleEvent::ScanCompleted { count });
        if count == 0 {
            return CycleOutcome::NoAccessPoints;
        }

        match self.locate().await {
            Ok(result) => {
                self.store.commit(result);
                self.advance(CycleEvent::Committed);
                log::info!("scheduler: location updated successfully");
                CycleOutcome::Committed(result)
            }
            Err(err) => {
                // Keep whatever was committed before.
                log::error!("scheduler: failed to get location: {}", err);
                self.advance(CycleEvent::StageFailed);
                CycleOutcome::Failed(err)
            }
        }
    }

    async fn locate(&mut self) -> Result<GeolocationResult, GeolocationError> {
        let body = build_request_body(&self.scan_results)?;
        self.advance(CycleEvent::RequestBuilt);

        self.transport
            .exchange(self.api_key, body.as_bytes(), &mut self.response)
            .await?;
        self.advance(CycleEvent::ResponseReceived);

        let result = parse_location(self.response.as_bytes())?;
        self.advance(CycleEvent::LocationParsed);
        Ok(result)
    }

    fn advance(&mut self, event: CycleEvent) {
        let result = self.engine.apply(event);
        if !result.applied() {
            log::warn!(
                "scheduler: ignored {:?} in phase {}",
                event,
                result.before.as_str()
            );
        }
    }
}
