use core::cell::{Cell, RefCell};
use core::future::{poll_fn, Future};
use core::pin::pin;
use core::task::{Context, Poll, Waker};
use std::vec::Vec;

use embassy_futures::block_on;
use embassy_time::Duration;

use super::*;
use crate::config::{GeolocatorConfig, SCAN_RETRY_DELAY};
use crate::error::{GeolocationError, ScanError, TransportFault};
use crate::store::LocationStore;
use crate::transport::{Endpoint, HttpConnection, HttpConnector, HttpRequest, ResponseBuffer};
use crate::types::{AccessPointObservation, GeolocationResult};

const OK_BODY: &[u8] =
    b"{\n  \"location\": {\n    \"lat\": 37.4219983,\n    \"lng\": -122.084\n  },\n  \"accuracy\": 20.0\n}";

fn config() -> GeolocatorConfig<'static> {
    GeolocatorConfig::from_parts(
        Some("home"),
        Some("secret"),
        Some("k3y"),
        None,
        None,
        Some("30"),
    )
    .unwrap()
}

#[derive(Default)]
struct ReadyNetwork {
    waits: Cell<u32>,
}

impl Connectivity for &ReadyNetwork {
    async fn wait_connected(&mut self) {
        self.waits.set(self.waits.get() + 1);
    }
}

/// Link that stays down until the test opens it.
#[derive(Default)]
struct Gate {
    open: Cell<bool>,
    polls: Cell<u32>,
}

impl Connectivity for &Gate {
    async fn wait_connected(&mut self) {
        let gate = *self;
        poll_fn(|_| {
            gate.polls.set(gate.polls.get() + 1);
            if gate.open.get() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }
}

struct ScriptedScanner {
    scans: RefCell<Vec<Result<Vec<AccessPointObservation>, ScanError>>>,
}

impl ScriptedScanner {
    fn new(scans: Vec<Result<Vec<AccessPointObservation>, ScanError>>) -> Self {
        Self {
            scans: RefCell::new(scans),
        }
    }
}

impl AccessPointScanner for &ScriptedScanner {
    async fn scan(&mut self, out: &mut ScanResults) -> Result<(), ScanError> {
        let next = self.scans.borrow_mut().remove(0)?;
        for ap in next {
            if out.push(ap).is_err() {
                break;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct FakeProvider {
    replies: RefCell<Vec<(u16, Vec<u8>)>>,
    requests: RefCell<Vec<Vec<u8>>>,
    opened: Cell<u32>,
    closed: Cell<u32>,
}

impl FakeProvider {
    fn replying(replies: &[(u16, &[u8])]) -> Self {
        Self {
            replies: RefCell::new(
                replies
                    .iter()
                    .map(|(status, body)| (*status, body.to_vec()))
                    .collect(),
            ),
            ..Self::default()
        }
    }
}

struct FakeExchange<'p> {
    provider: &'p FakeProvider,
}

impl<'p> HttpConnector for &'p FakeProvider {
    type Connection<'c>
        = FakeExchange<'p>
    where
        Self: 'c;

    async fn connect(
        &mut self,
        _endpoint: &Endpoint<'_>,
    ) -> Result<Self::Connection<'_>, TransportFault> {
        self.opened.set(self.opened.get() + 1);
        Ok(FakeExchange { provider: *self })
    }
}

impl HttpConnection for FakeExchange<'_> {
    async fn post(
        &mut self,
        request: &HttpRequest<'_>,
        sink: &mut ResponseBuffer,
    ) -> Result<u16, TransportFault> {
        self.provider.requests.borrow_mut().push(request.body.to_vec());
        let (status, body) = self.provider.replies.borrow_mut().remove(0);
        for chunk in body.chunks(256) {
            sink.append(chunk);
        }
        Ok(status)
    }

    async fn close(self) {
        self.provider.closed.set(self.provider.closed.get() + 1);
    }
}

fn aps(count: u8) -> Vec<AccessPointObservation> {
    (0..count)
        .map(|idx| {
            AccessPointObservation::new([0x24, 0xa4, 0x3c, 0, 0, idx], -40 - idx as i8, 1 + idx % 13)
        })
        .collect()
}

#[test]
fn successful_cycle_commits_and_notifies_once() {
    let network = ReadyNetwork::default();
    let scanner = ScriptedScanner::new(std::vec![Ok(aps(3))]);
    let provider = FakeProvider::replying(&[(200, OK_BODY)]);
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &network, &scanner, &provider, &store);

    let report = block_on(scheduler.run_cycle());

    let expected = GeolocationResult {
        latitude: 37.4219983,
        longitude: -122.084,
        accuracy: 20.0,
    };
    assert_eq!(report.outcome, CycleOutcome::Committed(expected));
    assert_eq!(report.sleep, Duration::from_secs(30));
    assert_eq!(scheduler.phase(), AcquisitionPhase::Sleeping);
    assert_eq!(store.read().location(), Some(expected));
    assert_eq!(store.take_update(), Some(expected));
    assert_eq!(store.take_update(), None);
    assert_eq!(provider.opened.get(), 1);
    assert_eq!(provider.closed.get(), 1);
    assert_eq!(network.waits.get(), 1);
}

#[test]
fn nothing_runs_until_the_network_is_up() {
    let gate = Gate::default();
    let scanner = ScriptedScanner::new(std::vec![Ok(aps(2))]);
    let provider = FakeProvider::replying(&[(200, OK_BODY)]);
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &gate, &scanner, &provider, &store);
    assert_eq!(scheduler.phase(), AcquisitionPhase::WaitingForConnectivity);

    {
        let mut cycle = pin!(scheduler.run_cycle());
        let mut cx = Context::from_waker(Waker::noop());
        for _ in 0..3 {
            assert!(cycle.as_mut().poll(&mut cx).is_pending());
        }
        assert_eq!(gate.polls.get(), 3);
        assert_eq!(scanner.scans.borrow().len(), 1);
        assert_eq!(provider.opened.get(), 0);
        assert!(provider.requests.borrow().is_empty());
        assert_eq!(store.take_update(), None);

        gate.open.set(true);
        let report = block_on(cycle);
        assert!(matches!(report.outcome, CycleOutcome::Committed(_)));
    }

    assert_eq!(scheduler.phase(), AcquisitionPhase::Sleeping);
    assert_eq!(scanner.scans.borrow().len(), 0);
    assert_eq!(provider.opened.get(), 1);
}

#[test]
fn empty_scan_skips_the_provider() {
    let network = ReadyNetwork::default();
    let scanner = ScriptedScanner::new(std::vec![Ok(Vec::new())]);
    let provider = FakeProvider::default();
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &network, &scanner, &provider, &store);

    let report = block_on(scheduler.run_cycle());

    assert_eq!(report.outcome, CycleOutcome::NoAccessPoints);
    assert_eq!(report.sleep, Duration::from_secs(30));
    assert_eq!(provider.opened.get(), 0);
    assert!(!store.read().valid);
    assert_eq!(store.take_update(), None);
}

#[test]
fn scan_failure_retries_sooner() {
    let network = ReadyNetwork::default();
    let scanner = ScriptedScanner::new(std::vec![Err(ScanError::Radio), Ok(aps(2))]);
    let provider = FakeProvider::replying(&[(200, OK_BODY)]);
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &network, &scanner, &provider, &store);

    let first = block_on(scheduler.run_cycle());
    assert_eq!(first.outcome, CycleOutcome::ScanFailed(ScanError::Radio));
    assert_eq!(first.sleep, SCAN_RETRY_DELAY);
    assert_eq!(provider.opened.get(), 0);

    let second = block_on(scheduler.run_cycle());
    assert!(matches!(second.outcome, CycleOutcome::Committed(_)));
    assert_eq!(second.sleep, Duration::from_secs(30));
    assert_eq!(network.waits.get(), 2);
}

#[test]
fn provider_error_keeps_previous_location() {
    let network = ReadyNetwork::default();
    let scanner = ScriptedScanner::new(std::vec![Ok(aps(4)), Ok(aps(4))]);
    let provider =
        FakeProvider::replying(&[(200, OK_BODY), (500, &b"{\"error\":\"backend\"}"[..])]);
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &network, &scanner, &provider, &store);

    block_on(scheduler.run_cycle());
    let before = store.read();
    assert!(store.take_update().is_some());

    let report = block_on(scheduler.run_cycle());
    assert_eq!(
        report.outcome,
        CycleOutcome::Failed(GeolocationError::TransportError(TransportFault::Status(500)))
    );
    assert_eq!(store.read(), before);
    assert_eq!(store.take_update(), None);
    assert_eq!(provider.closed.get(), 2);
}

#[test]
fn null_island_is_rejected() {
    let network = ReadyNetwork::default();
    let scanner = ScriptedScanner::new(std::vec![Ok(aps(1))]);
    let provider = FakeProvider::replying(&[(
        200,
        &b"{\"location\":{\"lat\":0,\"lng\":0},\"accuracy\":5}"[..],
    )]);
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &network, &scanner, &provider, &store);

    let report = block_on(scheduler.run_cycle());

    assert_eq!(report.outcome, CycleOutcome::Failed(GeolocationError::ParseError));
    assert_eq!(report.sleep, Duration::from_secs(30));
    assert!(!store.read().valid);
    assert_eq!(store.read().current, None);
}

#[test]
fn later_commit_replaces_earlier_one() {
    let network = ReadyNetwork::default();
    let scanner = ScriptedScanner::new(std::vec![Ok(aps(2)), Ok(aps(2))]);
    let provider = FakeProvider::replying(&[
        (200, OK_BODY),
        (200, &b"{\"location\":{\"lat\":51.5,\"lng\":-0.12},\"accuracy\":35.5}"[..]),
    ]);
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &network, &scanner, &provider, &store);

    block_on(scheduler.run_cycle());
    block_on(scheduler.run_cycle());

    let current = store.read().location().unwrap();
    assert_eq!(current.latitude, 51.5);
    assert_eq!(current.longitude, -0.12);
    assert_eq!(current.accuracy, 35.5);
    assert_eq!(store.take_update(), Some(current));
}

#[test]
fn request_carries_first_ten_scan_entries() {
    let network = ReadyNetwork::default();
    let scanner = ScriptedScanner::new(std::vec![Ok(aps(14))]);
    let provider = FakeProvider::replying(&[(200, OK_BODY)]);
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &network, &scanner, &provider, &store);

    block_on(scheduler.run_cycle());

    let requests = provider.requests.borrow();
    assert_eq!(requests.len(), 1);
    let body = core::str::from_utf8(&requests[0]).unwrap();
    assert!(body.starts_with("{\"considerIp\":false,\"wifiAccessPoints\":["));
    assert_eq!(body.matches("\"macAddress\"").count(), 10);
    assert!(body.contains("24:A4:3C:00:00:09"));
    assert!(!body.contains("24:A4:3C:00:00:0A"));
}

#[test]
fn location_cut_off_by_truncation_is_a_parse_error() {
    let mut body = Vec::new();
    body.extend_from_slice(b"{\"padding\":\"");
    body.extend(core::iter::repeat_n(b' ', 3000));
    body.extend_from_slice(b"\",\"location\":{\"lat\":10.0,\"lng\":20.0},\"accuracy\":3}");

    let network = ReadyNetwork::default();
    let scanner = ScriptedScanner::new(std::vec![Ok(aps(2))]);
    let provider = FakeProvider::replying(&[(200, body.as_slice())]);
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &network, &scanner, &provider, &store);

    let report = block_on(scheduler.run_cycle());

    assert_eq!(report.outcome, CycleOutcome::Failed(GeolocationError::ParseError));
    assert!(!store.read().valid);
}

#[test]
fn location_inside_truncated_prefix_still_parses() {
    let mut body = Vec::new();
    body.extend_from_slice(b"{\"location\":{\"lat\":10.0,\"lng\":20.0},\"accuracy\":3,\"padding\":\"");
    body.extend(core::iter::repeat_n(b' ', 3000));
    body.extend_from_slice(b"\"}");

    let network = ReadyNetwork::default();
    let scanner = ScriptedScanner::new(std::vec![Ok(aps(2))]);
    let provider = FakeProvider::replying(&[(200, body.as_slice())]);
    let store = LocationStore::new();
    let mut scheduler = AcquisitionScheduler::new(&config(), &network, &scanner, &provider, &store);

    let report = block_on(scheduler.run_cycle());

    assert_eq!(
        report.outcome,
        CycleOutcome::Committed(GeolocationResult {
            latitude: 10.0,
            longitude: 20.0,
            accuracy: 3.0,
        })
    );
}
