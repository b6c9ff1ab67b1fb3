use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::Duration;
use wifiloc::{error::ScanError, scheduler::ScanResults, store::LocationStore};

pub(crate) const HEAP_BYTES: usize = 72 * 1024;
pub(crate) const OLED_I2C_KHZ: u32 = 400;

pub(crate) const WIFI_RX_QUEUE_SIZE: usize = 3;
pub(crate) const WIFI_TX_QUEUE_SIZE: usize = 2;
pub(crate) const WIFI_STATIC_RX_BUF_NUM: u8 = 4;
pub(crate) const WIFI_DYNAMIC_RX_BUF_NUM: u16 = 8;
pub(crate) const WIFI_DYNAMIC_TX_BUF_NUM: u16 = 8;
pub(crate) const WIFI_RETRY_DELAY: Duration = Duration::from_secs(3);
pub(crate) const WIFI_START_SETTLE: Duration = Duration::from_millis(800);
pub(crate) const WIFI_SCAN_MAX_APS: usize = 20;
pub(crate) const WIFI_SCAN_ACTIVE_MIN_MS: u64 = 100;
pub(crate) const WIFI_SCAN_ACTIVE_MAX_MS: u64 = 300;
pub(crate) const SCAN_RESPONSE_TIMEOUT: Duration = Duration::from_secs(15);

pub(crate) const TCP_RX_BUF: usize = 2048;
pub(crate) const TCP_TX_BUF: usize = 2048;
pub(crate) const TCP_SOCKET_TIMEOUT: Duration = Duration::from_secs(8);

pub(crate) static LOCATION: LocationStore = LocationStore::new();

pub(crate) static SCAN_REQUESTS: Channel<CriticalSectionRawMutex, (), 1> = Channel::new();
pub(crate) static SCAN_RESPONSES: Channel<
    CriticalSectionRawMutex,
    Result<ScanResults, ScanError>,
    1,
> = Channel::new();
