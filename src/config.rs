use core::{fmt, net::Ipv4Addr};

use embassy_time::Duration;
use heapless::Vec;
#[cfg(feature = "graphics")]
use u8g2_fonts::{fonts, FontRenderer};

pub const MAX_REQUEST_ACCESS_POINTS: usize = 10;
pub const SCAN_RESULTS_MAX: usize = 20;
pub const REQUEST_BODY_MAX: usize = 1536;
pub const RESPONSE_BUFFER_LEN: usize = 2048;
pub const PROVIDER_PATH_MAX: usize = 256;
pub const PROVIDER_PATH_PREFIX: &str = "/geolocation/v1/geolocate?key=";
pub const DEFAULT_PROVIDER_HOST: &str = "www.googleapis.com";
pub const DEFAULT_PROVIDER_PORT: u16 = 80;
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const SCAN_RETRY_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_UPDATE_INTERVAL_SECS: u32 = 60;
pub const LOGGED_ACCESS_POINTS_MAX: usize = 10;
/// Resolvers tried before whatever the DHCP lease offers.
pub const FALLBACK_DNS_SERVERS: [Ipv4Addr; 2] =
    [Ipv4Addr::new(8, 8, 8, 8), Ipv4Addr::new(1, 1, 1, 1)];

pub const SCREEN_WIDTH: usize = 128;
/// 8-pixel pages; the panel is 64 pixels tall.
pub const SCREEN_PAGES: usize = 8;
pub const SCREEN_LINE_MAX: usize = 24;
pub const SCREEN_LINES_MAX: usize = 4;
pub const SCREEN_TITLE_Y: i32 = 0;
pub const SCREEN_LAT_Y: i32 = 20;
pub const SCREEN_LNG_Y: i32 = 32;
pub const SCREEN_ACC_Y: i32 = 44;
#[cfg(feature = "graphics")]
pub const SCREEN_FONT: FontRenderer = FontRenderer::new::<fonts::u8g2_font_5x8_tf>();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    MissingSsid,
    MissingApiKey,
    MissingProviderHost,
    InvalidPort,
    InvalidInterval,
}

impl ConfigError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingSsid => "missing wifi ssid",
            Self::MissingApiKey => "missing provider api key",
            Self::MissingProviderHost => "missing provider host",
            Self::InvalidPort => "invalid provider port",
            Self::InvalidInterval => "invalid update interval",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the device needs from its build environment.
///
/// Values are opaque to the pipeline; they are only checked for presence and,
/// for the numeric ones, for parseability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeolocatorConfig<'a> {
    pub wifi_ssid: &'a str,
    pub wifi_password: &'a str,
    pub api_key: &'a str,
    pub provider_host: &'a str,
    pub provider_port: u16,
    pub update_interval_secs: u32,
}

impl<'a> GeolocatorConfig<'a> {
    pub fn from_parts(
        wifi_ssid: Option<&'a str>,
        wifi_password: Option<&'a str>,
        api_key: Option<&'a str>,
        provider_host: Option<&'a str>,
        provider_port: Option<&str>,
        update_interval_secs: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let wifi_ssid = non_empty(wifi_ssid).ok_or(ConfigError::MissingSsid)?;
        let api_key = non_empty(api_key).ok_or(ConfigError::MissingApiKey)?;
        let provider_host = match provider_host {
            None => DEFAULT_PROVIDER_HOST,
            Some(host) => non_empty(Some(host)).ok_or(ConfigError::MissingProviderHost)?,
        };
        let provider_port = match provider_port {
            None => DEFAULT_PROVIDER_PORT,
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) if port != 0 => port,
                _ => return Err(ConfigError::InvalidPort),
            },
        };
        let update_interval_secs = match update_interval_secs {
            None => DEFAULT_UPDATE_INTERVAL_SECS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(secs) if secs != 0 => secs,
                _ => return Err(ConfigError::InvalidInterval),
            },
        };

        Ok(Self {
            wifi_ssid,
            wifi_password: wifi_password.unwrap_or(""),
            api_key,
            provider_host,
            provider_port,
            update_interval_secs,
        })
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.update_interval_secs))
    }
}

impl GeolocatorConfig<'static> {
    /// Reads the `WIFILOC_*` variables captured at build time.
    pub fn compiled() -> Result<Self, ConfigError> {
        Self::from_parts(
            option_env!("WIFILOC_WIFI_SSID"),
            option_env!("WIFILOC_WIFI_PASSWORD"),
            option_env!("WIFILOC_API_KEY"),
            option_env!("WIFILOC_PROVIDER_HOST"),
            option_env!("WIFILOC_PROVIDER_PORT"),
            option_env!("WIFILOC_UPDATE_INTERVAL_SECS"),
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

/// Fallback resolvers first, then lease entries not already listed, capped at `N`.
pub fn resolver_order<const N: usize>(lease: &[Ipv4Addr]) -> Vec<Ipv4Addr, N> {
    let mut servers = Vec::new();
    for server in FALLBACK_DNS_SERVERS.iter().chain(lease) {
        if servers.contains(server) {
            continue;
        }
        if servers.push(*server).is_err() {
            break;
        }
    }
    servers
}
