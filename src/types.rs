use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

pub const SSID_MAX_LEN: usize = 32;

/// Network name as broadcast, at most 32 bytes. Only used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Ssid {
    bytes: [u8; SSID_MAX_LEN],
    len: u8,
}

impl Ssid {
    /// Longer names are cut at the last char boundary that fits.
    pub fn new(name: &str) -> Self {
        let mut len = name.len().min(SSID_MAX_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut bytes = [0; SSID_MAX_LEN];
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..usize::from(self.len)]).unwrap_or("")
    }
}

impl fmt::Display for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One access point seen by a radio scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessPointObservation {
    pub mac_address: MacAddress,
    /// RSSI in dBm.
    pub signal_strength: i8,
    pub channel: u8,
    pub ssid: Ssid,
}

impl AccessPointObservation {
    pub const fn new(mac_address: [u8; 6], signal_strength: i8, channel: u8) -> Self {
        Self {
            mac_address: MacAddress::new(mac_address),
            signal_strength,
            channel,
            ssid: Ssid {
                bytes: [0; SSID_MAX_LEN],
                len: 0,
            },
        }
    }

    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = Ssid::new(ssid);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeolocationResult {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters.
    pub accuracy: f32,
}

/// Snapshot handed to readers of the location store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationState {
    pub current: Option<GeolocationResult>,
    pub valid: bool,
}

impl LocationState {
    pub const fn empty() -> Self {
        Self {
            current: None,
            valid: false,
        }
    }

    pub const fn committed(result: GeolocationResult) -> Self {
        Self {
            current: Some(result),
            valid: true,
        }
    }

    /// The committed location, if the store has ever been written.
    pub fn location(self) -> Option<GeolocationResult> {
        if self.valid {
            self.current
        } else {
            None
        }
    }
}

impl Default for LocationState {
    fn default() -> Self {
        Self::empty()
    }
}
