use core::fmt;

/// Why a single provider exchange failed below the HTTP status level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportFault {
    /// The provider answered with something other than 200.
    Status(u16),
    Dns,
    Connect,
    Io,
    Timeout,
    Malformed,
}

impl TransportFault {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Dns => "dns",
            Self::Connect => "connect",
            Self::Io => "io",
            Self::Timeout => "timeout",
            Self::Malformed => "malformed_response",
        }
    }
}

impl fmt::Display for TransportFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "status={code}"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeolocationError {
    /// Empty observation list or a missing pipeline input.
    InvalidArgument,
    /// A fixed-capacity request or URL buffer was too small.
    AllocationError,
    TransportError(TransportFault),
    /// The body carried no usable coordinates.
    ParseError,
}

impl GeolocationError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::AllocationError => "allocation",
            Self::TransportError(_) => "transport",
            Self::ParseError => "parse",
        }
    }
}

impl From<TransportFault> for GeolocationError {
    fn from(fault: TransportFault) -> Self {
        Self::TransportError(fault)
    }
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransportError(fault) => write!(f, "transport ({fault})"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanError {
    /// The radio refused or aborted the scan.
    Radio,
    /// No scan result arrived in time.
    Timeout,
}

impl ScanError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Radio => "radio",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
