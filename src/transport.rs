use core::fmt::Write as _;

use embassy_time::with_timeout;
use heapless::{String, Vec};

use crate::config::{HTTP_TIMEOUT, PROVIDER_PATH_MAX, PROVIDER_PATH_PREFIX, RESPONSE_BUFFER_LEN};
use crate::error::{GeolocationError, TransportFault};
use crate::http::CONTENT_TYPE_JSON;

/// Bounded receive buffer for one provider exchange.
///
/// One slot of the capacity stays reserved, so at most
/// `RESPONSE_BUFFER_LEN - 1` bytes are ever held. When a chunk does not fit,
/// the part that fits is kept and everything after it is dropped for the rest
/// of the exchange: the buffer always holds a contiguous prefix of the stream.
/// Overflow is reported through [`ResponseBuffer::truncated`], never as an
/// error.
pub struct ResponseBuffer {
    bytes: Vec<u8, RESPONSE_BUFFER_LEN>,
    truncated: bool,
}

impl ResponseBuffer {
    pub const LIMIT: usize = RESPONSE_BUFFER_LEN - 1;

    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            truncated: false,
        }
    }

    pub fn reset(&mut self) {
        self.bytes.clear();
        self.truncated = false;
    }

    /// Returns how many bytes of `chunk` were kept.
    pub fn append(&mut self, chunk: &[u8]) -> usize {
        if self.truncated {
            return 0;
        }

        let room = Self::LIMIT - self.bytes.len();
        let take = if chunk.len() > room {
            self.truncated = true;
            room
        } else {
            chunk.len()
        };
        // `take` never exceeds the remaining capacity.
        let _ = self.bytes.extend_from_slice(&chunk[..take]);
        take
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Longest valid UTF-8 prefix, for logging.
    pub fn as_str_lossy(&self) -> &str {
        match core::str::from_utf8(&self.bytes) {
            Ok(text) => text,
            Err(err) => core::str::from_utf8(&self.bytes[..err.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path_and_query: String<PROVIDER_PATH_MAX>,
}

impl<'a> Endpoint<'a> {
    pub fn for_provider(host: &'a str, port: u16, api_key: &str) -> Result<Self, GeolocationError> {
        let mut path_and_query = String::new();
        write!(path_and_query, "{PROVIDER_PATH_PREFIX}{api_key}")
            .map_err(|_| GeolocationError::AllocationError)?;
        Ok(Self {
            host,
            port,
            path_and_query,
        })
    }
}

pub struct HttpRequest<'a> {
    pub endpoint: &'a Endpoint<'a>,
    pub content_type: &'static str,
    pub body: &'a [u8],
}

/// Opens connections to the provider. The TLS/TCP stack behind it is not
/// this crate's concern.
#[allow(async_fn_in_trait)]
pub trait HttpConnector {
    type Connection<'c>: HttpConnection
    where
        Self: 'c;

    async fn connect(
        &mut self,
        endpoint: &Endpoint<'_>,
    ) -> Result<Self::Connection<'_>, TransportFault>;
}

/// One acquired connection handle. Dropping it must release the handle as
/// well; that is the path taken when the exchange times out.
#[allow(async_fn_in_trait)]
pub trait HttpConnection {
    /// Sends the request and streams the response body into `sink`.
    async fn post(
        &mut self,
        request: &HttpRequest<'_>,
        sink: &mut ResponseBuffer,
    ) -> Result<u16, TransportFault>;

    async fn close(self);
}

pub struct GeolocationTransport<'a, C> {
    connector: C,
    host: &'a str,
    port: u16,
}

impl<'a, C: HttpConnector> GeolocationTransport<'a, C> {
    pub fn new(connector: C, host: &'a str, port: u16) -> Self {
        Self {
            connector,
            host,
            port,
        }
    }

    /// One POST to the provider. `response` is reset first and holds the
    /// (possibly truncated) body afterwards, also on failure.
    pub async fn exchange(
        &mut self,
        api_key: &str,
        body: &[u8],
        response: &mut ResponseBuffer,
    ) -> Result<u16, GeolocationError> {
        response.reset();
        if body.is_empty() {
            return Err(GeolocationError::InvalidArgument);
        }

        let endpoint = Endpoint::for_provider(self.host, self.port, api_key)?;
        let request = HttpRequest {
            endpoint: &endpoint,
            content_type: CONTENT_TYPE_JSON,
            body,
        };
        let connector = &mut self.connector;
        let exchange = async {
            let mut connection = connector.connect(&endpoint).await?;
            let status = connection.post(&request, response).await;
            connection.close().await;
            status
        };

        let status = match with_timeout(HTTP_TIMEOUT, exchange).await {
            Ok(Ok(status)) => status,
            Ok(Err(fault)) => {
                log::error!("geolocation: http post failed: {}", fault);
                log::error!("geolocation: response: {}", response.as_str_lossy());
                return Err(fault.into());
            }
            Err(_) => {
                log::error!(
                    "geolocation: http post timed out after {}s",
                    HTTP_TIMEOUT.as_secs()
                );
                return Err(TransportFault::Timeout.into());
            }
        };

        if response.truncated() {
            log::warn!(
                "geolocation: response truncated to {} bytes",
                ResponseBuffer::LIMIT
            );
        }

        if status != 200 {
            log::error!("geolocation: http post failed with status code: {}", status);
            log::error!("geolocation: response: {}", response.as_str_lossy());
            return Err(TransportFault::Status(status).into());
        }

        log::info!("geolocation: response: {}", response.as_str_lossy());
        Ok(status)
    }
}
