use embassy_net::{dns::DnsQueryType, tcp::TcpSocket, IpAddress, Stack};
use static_cell::StaticCell;
use wifiloc::{
    error::TransportFault,
    http::{read_response, write_request},
    transport::{Endpoint, HttpConnection, HttpConnector, HttpRequest, ResponseBuffer},
};

use super::config::{TCP_RX_BUF, TCP_SOCKET_TIMEOUT, TCP_TX_BUF};

/// Plain TCP connector. Encryption, when the provider needs it, is left to a
/// terminating proxy named by `WIFILOC_PROVIDER_HOST`.
pub(super) struct TcpConnector {
    stack: Stack<'static>,
    rx_buffer: &'static mut [u8; TCP_RX_BUF],
    tx_buffer: &'static mut [u8; TCP_TX_BUF],
}

impl TcpConnector {
    pub(super) fn new(stack: Stack<'static>) -> Self {
        static RX_BUFFER: StaticCell<[u8; TCP_RX_BUF]> = StaticCell::new();
        static TX_BUFFER: StaticCell<[u8; TCP_TX_BUF]> = StaticCell::new();

        Self {
            stack,
            rx_buffer: RX_BUFFER.init([0u8; TCP_RX_BUF]),
            tx_buffer: TX_BUFFER.init([0u8; TCP_TX_BUF]),
        }
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, TransportFault> {
        if let Ok(addr) = host.parse::<core::net::Ipv4Addr>() {
            return Ok(IpAddress::Ipv4(addr));
        }
        let addrs = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|err| {
                log::warn!("geolocation: dns lookup for {} failed err={:?}", host, err);
                TransportFault::Dns
            })?;
        addrs.first().copied().ok_or(TransportFault::Dns)
    }
}

impl HttpConnector for TcpConnector {
    type Connection<'c>
        = TcpConnection<'c>
    where
        Self: 'c;

    async fn connect(
        &mut self,
        endpoint: &Endpoint<'_>,
    ) -> Result<Self::Connection<'_>, TransportFault> {
        let addr = self.resolve(endpoint.host).await?;
        let mut socket = TcpSocket::new(self.stack, &mut self.rx_buffer[..], &mut self.tx_buffer[..]);
        socket.set_timeout(Some(TCP_SOCKET_TIMEOUT));
        socket.connect((addr, endpoint.port)).await.map_err(|err| {
            log::warn!(
                "geolocation: connect {}:{} failed err={:?}",
                endpoint.host,
                endpoint.port,
                err
            );
            TransportFault::Connect
        })?;
        Ok(TcpConnection { socket })
    }
}

pub(super) struct TcpConnection<'s> {
    socket: TcpSocket<'s>,
}

impl HttpConnection for TcpConnection<'_> {
    async fn post(
        &mut self,
        request: &HttpRequest<'_>,
        sink: &mut ResponseBuffer,
    ) -> Result<u16, TransportFault> {
        write_request(&mut self.socket, request).await?;
        read_response(&mut self.socket, sink).await
    }

    async fn close(mut self) {
        self.socket.close();
        let _ = self.socket.flush().await;
    }
}
