use embassy_net::{ConfigV4, Stack, StaticConfigV4};
use embassy_time::with_timeout;
use wifiloc::{
    config::resolver_order,
    error::ScanError,
    scheduler::{AccessPointScanner, Connectivity, ScanResults},
};

use super::config::{SCAN_REQUESTS, SCAN_RESPONSES, SCAN_RESPONSE_TIMEOUT};

pub(super) struct StackConnectivity {
    stack: Stack<'static>,
    /// Lease copied into a static config with our resolvers.
    pinned: bool,
}

impl StackConnectivity {
    pub(super) fn new(stack: Stack<'static>) -> Self {
        Self {
            stack,
            pinned: false,
        }
    }

    fn pin_resolvers(&mut self) {
        let Some(lease) = self.stack.config_v4() else {
            return;
        };
        let dns_servers = resolver_order(&lease.dns_servers);
        if let [primary, backup, ..] = dns_servers[..] {
            log::info!("scheduler: DNS configured: {} (primary), {} (backup)", primary, backup);
        }
        log::debug!("scheduler: network up addr={}", lease.address.address());
        self.stack.set_config_v4(ConfigV4::Static(StaticConfigV4 {
            address: lease.address,
            gateway: lease.gateway,
            dns_servers,
        }));
        self.pinned = true;
    }
}

impl Connectivity for StackConnectivity {
    async fn wait_connected(&mut self) {
        // A static config stays "up" without a link; fall back to DHCP.
        if self.pinned && !self.stack.is_link_up() {
            self.stack.set_config_v4(ConfigV4::Dhcp(Default::default()));
            self.pinned = false;
        }
        if !self.stack.is_config_up() {
            log::info!("scheduler: waiting for wifi connection");
        }
        self.stack.wait_link_up().await;
        self.stack.wait_config_up().await;
        if !self.pinned {
            self.pin_resolvers();
        }
    }
}

/// Asks the wifi task to scan; the controller never leaves that task.
pub(super) struct ChannelScanner;

impl AccessPointScanner for ChannelScanner {
    async fn scan(&mut self, out: &mut ScanResults) -> Result<(), ScanError> {
        // Leftovers from a request that timed out.
        while SCAN_REQUESTS.try_receive().is_ok() {}
        while SCAN_RESPONSES.try_receive().is_ok() {}

        SCAN_REQUESTS.send(()).await;
        let results = with_timeout(SCAN_RESPONSE_TIMEOUT, SCAN_RESPONSES.receive())
            .await
            .map_err(|_| ScanError::Timeout)??;
        *out = results;
        Ok(())
    }
}
