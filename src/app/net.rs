use embassy_net::{Config as NetConfig, Runner, Stack, StackResources};
use esp_hal::{peripherals::WIFI, rng::Rng};
use esp_radio::{
    wifi::{InternalWifiError, WifiController, WifiDevice, WifiError},
    Controller,
};
use static_cell::StaticCell;

use super::wifi;

/// DHCP, one DNS query and the provider TCP connection.
const STACK_SOCKETS: usize = 3;

pub(crate) struct NetworkRuntime {
    pub(crate) wifi_controller: WifiController<'static>,
    pub(crate) net_runner: Runner<'static, WifiDevice<'static>>,
    pub(crate) stack: Stack<'static>,
}

static RADIO: StaticCell<Controller<'static>> = StaticCell::new();
static RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();

/// Brings up the radio and a DHCP station stack. Resolvers are pinned later,
/// once a lease exists.
pub(crate) fn setup(wifi: WIFI<'static>) -> Result<NetworkRuntime, &'static str> {
    let radio = esp_radio::init().map_err(|err| {
        log::error!("wifi: radio init err={:?}", err);
        "wifi: radio init failed"
    })?;
    let radio = RADIO.init(radio);

    let (wifi_controller, interfaces) =
        esp_radio::wifi::new(radio, wifi, wifi::wifi_runtime_config()).map_err(init_error)?;

    let (stack, net_runner) = embassy_net::new(
        interfaces.sta,
        NetConfig::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        stack_seed(),
    );

    Ok(NetworkRuntime {
        wifi_controller,
        net_runner,
        stack,
    })
}

fn init_error(err: WifiError) -> &'static str {
    log::error!("wifi: driver init err={:?}", err);
    match err {
        WifiError::InternalError(InternalWifiError::NoMem) => "wifi: driver init out of memory",
        WifiError::InvalidArguments => "wifi: driver init rejected config",
        _ => "wifi: driver init failed",
    }
}

fn stack_seed() -> u64 {
    let rng = Rng::new();
    u64::from(rng.random()) << 32 | u64::from(rng.random())
}

#[embassy_executor::task]
pub(crate) async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
