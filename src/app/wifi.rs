use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{
    AccessPointInfo, AuthMethod, ClientConfig, Config as WifiRuntimeConfig, ModeConfig,
    ScanConfig, ScanMethod, ScanTypeConfig, WifiController, WifiEvent,
};
use wifiloc::{
    config::GeolocatorConfig, error::ScanError, link::LinkAction, scheduler::ScanResults,
    AccessPointObservation,
};

use super::config::{
    SCAN_REQUESTS, SCAN_RESPONSES, WIFI_DYNAMIC_RX_BUF_NUM, WIFI_DYNAMIC_TX_BUF_NUM,
    WIFI_RETRY_DELAY, WIFI_RX_QUEUE_SIZE, WIFI_SCAN_ACTIVE_MAX_MS, WIFI_SCAN_ACTIVE_MIN_MS,
    WIFI_SCAN_MAX_APS, WIFI_START_SETTLE, WIFI_STATIC_RX_BUF_NUM, WIFI_TX_QUEUE_SIZE,
};

pub(super) fn wifi_runtime_config() -> WifiRuntimeConfig {
    WifiRuntimeConfig::default()
        .with_rx_queue_size(WIFI_RX_QUEUE_SIZE)
        .with_tx_queue_size(WIFI_TX_QUEUE_SIZE)
        .with_static_rx_buf_num(WIFI_STATIC_RX_BUF_NUM)
        .with_dynamic_rx_buf_num(WIFI_DYNAMIC_RX_BUF_NUM)
        .with_dynamic_tx_buf_num(WIFI_DYNAMIC_TX_BUF_NUM)
}

/// Keeps the station associated and runs scans on behalf of the scheduler.
/// Scan requests are only served while connected.
#[embassy_executor::task]
pub(super) async fn wifi_task(
    mut controller: WifiController<'static>,
    config: GeolocatorConfig<'static>,
) {
    let mode = station_mode(config.wifi_ssid, config.wifi_password);
    if let Err(err) = controller.set_config(&mode) {
        log::error!("wifi: station config err={:?}", err);
        return;
    }
    log::info!("wifi: connecting to ssid={}", config.wifi_ssid);

    loop {
        match controller.is_started() {
            Ok(true) => {}
            Ok(false) => {
                if let Err(err) = controller.start_async().await {
                    log::warn!("wifi: start err={:?}", err);
                    Timer::after(WIFI_RETRY_DELAY).await;
                    continue;
                }
                Timer::after(WIFI_START_SETTLE).await;
            }
            Err(err) => {
                log::warn!("wifi: status err={:?}", err);
                Timer::after(WIFI_RETRY_DELAY).await;
                continue;
            }
        }

        if let Err(err) = controller.connect_async().await {
            log::warn!("wifi: connect err={:?}; retrying", err);
            let _ = controller.disconnect_async().await;
            Timer::after(WIFI_RETRY_DELAY).await;
            continue;
        }
        log::info!("wifi: connected");

        loop {
            if LinkAction::from_association(controller.is_connected()) == LinkAction::Reconnect {
                log::warn!("wifi: association lost; reconnecting");
                break;
            }
            match select(
                controller.wait_for_event(WifiEvent::StaDisconnected),
                SCAN_REQUESTS.receive(),
            )
            .await
            {
                Either::First(_) => {
                    log::warn!("wifi: disconnected; reconnecting");
                    break;
                }
                Either::Second(()) => {
                    let result = scan_access_points(&mut controller).await;
                    SCAN_RESPONSES.send(result).await;
                }
            }
        }
    }
}

fn station_mode(ssid: &str, password: &str) -> ModeConfig {
    let auth_method = if password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::Wpa2Personal
    };
    ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(ssid.into())
            .with_password(password.into())
            .with_auth_method(auth_method)
            .with_scan_method(ScanMethod::AllChannels),
    )
}

async fn scan_access_points(
    controller: &mut WifiController<'static>,
) -> Result<ScanResults, ScanError> {
    let config = ScanConfig::default()
        .with_show_hidden(true)
        .with_max(WIFI_SCAN_MAX_APS)
        .with_scan_type(ScanTypeConfig::Active {
            min: Duration::from_millis(WIFI_SCAN_ACTIVE_MIN_MS).into(),
            max: Duration::from_millis(WIFI_SCAN_ACTIVE_MAX_MS).into(),
        });

    let found = controller.scan_with_config_async(config).await.map_err(|err| {
        log::error!("wifi: scan err={:?}", err);
        ScanError::Radio
    })?;

    let mut results = ScanResults::new();
    for ap in found.iter().map(observation) {
        if results.push(ap).is_err() {
            break;
        }
    }
    Ok(results)
}

fn observation(ap: &AccessPointInfo) -> AccessPointObservation {
    AccessPointObservation::new(ap.bssid, ap.signal_strength, ap.channel).with_ssid(&ap.ssid)
}
