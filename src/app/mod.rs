mod config;
mod display;
mod http_client;
mod net;
mod scanner;
mod wifi;

use esp_hal::{
    i2c::master::{Config as I2cConfig, I2c},
    time::Rate,
    timer::timg::TimerGroup,
};
use wifiloc::{config::GeolocatorConfig, oled::Ssd1306, AcquisitionScheduler};

use self::{
    config::{HEAP_BYTES, LOCATION, OLED_I2C_KHZ},
    display::PanelBus,
    http_client::TcpConnector,
    net::NetworkRuntime,
    scanner::{ChannelScanner, StackConnectivity},
};

pub(crate) fn run() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());
    esp_alloc::heap_allocator!(size: HEAP_BYTES);
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    log::info!("wifiloc: geolocation with OLED display");

    let config = match GeolocatorConfig::compiled() {
        Ok(config) => config,
        Err(err) => {
            log::error!("wifiloc: build configuration invalid: {}", err);
            halt_forever();
        }
    };

    let i2c_cfg = I2cConfig::default().with_frequency(Rate::from_khz(OLED_I2C_KHZ));
    let i2c = match I2c::new(peripherals.I2C0, i2c_cfg) {
        Ok(i2c) => i2c
            .with_sda(peripherals.GPIO12)
            .with_scl(peripherals.GPIO14),
        Err(err) => {
            log::error!("display: i2c init err={:?}", err);
            halt_forever();
        }
    };
    let panel = Ssd1306::new(PanelBus::new(i2c));

    let runtime = match net::setup(peripherals.WIFI) {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("{}", err);
            halt_forever();
        }
    };
    let NetworkRuntime {
        wifi_controller,
        net_runner,
        stack,
    } = runtime;

    let mut executor = esp_rtos::embassy::Executor::new();
    let executor = unsafe { make_static(&mut executor) };
    executor.run(move |spawner| {
        spawner.must_spawn(net::net_task(net_runner));
        spawner.must_spawn(wifi::wifi_task(wifi_controller, config));
        spawner.must_spawn(display::display_task(panel));
        spawner.must_spawn(location_task(config, stack));
    });
}

#[embassy_executor::task]
async fn location_task(config: GeolocatorConfig<'static>, stack: embassy_net::Stack<'static>) {
    let scheduler = AcquisitionScheduler::new(
        &config,
        StackConnectivity::new(stack),
        ChannelScanner,
        TcpConnector::new(stack),
        &LOCATION,
    );
    scheduler.run().await
}

unsafe fn make_static<T>(value: &mut T) -> &'static mut T {
    unsafe { core::mem::transmute(value) }
}

fn halt_forever() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
