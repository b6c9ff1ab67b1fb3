use esp_hal::{
    i2c::master::{Error as I2cError, I2c},
    Blocking,
};
use wifiloc::{
    display::{draw_screen, OledFrameBuffer, ScreenText},
    oled::{I2cWrite, Ssd1306},
};

use super::config::LOCATION;

pub(crate) type Panel = Ssd1306<PanelBus>;

pub(crate) struct PanelBus {
    bus: I2c<'static, Blocking>,
}

impl PanelBus {
    pub(crate) fn new(bus: I2c<'static, Blocking>) -> Self {
        Self { bus }
    }
}

impl I2cWrite for PanelBus {
    type Error = I2cError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.bus.write(address, bytes)
    }
}

/// Shows the splash, then redraws after every committed location.
#[embassy_executor::task]
pub(super) async fn display_task(mut panel: Panel) {
    let mut panel_ready = false;
    let mut frame = OledFrameBuffer::new();
    show(&mut panel, &mut panel_ready, &mut frame, &ScreenText::boot_splash());

    loop {
        LOCATION.wait_updated().await;
        let screen = ScreenText::for_state(LOCATION.read());
        show(&mut panel, &mut panel_ready, &mut frame, &screen);
    }
}

fn show(
    panel: &mut Panel,
    panel_ready: &mut bool,
    frame: &mut OledFrameBuffer,
    screen: &ScreenText,
) {
    for line in screen.lines() {
        log::info!("display: y={} {}", line.y, line.text);
    }

    let Ok(()) = draw_screen(frame, screen);
    // Re-sent after any bus failure; the panel may have browned out.
    if !*panel_ready {
        if let Err(err) = panel.init() {
            log::warn!("display: panel init err={:?}", err);
            return;
        }
        *panel_ready = true;
    }
    if let Err(err) = panel.flush(frame) {
        log::warn!("display: flush err={:?}", err);
        *panel_ready = false;
    }
}
