use crate::config::{SCREEN_PAGES, SCREEN_WIDTH};
use crate::display::OledFrameBuffer;

pub const SSD1306_ADDR: u8 = 0x3C;

const CONTROL_COMMANDS: u8 = 0x00;
const CONTROL_DATA: u8 = 0x40;
const PACKET_MAX: usize = 17;

const CMD_COLUMN_ADDR: u8 = 0x21;
const CMD_PAGE_ADDR: u8 = 0x22;

/// 128x64 panel with internal charge pump, horizontal addressing mode.
const INIT_SEQUENCE: [u8; 25] = [
    0xAE, // display off
    0xD5, 0x80, // clock divide
    0xA8, 0x3F, // mux ratio
    0xD3, 0x00, // display offset
    0x40, // start line
    0x8D, 0x14, // charge pump
    0x20, 0x00, // memory mode
    0xA1, // segment remap
    0xC8, // com scan decrement
    0xDA, 0x12, // com pins
    0x81, 0xCF, // contrast
    0xD9, 0xF1, // precharge
    0xDB, 0x40, // vcom deselect
    0xA4, // follow ram
    0xA6, // normal display
    0xAF, // display on
];

/// Write half of an I2C master.
pub trait I2cWrite {
    type Error;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// SSD1306 controller driven over I2C.
pub struct Ssd1306<B> {
    bus: B,
    address: u8,
}

impl<B: I2cWrite> Ssd1306<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            address: SSD1306_ADDR,
        }
    }

    pub fn init(&mut self) -> Result<(), B::Error> {
        self.commands(&INIT_SEQUENCE)
    }

    /// Sends the whole frame, page 0 first, columns left to right.
    pub fn flush(&mut self, frame: &OledFrameBuffer) -> Result<(), B::Error> {
        self.commands(&[
            CMD_COLUMN_ADDR,
            0,
            (SCREEN_WIDTH - 1) as u8,
            CMD_PAGE_ADDR,
            0,
            (SCREEN_PAGES - 1) as u8,
        ])?;

        for page in frame.pages() {
            for chunk in page.chunks(PACKET_MAX - 1) {
                self.send(CONTROL_DATA, chunk)?;
            }
        }
        Ok(())
    }

    fn commands(&mut self, bytes: &[u8]) -> Result<(), B::Error> {
        for chunk in bytes.chunks(PACKET_MAX - 1) {
            self.send(CONTROL_COMMANDS, chunk)?;
        }
        Ok(())
    }

    fn send(&mut self, control: u8, payload: &[u8]) -> Result<(), B::Error> {
        let mut packet = [0u8; PACKET_MAX];
        packet[0] = control;
        packet[1..=payload.len()].copy_from_slice(payload);
        self.bus.write(self.address, &packet[..=payload.len()])
    }
}
