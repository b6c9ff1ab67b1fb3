#![no_std]
#![no_main]

mod app;

use esp_backtrace as _;

#[esp_hal::main]
fn main() -> ! {
    app::run()
}
