//! Programmer calculator firmware for the ESP32-S3.
//!
//! Key presses are scanned by a TCA8418, bit buttons toggle the 32 bit LEDs
//! and the status display is rendered into a 256x64 frame buffer. Sending
//! that buffer to the SSD1322 panel is not part of this firmware.

#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those     holding buffers for the duration of a data transfer."
)]

use calc_bit_leds::BitLeds;
use calc_display::CalculatorDisplay;
use calc_keypad_async::{Dispatcher, KeyInput, Keypad, KeypadConfig, SignalHandler};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel, signal::Signal};
use embassy_time::{Delay, Duration, Timer};
use embedded_graphics::{
    framebuffer::{buffer_size, Framebuffer},
    pixelcolor::{
        raw::{LittleEndian, RawU1},
        BinaryColor,
    },
};
use esp_hal::i2c::master::I2c;
use esp_hal::{
    clock::CpuClock,
    gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull},
    time::Rate,
    timer::systimer::SystemTimer,
    Async,
};
use esp_println::println;
use log::{info, warn};
use tca8418_async::Tca8418;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("{}", info);
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Keypad scanner bus speed.
const KEYPAD_I2C_KHZ: u32 = 400;
/// Depth of the queue between the keypad service and the application.
const KEY_QUEUE_DEPTH: usize = 16;

const DISPLAY_WIDTH: usize = 256;
const DISPLAY_HEIGHT: usize = 64;

type Frame = Framebuffer<
    BinaryColor,
    RawU1,
    LittleEndian,
    DISPLAY_WIDTH,
    DISPLAY_HEIGHT,
    { buffer_size::<BinaryColor>(DISPLAY_WIDTH, DISPLAY_HEIGHT) },
>;

type Leds = BitLeds<
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Output<'static>,
    Delay,
>;

static KEYPAD_IRQ: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static POWER_IRQ: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static KEYS: Channel<CriticalSectionRawMutex, KeyInput, KEY_QUEUE_DEPTH> = Channel::new();

/// The main entry point of the application.
#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger(log::LevelFilter::Debug);
    info!("Logger initialized");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Latch the soft power switch before anything else.
    let _power_en = Output::new(peripherals.GPIO38, Level::High, OutputConfig::default());
    let power_btn = Input::new(
        peripherals.GPIO39,
        InputConfig::default().with_pull(Pull::Up),
    );

    info!("Peripherals initialized");

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    let keypad_sda = peripherals.GPIO1;
    let keypad_scl = peripherals.GPIO2;
    let keypad_int = Input::new(peripherals.GPIO4, InputConfig::default());

    let i2c_config =
        esp_hal::i2c::master::Config::default().with_frequency(Rate::from_khz(KEYPAD_I2C_KHZ));
    let keypad_i2c = I2c::new(peripherals.I2C0, i2c_config)
        .unwrap()
        .with_sda(keypad_sda)
        .with_scl(keypad_scl)
        .into_async();

    let mut keypad = Keypad::new(Tca8418::new(keypad_i2c), KeypadConfig::default());
    match keypad.init().await {
        Ok(_) => log::debug!("Keypad initialized."),
        Err(err) => warn!("Error initializing keypad: {err:?}"),
    };

    let mut leds = BitLeds::new(
        (
            Output::new(peripherals.GPIO15, Level::Low, OutputConfig::default()),
            Output::new(peripherals.GPIO14, Level::Low, OutputConfig::default()),
            Output::new(peripherals.GPIO16, Level::High, OutputConfig::default()),
            Output::new(peripherals.GPIO17, Level::Low, OutputConfig::default()),
            Output::new(peripherals.GPIO18, Level::High, OutputConfig::default()),
        ),
        Delay,
    );
    // Output pins are infallible.
    let _ = leds.init();

    let mut display = CalculatorDisplay::new(Frame::new());
    let _ = display.clear();
    let _ = display.draw_message("Hello, world!");

    spawner
        .spawn(interrupts(Dispatcher::new(keypad_int, power_btn)))
        .unwrap();
    spawner.spawn(keypad_service(keypad)).unwrap();
    spawner.spawn(calculator(display, leds)).unwrap();

    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

/// Turns falling edges on the interrupt lines into signals.
#[embassy_executor::task]
async fn interrupts(mut dispatcher: Dispatcher<Input<'static>, Input<'static>>) {
    let mut handler = SignalHandler::new(&KEYPAD_IRQ, &POWER_IRQ);
    dispatcher.run(&mut handler).await
}

/// Drains the scanner FIFO whenever the keypad interrupt fires.
#[embassy_executor::task]
async fn keypad_service(mut keypad: Keypad<I2c<'static, Async>, esp_hal::i2c::master::Error>) {
    keypad.run(&KEYPAD_IRQ, KEYS.sender()).await
}

/// Shows key input on the display and toggles the bit LEDs.
#[embassy_executor::task]
async fn calculator(mut display: CalculatorDisplay<Frame>, mut leds: Leds) {
    let mut value: u32 = 0;
    loop {
        match select(KEYS.receive(), POWER_IRQ.wait()).await {
            Either::First(input) => {
                if let KeyInput::Pressed(domain) = input {
                    if let Some(bit) = domain.bit_index() {
                        value ^= 1 << bit;
                        let _ = leds.set(value);
                        info!("Value {value:#010x}");
                    }
                }
                let _ = display.draw_key(&input);
            }
            Either::Second(()) => {
                let _ = display.draw_message("Power button");
            }
        }
    }
}
