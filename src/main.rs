//! RustRotaryEncoder - Main entry point
//!
//! Brings up the encoder pins and the report UART, then runs the report
//! loop: every decoded step lands in the movement ring from the ISR, the
//! loop prints count changes and drains the ring.

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(target_os = "espidf")]
mod firmware {
    use esp_idf_svc::hal::gpio::IOPin;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::sys as esp_idf_sys;

    use rust_rotary_encoder::{
        config, report, EncoderDriver, EncoderIsrContext, MovementStream, QuadratureDecoder,
    };

    // The peripherals wired below are picked by name (gpio14, ...), so
    // they cannot drift from the documented defaults unnoticed.
    const _: () = assert!(config::ENCODER_A_PIN == 14);
    const _: () = assert!(config::ENCODER_B_PIN == 15);
    const _: () = assert!(config::REPORT_TX_PIN == 17);

    // Static state shared between the pin ISRs and the report loop.
    static DECODER: QuadratureDecoder = QuadratureDecoder::new();
    static MOVEMENTS: MovementStream = MovementStream::new();
    static ISR_CTX: EncoderIsrContext = EncoderIsrContext::new(&DECODER, &MOVEMENTS);

    #[no_mangle]
    fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();

        let peripherals = Peripherals::take().expect("peripherals already taken");

        // Channel pins per config::ENCODER_A_PIN / ENCODER_B_PIN.
        let _driver = EncoderDriver::new(
            peripherals.pins.gpio14.downgrade(),
            peripherals.pins.gpio15.downgrade(),
            &ISR_CTX,
        )
        .expect("encoder pin configuration failed");

        // Report UART per config::REPORT_TX_PIN.
        let mut uart = report::init_report_uart(
            peripherals.uart1,
            peripherals.pins.gpio17,
            config::REPORT_BAUD_RATE,
        )
        .expect("report UART init failed");

        // Never returns; _driver stays alive, so the ISRs stay registered.
        report::report_task(&mut uart, &DECODER, &MOVEMENTS);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("rust-rotary-encoder is ESP32 firmware; build for an espidf target.");
    eprintln!("Host builds are for running the decoder test suite only.");
}
