//! Count reporting over UART.
//!
//! The reference workflow for this reader is a loop that polls the count
//! and prints every change. The ISR path never formats text (see
//! `events`); this module is the consumer side: it drains the movement
//! ring, watches `value()` for changes, and writes plain lines to a
//! TX-only UART.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32 GPIO17 (TX) ──────▶ USB-UART RX
//!                            └─▶ PC Serial Monitor
//! ```

use core::fmt::Write;

use crate::events::MovementEvent;

#[cfg(target_os = "espidf")]
use crate::config::CONFIG;
#[cfg(target_os = "espidf")]
use crate::decoder::QuadratureDecoder;
#[cfg(target_os = "espidf")]
use crate::events::MovementStream;

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::peripheral::Peripheral;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::uart::{self, UartTxDriver};

/// Scratch buffer size for one formatted line.
pub const LINE_BUF_LEN: usize = 96;

struct BufWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Write for BufWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_write = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Format one movement event.
///
/// Format: `[timestamp_us] DIR -> count\n`
pub fn format_movement(event: &MovementEvent, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = write!(
        writer,
        "[{:10}] {:3} -> {}\n",
        event.timestamp_us,
        event.direction.as_str(),
        event.count
    );
    writer.pos
}

/// Format a polled count change.
///
/// Format: `[timestamp_us] count: value\n`
pub fn format_count(timestamp_us: i64, count: i32, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = write!(writer, "[{:10}] count: {}\n", timestamp_us, count);
    writer.pos
}

/// Format the periodic loss report (dropped events, skipped edges).
pub fn format_loss(timestamp_us: i64, dropped: u32, skips: u32, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter { buf, pos: 0 };
    let _ = write!(
        writer,
        "[{:10}] WARN: dropped={} skipped_edges={}\n",
        timestamp_us, dropped, skips
    );
    writer.pos
}

/// Initialize a TX-only UART for report output.
#[cfg(target_os = "espidf")]
pub fn init_report_uart<'d>(
    uart: impl Peripheral<P = esp_idf_svc::hal::uart::UART1> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    baud_rate: u32,
) -> Result<UartTxDriver<'d>, esp_idf_svc::sys::EspError> {
    let uart_config = uart::config::Config::default()
        .baudrate(esp_idf_svc::hal::units::Hertz(baud_rate));

    UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )
}

/// FreeRTOS default tick period (configTICK_RATE_HZ = 100).
#[cfg(target_os = "espidf")]
const TICK_MS: u32 = 10;

/// Report loop: drain movement events, print count changes, and report
/// losses every 10 seconds. Never returns.
#[cfg(target_os = "espidf")]
pub fn report_task(
    uart: &mut UartTxDriver<'_>,
    decoder: &QuadratureDecoder,
    movements: &MovementStream,
) -> ! {
    let mut line = [0u8; LINE_BUF_LEN];
    let mut last_count = decoder.value();
    let mut last_skips = decoder.stats().skips;
    let mut last_loss_report = 0i64;

    loop {
        let mut work_done = false;

        // Movement events first: they carry the per-step timeline.
        while let Some(event) = movements.drain() {
            let len = format_movement(&event, &mut line);
            let _ = uart.write(&line[..len]);
            work_done = true;
        }

        // Poll the count; with movement logging off this is the only
        // output.
        let count = decoder.value();
        if count != last_count {
            // SAFETY: esp_timer_get_time is always safe to call.
            let now = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
            let len = format_count(now, count, &mut line);
            let _ = uart.write(&line[..len]);
            last_count = count;
            work_done = true;
        }

        // SAFETY: esp_timer_get_time is always safe to call.
        let now = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        if now - last_loss_report > 10_000_000 {
            let dropped = movements.dropped();
            let skips = decoder.stats().skips;

            if dropped > 0 || skips != last_skips {
                let len = format_loss(now, dropped, skips - last_skips, &mut line);
                let _ = uart.write(&line[..len]);
                movements.reset_dropped();
                last_skips = skips;
            }

            last_loss_report = now;
        }

        if !work_done {
            let ticks = (CONFIG.report_interval_ms() / TICK_MS).max(1);
            // SAFETY: vTaskDelay is always safe to call from a task.
            unsafe {
                esp_idf_svc::sys::vTaskDelay(ticks);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Direction;

    #[test]
    fn test_format_movement() {
        let event = MovementEvent {
            timestamp_us: 1234567,
            count: -3,
            direction: Direction::CounterClockwise,
        };

        let mut buf = [0u8; LINE_BUF_LEN];
        let len = format_movement(&event, &mut buf);

        let line = core::str::from_utf8(&buf[..len]).unwrap();
        assert!(line.contains("1234567"));
        assert!(line.contains("CCW"));
        assert!(line.contains("-3"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_format_count() {
        let mut buf = [0u8; LINE_BUF_LEN];
        let len = format_count(999, 42, &mut buf);

        let line = core::str::from_utf8(&buf[..len]).unwrap();
        assert!(line.contains("999"));
        assert!(line.contains("count: 42"));
    }

    #[test]
    fn test_format_loss() {
        let mut buf = [0u8; LINE_BUF_LEN];
        let len = format_loss(5000, 7, 2, &mut buf);

        let line = core::str::from_utf8(&buf[..len]).unwrap();
        assert!(line.contains("WARN"));
        assert!(line.contains("dropped=7"));
        assert!(line.contains("skipped_edges=2"));
    }
}
