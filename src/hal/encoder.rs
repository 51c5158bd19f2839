//! GPIO quadrature encoder driver.
//!
//! Owns the two channel pins, configures them as pull-up inputs with
//! any-edge interrupts, and registers a shared ISR on both. The ISR reads
//! both levels and feeds them to the hardware-free [`QuadratureDecoder`];
//! everything it touches is lock-free and bounded.
//!
//! The per-pin handler is registered through `gpio_isr_handler_add`
//! directly so it stays armed for every edge with no re-enable
//! bookkeeping, matching the C-level any-edge semantics the decoder
//! expects.

use core::ffi::c_void;
use core::sync::atomic::{AtomicI32, Ordering};

use esp_idf_svc::hal::gpio::{AnyIOPin, Input, InterruptType, PinDriver, Pull};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::sys::{self, EspError};

use crate::config::CONFIG;
use crate::decoder::QuadratureDecoder;
use crate::events::{MovementEvent, MovementStream};

/// Encoder pin configuration failure, surfaced at construction.
#[derive(Debug)]
pub enum ConfigError {
    /// A channel pin could not be placed into input/pull-up/any-edge mode.
    Pin(EspError),
    /// The GPIO ISR service could not be installed.
    IsrService(EspError),
    /// The per-pin edge handler could not be registered.
    Handler(EspError),
}

impl ConfigError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Pin(_) => "pin configuration failed",
            Self::IsrService(_) => "GPIO ISR service install failed",
            Self::Handler(_) => "edge handler registration failed",
        }
    }

    pub fn error(&self) -> EspError {
        match self {
            Self::Pin(e) | Self::IsrService(e) | Self::Handler(e) => *e,
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.message(), self.error())
    }
}

/// State shared with the edge ISR.
///
/// Lives in a `static` provided by the caller; the ISR only ever touches
/// atomics through it. Pin numbers are bound by [`EncoderDriver::new`]
/// before the handler is registered.
pub struct EncoderIsrContext {
    decoder: &'static QuadratureDecoder,
    movements: &'static MovementStream,
    pin_a: AtomicI32,
    pin_b: AtomicI32,
}

impl EncoderIsrContext {
    pub const fn new(
        decoder: &'static QuadratureDecoder,
        movements: &'static MovementStream,
    ) -> Self {
        Self {
            decoder,
            movements,
            pin_a: AtomicI32::new(-1),
            pin_b: AtomicI32::new(-1),
        }
    }
}

/// Edge ISR, shared by both channel pins.
///
/// Reads both current levels (the other channel may have moved too, and
/// the interrupt layer can deliver duplicates) and applies them to the
/// decoder. Runs in ISR context: no blocking, no allocation, no
/// formatting.
unsafe extern "C" fn encoder_isr(arg: *mut c_void) {
    // SAFETY: arg is the &'static EncoderIsrContext registered below.
    let ctx = &*(arg as *const EncoderIsrContext);

    let a = sys::gpio_get_level(ctx.pin_a.load(Ordering::Relaxed)) != 0;
    let b = sys::gpio_get_level(ctx.pin_b.load(Ordering::Relaxed)) != 0;

    // Swapping the channels inverts the counting direction while the
    // decode table stays canonical.
    let (a, b) = if CONFIG.swap_channels() { (b, a) } else { (a, b) };

    if let Some(direction) = ctx.decoder.on_edge(a, b) {
        if CONFIG.movement_log() {
            let _ = ctx.movements.push(MovementEvent {
                timestamp_us: sys::esp_timer_get_time(),
                count: ctx.decoder.value(),
                direction,
            });
        }
    }
}

/// Install the global GPIO ISR service if nobody has yet.
fn install_isr_service() -> Result<(), ConfigError> {
    // SAFETY: plain ESP-IDF service call; idempotence handled via the
    // INVALID_STATE return below.
    match EspError::convert(unsafe { sys::gpio_install_isr_service(0) }) {
        Ok(()) => Ok(()),
        Err(e) if e.code() == sys::ESP_ERR_INVALID_STATE as i32 => Ok(()),
        Err(e) => Err(ConfigError::IsrService(e)),
    }
}

/// Interrupt-driven quadrature encoder pin driver.
///
/// Construction configures both pins, commits their live levels as the
/// decoder's starting phase, and arms the edge ISR on both channels for
/// both polarities. Dropping the driver removes both handlers before the
/// pins are released, so no callback can outlive the state it touches.
pub struct EncoderDriver<'d> {
    pin_a: PinDriver<'d, AnyIOPin, Input>,
    pin_b: PinDriver<'d, AnyIOPin, Input>,
}

impl<'d> EncoderDriver<'d> {
    pub fn new(
        pin_a: impl Peripheral<P = AnyIOPin> + 'd,
        pin_b: impl Peripheral<P = AnyIOPin> + 'd,
        ctx: &'static EncoderIsrContext,
    ) -> Result<Self, ConfigError> {
        let mut pin_a = PinDriver::input(pin_a).map_err(ConfigError::Pin)?;
        let mut pin_b = PinDriver::input(pin_b).map_err(ConfigError::Pin)?;

        pin_a.set_pull(Pull::Up).map_err(ConfigError::Pin)?;
        pin_b.set_pull(Pull::Up).map_err(ConfigError::Pin)?;
        pin_a
            .set_interrupt_type(InterruptType::AnyEdge)
            .map_err(ConfigError::Pin)?;
        pin_b
            .set_interrupt_type(InterruptType::AnyEdge)
            .map_err(ConfigError::Pin)?;

        // The pins' current levels become the starting phase; the first
        // real edge is then judged against reality, not an assumption.
        ctx.decoder.resync(pin_a.is_high(), pin_b.is_high());

        // Bind the pin numbers before any handler can fire.
        ctx.pin_a.store(pin_a.pin(), Ordering::Release);
        ctx.pin_b.store(pin_b.pin(), Ordering::Release);

        install_isr_service()?;

        let arg = ctx as *const EncoderIsrContext as *mut c_void;

        // SAFETY: ctx is 'static and the handler only touches atomics.
        unsafe {
            EspError::convert(sys::gpio_isr_handler_add(
                pin_a.pin(),
                Some(encoder_isr),
                arg,
            ))
            .map_err(ConfigError::Handler)?;

            if let Err(e) = EspError::convert(sys::gpio_isr_handler_add(
                pin_b.pin(),
                Some(encoder_isr),
                arg,
            )) {
                // Roll back channel A so a failed construction leaves no
                // handler behind.
                let _ = sys::gpio_isr_handler_remove(pin_a.pin());
                return Err(ConfigError::Handler(e));
            }
        }

        Ok(Self { pin_a, pin_b })
    }

    /// GPIO number of channel A.
    pub fn pin_a(&self) -> i32 {
        self.pin_a.pin()
    }

    /// GPIO number of channel B.
    pub fn pin_b(&self) -> i32 {
        self.pin_b.pin()
    }
}

impl Drop for EncoderDriver<'_> {
    fn drop(&mut self) {
        // Deregister before the pins are released; the ISR must never
        // run against freed state.
        unsafe {
            let _ = sys::gpio_isr_handler_remove(self.pin_a.pin());
            let _ = sys::gpio_isr_handler_remove(self.pin_b.pin());
        }
    }
}
