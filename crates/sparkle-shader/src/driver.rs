//! LED Driver abstraction layer
//!
//! Keeps the renderer hardware-agnostic. Anything that can push a slice of
//! colors to a strip implements [`LedDriver`]; [`SmartLedsDriver`] adapts the
//! `smart-leds` ecosystem (WS2812 over RMT/SPI and friends).

use core::fmt::Debug;

use smart_leds::SmartLedsWrite;

use crate::Rgb;

/// Abstract LED driver trait
pub trait LedDriver {
    /// Write one rendered frame to the strip
    fn write(&mut self, colors: &[Rgb]);
}

impl<D: LedDriver + ?Sized> LedDriver for &mut D {
    fn write(&mut self, colors: &[Rgb]) {
        (**self).write(colors);
    }
}

/// [`LedDriver`] over any `smart_leds::SmartLedsWrite` backend
///
/// Write errors are logged and the frame is dropped; the next frame retries.
pub struct SmartLedsDriver<W> {
    writer: W,
    failed_writes: u32,
}

impl<W> SmartLedsDriver<W>
where
    W: SmartLedsWrite<Color = Rgb>,
    W::Error: Debug,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed_writes: 0,
        }
    }

    /// Number of frames the backend refused
    pub fn failed_writes(&self) -> u32 {
        self.failed_writes
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> LedDriver for SmartLedsDriver<W>
where
    W: SmartLedsWrite<Color = Rgb>,
    W::Error: Debug,
{
    fn write(&mut self, colors: &[Rgb]) {
        if let Err(err) = self.writer.write(colors.iter().copied()) {
            self.failed_writes = self.failed_writes.wrapping_add(1);
            log::warn!("driver: LED write failed: {err:?}");
        }
    }
}
