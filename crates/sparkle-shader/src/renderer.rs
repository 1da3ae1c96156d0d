//! Frame renderer
//!
//! Owns the frame buffer and the active shader. Replacement shaders arrive
//! through a [`ShaderSignal`] and are taken only between frames, so every
//! frame is rendered entirely by one shader.

use alloc::{vec, vec::Vec};

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::{Duration, Instant, Timer};

use crate::{
    LedDriver, Rgb,
    shader::{FrameContext, ShaderSlot, run_pass},
};

/// Default frames per second
pub const DEFAULT_FPS: u32 = 60;

/// Latest-value slot a new shader is published through
pub type ShaderSignal = Signal<CriticalSectionRawMutex, ShaderSlot>;

/// Renderer - applies the active shader to the frame buffer once per frame
///
/// Generic over `D: LedDriver` to support different hardware backends.
pub struct Renderer<'a, D: LedDriver> {
    driver: D,
    /// Replacement published by the network side
    pending: &'a ShaderSignal,
    active: ShaderSlot,
    frame: Vec<Rgb>,
    pixel_count: u16,
    frame_index: u32,
    frame_duration: Duration,
    /// Set on the first paced frame
    start_time: Option<Instant>,
}

impl<'a, D: LedDriver> Renderer<'a, D> {
    pub fn new(driver: D, pending: &'a ShaderSignal, pixel_count: u16) -> Self {
        Self {
            driver,
            pending,
            active: ShaderSlot::Off,
            frame: vec![Rgb::default(); usize::from(pixel_count)],
            pixel_count,
            frame_index: 0,
            frame_duration: frame_duration(DEFAULT_FPS),
            start_time: None,
        }
    }

    /// Set the target frame rate
    pub fn set_fps(&mut self, fps: u32) {
        self.frame_duration = frame_duration(fps);
    }

    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Install the most recently published shader, if any
    ///
    /// Returns true when the active shader changed.
    pub fn take_pending(&mut self) -> bool {
        match self.pending.try_take() {
            Some(shader) => {
                log::debug!(
                    "renderer: installing {} shader",
                    shader.shader_type().map_or("off", |t| t.as_str())
                );
                self.active = shader;
                true
            }
            None => false,
        }
    }

    /// Render and output one frame at `elapsed` since the first frame
    pub fn render_frame(&mut self, elapsed: Duration) {
        self.take_pending();

        let ctx = FrameContext {
            frame: self.frame_index,
            elapsed,
            pixel_count: self.pixel_count,
        };
        run_pass(&mut self.active, &ctx, &mut self.frame);
        self.frame_index = self.frame_index.wrapping_add(1);

        self.driver.write(&self.frame);
    }

    /// Process one paced frame
    pub async fn tick(&mut self) {
        let frame_start = Instant::now();
        let start = *self.start_time.get_or_insert(frame_start);

        self.render_frame(frame_start.saturating_duration_since(start));

        // Wait for frame timing
        let render_time = frame_start.elapsed();
        if render_time < self.frame_duration {
            Timer::after(self.frame_duration - render_time).await;
        }
    }

    /// Pixel values produced by the last frame
    pub fn frame(&self) -> &[Rgb] {
        &self.frame
    }

    pub fn active(&self) -> &ShaderSlot {
        &self.active
    }

    pub fn frames_rendered(&self) -> u32 {
        self.frame_index
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn pixel_count(&self) -> u16 {
        self.pixel_count
    }
}

fn frame_duration(fps: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(fps.max(1)))
}
