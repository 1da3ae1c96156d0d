//! Node configuration
//!
//! Everything a Brain needs to know about itself at boot. Values are plain
//! data; persistence and provisioning are left to the firmware around it.

use embassy_time::Duration;
use heapless::String;
use sparkle_net::{NodeId, RetryPolicy};

pub use sparkle_net::{BROADCAST, MAX_FRAME_LEN, MAX_OUTBOUND_PAYLOAD, OUTBOX_DEPTH};

/// Longest node name carried in hellos and id responses
pub const MAX_NAME_LEN: usize = 32;

/// Interval between presence announcements
pub const DEFAULT_HELLO_PERIOD: Duration = Duration::from_secs(5);

pub const DEFAULT_PIXEL_COUNT: u16 = 300;

pub const DEFAULT_FPS: u32 = sparkle_shader::renderer::DEFAULT_FPS;

pub const DEFAULT_NAME: &str = "brain";

// Hello payload is `name: str8, pixel_count: u16`
const _: () = assert!(1 + MAX_NAME_LEN + 2 <= MAX_OUTBOUND_PAYLOAD);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrainConfig {
    /// Address this node answers to
    pub node_id: NodeId,
    /// Human readable name, announced in hellos
    pub name: String<MAX_NAME_LEN>,
    /// Number of pixels driven by this node
    pub pixel_count: u16,
    pub fps: u32,
    pub hello_period: Duration,
    /// Where hellos are sent, broadcast by default
    pub hello_dest: NodeId,
    /// Policy for opening the transport in `start`
    pub open_retry: RetryPolicy,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            node_id: NodeId(0),
            name: truncated_name(DEFAULT_NAME),
            pixel_count: DEFAULT_PIXEL_COUNT,
            fps: DEFAULT_FPS,
            hello_period: DEFAULT_HELLO_PERIOD,
            hello_dest: BROADCAST,
            open_retry: RetryPolicy::default(),
        }
    }
}

impl BrainConfig {
    #[must_use]
    pub fn with_node_id(mut self, node_id: NodeId) -> Self {
        self.node_id = node_id;
        self
    }

    /// Set the name, cut to [`MAX_NAME_LEN`] bytes on a char boundary
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = truncated_name(name);
        self
    }

    #[must_use]
    pub fn with_pixel_count(mut self, pixel_count: u16) -> Self {
        self.pixel_count = pixel_count;
        self
    }

    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    #[must_use]
    pub fn with_hello(mut self, period: Duration, dest: NodeId) -> Self {
        self.hello_period = period;
        self.hello_dest = dest;
        self
    }

    #[must_use]
    pub fn with_open_retry(mut self, retry: RetryPolicy) -> Self {
        self.open_retry = retry;
        self
    }
}

fn truncated_name(name: &str) -> String<MAX_NAME_LEN> {
    let mut out = String::new();
    for ch in name.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}
