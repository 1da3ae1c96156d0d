#![cfg_attr(not(test), no_std)]

//! Sparkle Brain - firmware core of a networked LED node
//!
//! A Brain listens for shader configuration from the show controller,
//! renders the active shader onto its pixel strip every frame and announces
//! itself on the network. Hardware and network access come in through the
//! [`LedDriver`](sparkle_shader::LedDriver) and
//! [`Transport`](sparkle_net::Transport) traits.
//!
//! ```ignore
//! static CHANNELS: BrainChannels = BrainChannels::new();
//!
//! let config = BrainConfig::default().with_node_id(NodeId(0x0102)).with_name("panel-7");
//! let mut brain = Brain::new(config, udp, SmartLedsDriver::new(ws2812), &CHANNELS);
//! brain.start().await?;
//! brain.run().await?;
//! ```

pub mod brain;
pub mod config;

pub use brain::{Brain, BrainChannels, BrainControl, BrainError, BrainState, HelloBeacon};
pub use config::BrainConfig;
pub use sparkle_net::{Msg, MsgHandler, MsgType, NodeId, Transport};
pub use sparkle_shader::{LedDriver, Rgb, ShaderRegistry, ShaderSlot, SmartLedsDriver};
