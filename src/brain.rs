//! Brain - one lighting node
//!
//! Wires a [`MsgSlinger`] to a [`Renderer`]:
//! - the network activity receives configuration and hands it to
//!   [`BrainControl`], which builds shaders and publishes them,
//! - the render activity takes the latest published shader at a frame
//!   boundary, announces the node periodically and drives the LEDs.
//!
//! The two sides share nothing but the [`BrainChannels`].

use embassy_futures::join::join;
use embassy_time::{Duration, Instant};
use heapless::String;
use sparkle_net::{
    Msg, MsgHandler, MsgSlinger, MsgType, NodeId, OutboundMsg, Outbox, SlingerError,
    SlingerStats, StatsSnapshot, Transport,
    protocol::{BrainHello, BrainIdResponse, PinkyPong},
};
use sparkle_shader::{LedDriver, Rgb, Renderer, ShaderRegistry, ShaderSignal, ShaderSlot};
use thiserror::Error;

use crate::config::{BrainConfig, MAX_NAME_LEN};

/// Lifecycle of a [`Brain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainState {
    /// Built, transport closed, pipeline off
    Constructed,
    /// Transport open
    Started,
    /// Both activities running
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BrainError {
    #[error(transparent)]
    Slinger(#[from] SlingerError),
    #[error("not allowed while {0:?}")]
    InvalidState(BrainState),
}

/// State shared between the network and render activities
///
/// Usually placed in a `static`.
pub struct BrainChannels {
    /// Latest shader built from the network, taken by the renderer
    pub shader: ShaderSignal,
    pub outbox: Outbox,
    pub stats: SlingerStats,
}

impl Default for BrainChannels {
    fn default() -> Self {
        Self::new()
    }
}

impl BrainChannels {
    pub const fn new() -> Self {
        Self {
            shader: ShaderSignal::new(),
            outbox: Outbox::new(),
            stats: SlingerStats::new(),
        }
    }
}

/// Periodic presence announcement
pub struct HelloBeacon {
    period: Duration,
    last_sent: Option<Instant>,
    msg: OutboundMsg,
}

impl HelloBeacon {
    pub fn new(config: &BrainConfig) -> Self {
        let hello = BrainHello {
            name: &config.name,
            pixel_count: config.pixel_count,
        };
        let msg = OutboundMsg::build(MsgType::BrainHello, config.hello_dest, |w| hello.write_to(w))
            // Name length is bounded so the payload always fits
            .unwrap_or_else(|_| OutboundMsg::new(MsgType::BrainHello, config.hello_dest));
        Self {
            period: config.hello_period,
            last_sent: None,
            msg,
        }
    }

    /// Whether a hello is due at `now`; marks it sent if so
    pub fn due(&mut self, now: Instant) -> bool {
        let due = self
            .last_sent
            .is_none_or(|last| now.saturating_duration_since(last) >= self.period);
        if due {
            self.last_sent = Some(now);
        }
        due
    }

    /// Queue a hello on `outbox` if one is due. Returns true if one was queued.
    pub fn poll(&mut self, now: Instant, outbox: &Outbox) -> bool {
        if !self.due(now) {
            return false;
        }
        log::trace!("brain: hello to {}", self.msg.dest);
        outbox.enqueue(self.msg.clone())
    }

    pub fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }
}

/// Message handling side of a [`Brain`]
pub struct BrainControl<'a> {
    node_id: NodeId,
    name: String<MAX_NAME_LEN>,
    registry: ShaderRegistry,
    shader: &'a ShaderSignal,
    outbox: &'a Outbox,
    applied_configs: u32,
    rejected_configs: u32,
    pongs: u32,
    pinky: Option<NodeId>,
}

impl<'a> BrainControl<'a> {
    pub fn new(config: &BrainConfig, channels: &'a BrainChannels) -> Self {
        Self {
            node_id: config.node_id,
            name: config.name.clone(),
            registry: ShaderRegistry::builtin(),
            shader: &channels.shader,
            outbox: &channels.outbox,
            applied_configs: 0,
            rejected_configs: 0,
            pongs: 0,
            pinky: None,
        }
    }

    pub fn registry_mut(&mut self) -> &mut ShaderRegistry {
        &mut self.registry
    }

    /// Shader configurations that were built and published
    pub fn applied_configs(&self) -> u32 {
        self.applied_configs
    }

    /// Shader configurations that failed to build
    pub fn rejected_configs(&self) -> u32 {
        self.rejected_configs
    }

    /// Pongs that listed this node
    pub fn pongs(&self) -> u32 {
        self.pongs
    }

    /// Show controller that last acknowledged this node
    pub fn pinky(&self) -> Option<NodeId> {
        self.pinky
    }

    fn apply_shader(&mut self, payload: &[u8]) {
        match self.registry.build(payload) {
            Ok(shader) => {
                log::debug!(
                    "brain: new {} shader",
                    shader.shader_type().map_or("off", |t| t.as_str())
                );
                self.shader.signal(shader);
                self.applied_configs = self.applied_configs.wrapping_add(1);
            }
            Err(err) => {
                self.rejected_configs = self.rejected_configs.wrapping_add(1);
                log::warn!("brain: rejected shader config: {err}");
            }
        }
    }

    fn answer_id_request(&mut self, requester: NodeId) {
        let response = BrainIdResponse { name: &self.name };
        match OutboundMsg::build(MsgType::BrainIdResponse, requester, |w| response.write_to(w)) {
            Ok(msg) => {
                self.outbox.enqueue(msg);
            }
            Err(err) => log::warn!("brain: cannot build id response: {err}"),
        }
    }

    fn record_pong(&mut self, msg: &Msg<'_>) {
        match PinkyPong::parse(msg.payload()) {
            Ok(pong) if pong.contains(self.node_id) => {
                if self.pinky != Some(msg.source()) {
                    log::info!("brain: acknowledged by pinky {}", msg.source());
                }
                self.pinky = Some(msg.source());
                self.pongs = self.pongs.wrapping_add(1);
            }
            Ok(_) => {}
            Err(err) => log::debug!("brain: bad pong from {}: {err}", msg.source()),
        }
    }
}

impl MsgHandler for BrainControl<'_> {
    fn handle_msg(&mut self, msg: &Msg<'_>) {
        match msg.kind() {
            MsgType::BrainPanelShade => self.apply_shader(msg.payload()),
            MsgType::BrainIdRequest => self.answer_id_request(msg.source()),
            MsgType::PinkyPong => self.record_pong(msg),
            MsgType::BrainHello | MsgType::MapperHello | MsgType::BrainIdResponse => {
                log::debug!("brain: ignoring {} from {}", msg.kind().as_str(), msg.source());
            }
        }
    }
}

/// Brain - a lighting node
///
/// Generic over the network [`Transport`] and the [`LedDriver`].
pub struct Brain<'a, T: Transport, D: LedDriver> {
    state: BrainState,
    slinger: MsgSlinger<'a, T>,
    renderer: Renderer<'a, D>,
    control: BrainControl<'a>,
    hello: HelloBeacon,
    channels: &'a BrainChannels,
    /// Time of the first single-threaded cycle
    epoch: Option<Instant>,
}

impl<'a, T: Transport, D: LedDriver> Brain<'a, T, D> {
    pub fn new(config: BrainConfig, transport: T, driver: D, channels: &'a BrainChannels) -> Self {
        let slinger = MsgSlinger::new(
            transport,
            config.node_id,
            &channels.outbox,
            &channels.stats,
        )
        .with_retry_policy(config.open_retry);
        let mut renderer = Renderer::new(driver, &channels.shader, config.pixel_count);
        renderer.set_fps(config.fps);

        Self {
            state: BrainState::Constructed,
            slinger,
            renderer,
            control: BrainControl::new(&config, channels),
            hello: HelloBeacon::new(&config),
            channels,
            epoch: None,
        }
    }

    /// Replace the shader registry, e.g. to add custom shader types
    #[must_use]
    pub fn with_registry(mut self, registry: ShaderRegistry) -> Self {
        *self.control.registry_mut() = registry;
        self
    }

    pub fn state(&self) -> BrainState {
        self.state
    }

    /// Open the transport
    pub async fn start(&mut self) -> Result<(), BrainError> {
        if self.state != BrainState::Constructed {
            return Err(BrainError::InvalidState(self.state));
        }
        self.slinger.start().await?;
        self.state = BrainState::Started;
        log::info!(
            "brain: {} started with {} pixels",
            self.control.name,
            self.renderer.pixel_count()
        );
        Ok(())
    }

    /// Queue a hello if the hello period has passed since the last one
    pub fn maybe_send_hello(&mut self, now: Instant) -> bool {
        self.hello.poll(now, &self.channels.outbox)
    }

    /// One step for hosts with a single thread of control
    ///
    /// Delivers a bounded batch of ready inbound frames, announces the node if
    /// due, renders one frame and then sends what the transport will take
    /// without waiting. Never blocks on the transport and does not pace frames.
    pub async fn cycle(&mut self, now: Instant) -> Result<(), BrainError> {
        if self.state != BrainState::Started {
            return Err(BrainError::InvalidState(self.state));
        }
        self.slinger.poll_inbound(&mut self.control).await;
        self.maybe_send_hello(now);

        let epoch = *self.epoch.get_or_insert(now);
        self.renderer.render_frame(now.saturating_duration_since(epoch));

        self.slinger.flush_outbound().await;
        Ok(())
    }

    /// Outbound messages not yet handed to the transport
    pub fn pending_outbound(&self) -> usize {
        self.slinger.pending_outbound()
    }

    /// Run the network and render activities until the device stops
    ///
    /// Returns only if the Brain was not started.
    pub async fn run(&mut self) -> Result<(), BrainError> {
        if self.state != BrainState::Started {
            return Err(BrainError::InvalidState(self.state));
        }
        self.state = BrainState::Running;
        log::info!("brain: running");

        let Self {
            slinger,
            renderer,
            control,
            hello,
            channels,
            ..
        } = self;
        join(
            slinger.run(control),
            render_loop(renderer, hello, &channels.outbox),
        )
        .await;
        Ok(())
    }

    /// Pixel values of the last rendered frame
    pub fn frame(&self) -> &[Rgb] {
        self.renderer.frame()
    }

    pub fn active_shader(&self) -> &ShaderSlot {
        self.renderer.active()
    }

    pub fn control(&self) -> &BrainControl<'a> {
        &self.control
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.channels.stats.snapshot(&self.channels.outbox)
    }

    pub fn transport(&self) -> &T {
        self.slinger.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.slinger.transport_mut()
    }

    pub fn driver(&self) -> &D {
        self.renderer.driver()
    }
}

impl<T: Transport, D: LedDriver> MsgHandler for Brain<'_, T, D> {
    fn handle_msg(&mut self, msg: &Msg<'_>) {
        self.control.handle_msg(msg);
    }
}

async fn render_loop<D: LedDriver>(
    renderer: &mut Renderer<'_, D>,
    hello: &mut HelloBeacon,
    outbox: &Outbox,
) -> ! {
    loop {
        hello.poll(Instant::now(), outbox);
        renderer.tick().await;
    }
}
