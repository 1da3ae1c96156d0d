//! Integration tests for the `Brain` node controller.

use std::{cell::Cell, collections::VecDeque, rc::Rc};

use embassy_futures::{
    block_on,
    select::{Either, select},
};
use embassy_time::{Duration, Instant, Timer};
use proptest::prelude::*;
use sparkle_brain::{
    Brain, BrainChannels, BrainConfig, BrainError, BrainState, LedDriver, Msg, MsgHandler,
    MsgType, NodeId, Rgb, ShaderSlot, Transport,
    config::BROADCAST,
};
use sparkle_net::{
    MAX_INBOUND_PER_POLL, MsgHeader, RetryPolicy, SlingerError,
    protocol::{BrainHello, BrainIdResponse, PinkyPong},
};
use sparkle_wire::WireWriter;

const ME: NodeId = NodeId(0x0042);
const PINKY: NodeId = NodeId(0x0001);

#[derive(Default)]
struct MockTransport {
    open_failures: u32,
    open_calls: u32,
    inbound: VecDeque<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    /// Sends never complete
    stall_sends: bool,
    /// Frame returned by every receive, without ever waiting
    flood: Option<Vec<u8>>,
}

impl MockTransport {
    fn deliver(&mut self, kind: MsgType, source: NodeId, dest: NodeId, payload: &[u8]) {
        self.inbound.push_back(frame(kind, source, dest, payload));
    }

    fn sent_of(&self, kind: MsgType) -> Vec<Msg<'_>> {
        self.sent
            .iter()
            .map(|f| Msg::decode(f).unwrap())
            .filter(|m| m.kind() == kind)
            .collect()
    }
}

impl Transport for MockTransport {
    type Error = &'static str;

    async fn open(&mut self) -> Result<(), Self::Error> {
        self.open_calls += 1;
        if self.open_calls <= self.open_failures {
            return Err("no link");
        }
        Ok(())
    }

    async fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        if self.stall_sends {
            core::future::pending::<()>().await;
        }
        self.sent.push(frame.to_vec());
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if let Some(frame) = &self.flood {
            buf[..frame.len()].copy_from_slice(frame);
            return Ok(frame.len());
        }
        match self.inbound.pop_front() {
            Some(frame) => {
                buf[..frame.len()].copy_from_slice(&frame);
                Ok(frame.len())
            }
            None => core::future::pending().await,
        }
    }
}

#[derive(Default)]
struct RecordingDriver {
    frames: Vec<Vec<Rgb>>,
}

impl LedDriver for RecordingDriver {
    fn write(&mut self, colors: &[Rgb]) {
        self.frames.push(colors.to_vec());
    }
}

/// Counts frames where the test can see them while the Brain owns the driver
#[derive(Default)]
struct CountingDriver {
    frames: Rc<Cell<u32>>,
}

impl LedDriver for CountingDriver {
    fn write(&mut self, _colors: &[Rgb]) {
        self.frames.set(self.frames.get() + 1);
    }
}

fn frame(kind: MsgType, source: NodeId, dest: NodeId, payload: &[u8]) -> Vec<u8> {
    let header = MsgHeader { kind, source, dest };
    Msg::new(header, payload)
        .encode::<512>()
        .unwrap()
        .as_bytes()
        .to_vec()
}

fn shade(payload: &[u8]) -> Vec<u8> {
    frame(MsgType::BrainPanelShade, PINKY, ME, payload)
}

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb { r, g, b }
}

fn config(pixels: u16) -> BrainConfig {
    BrainConfig::default()
        .with_node_id(ME)
        .with_name("panel-7")
        .with_pixel_count(pixels)
        .with_open_retry(RetryPolicy::immediate(3))
}

fn started(
    channels: &BrainChannels,
    pixels: u16,
) -> Brain<'_, MockTransport, RecordingDriver> {
    let mut brain = Brain::new(
        config(pixels),
        MockTransport::default(),
        RecordingDriver::default(),
        channels,
    );
    block_on(brain.start()).unwrap();
    brain
}

fn started_counting(
    channels: &BrainChannels,
    transport: MockTransport,
) -> (Brain<'_, MockTransport, CountingDriver>, Rc<Cell<u32>>) {
    let driver = CountingDriver::default();
    let frames = Rc::clone(&driver.frames);
    let mut brain = Brain::new(config(4), transport, driver, channels);
    block_on(brain.start()).unwrap();
    (brain, frames)
}

/// Drive `Brain::run` until the driver has seen `count` frames or one second
/// has passed; returns the frames seen
fn run_until_frames(
    brain: &mut Brain<'_, MockTransport, CountingDriver>,
    frames: &Cell<u32>,
    count: u32,
) -> u32 {
    let wait = async {
        for _ in 0..200 {
            if frames.get() >= count {
                break;
            }
            Timer::after(Duration::from_millis(5)).await;
        }
        frames.get()
    };
    match block_on(select(brain.run(), wait)) {
        Either::First(result) => panic!("run returned: {result:?}"),
        Either::Second(seen) => seen,
    }
}

fn run_cycle(brain: &mut Brain<'_, MockTransport, RecordingDriver>, ms: u64) {
    block_on(brain.cycle(at(ms))).unwrap();
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

#[test]
fn new_brain_is_constructed_and_dark() {
    let channels = BrainChannels::new();
    let brain = Brain::new(
        config(8),
        MockTransport::default(),
        RecordingDriver::default(),
        &channels,
    );

    assert_eq!(brain.state(), BrainState::Constructed);
    assert_eq!(brain.active_shader(), &ShaderSlot::Off);
    assert_eq!(brain.frame(), &[Rgb::default(); 8]);
}

#[test]
fn start_opens_transport() {
    let channels = BrainChannels::new();
    let brain = started(&channels, 8);

    assert_eq!(brain.state(), BrainState::Started);
    assert_eq!(brain.transport().open_calls, 1);
}

#[test]
fn start_fails_after_bounded_retries() {
    let channels = BrainChannels::new();
    let transport = MockTransport {
        open_failures: u32::MAX,
        ..MockTransport::default()
    };
    let mut brain = Brain::new(config(8), transport, RecordingDriver::default(), &channels);

    assert_eq!(
        block_on(brain.start()),
        Err(BrainError::Slinger(SlingerError::TransportOpenFailed { attempts: 3 }))
    );
    assert_eq!(brain.state(), BrainState::Constructed);
    assert_eq!(brain.transport().open_calls, 3);
}

#[test]
fn cycle_and_restart_are_rejected_in_wrong_state() {
    let channels = BrainChannels::new();
    let mut brain = Brain::new(
        config(8),
        MockTransport::default(),
        RecordingDriver::default(),
        &channels,
    );

    assert_eq!(
        block_on(brain.cycle(at(0))),
        Err(BrainError::InvalidState(BrainState::Constructed))
    );

    block_on(brain.start()).unwrap();
    assert_eq!(
        block_on(brain.start()),
        Err(BrainError::InvalidState(BrainState::Started))
    );
}

// -----------------------------------------------------------------------------
// Shader configuration
// -----------------------------------------------------------------------------

#[test]
fn solid_configuration_fills_every_pixel() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 8);

    brain.transport_mut().inbound.push_back(shade(&[0, 0x2A, 0x00, 0xFF]));
    run_cycle(&mut brain, 0);

    assert_eq!(brain.frame(), &[rgb(42, 0, 255); 8]);
    assert_eq!(brain.driver().frames.last().unwrap(), &vec![rgb(42, 0, 255); 8]);
    assert_eq!(brain.control().applied_configs(), 1);
}

#[test]
fn truncated_configuration_keeps_previous_shader() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 8);

    brain.transport_mut().inbound.push_back(shade(&[0, 10, 10, 10]));
    run_cycle(&mut brain, 0);
    brain.transport_mut().inbound.push_back(shade(&[0, 0x2A, 0x00]));
    run_cycle(&mut brain, 16);

    assert_eq!(brain.frame(), &[rgb(10, 10, 10); 8]);
    assert_eq!(brain.control().rejected_configs(), 1);
}

#[test]
fn unknown_shader_type_keeps_previous_shader() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 4);

    brain.transport_mut().inbound.push_back(shade(&[0, 1, 2, 3]));
    run_cycle(&mut brain, 0);
    brain.transport_mut().inbound.push_back(shade(&[0x7F, 9, 9, 9]));
    run_cycle(&mut brain, 16);

    assert_eq!(brain.frame(), &[rgb(1, 2, 3); 4]);
    assert_eq!(brain.control().rejected_configs(), 1);
}

#[test]
fn latest_configuration_in_a_cycle_wins() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 3);

    brain.transport_mut().inbound.push_back(shade(&[0, 1, 1, 1]));
    brain.transport_mut().inbound.push_back(shade(&[0, 2, 2, 2]));
    run_cycle(&mut brain, 0);

    assert_eq!(brain.frame(), &[rgb(2, 2, 2); 3]);
    assert_eq!(brain.driver().frames.len(), 1);
}

#[test]
fn compositor_configuration_over_the_network() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 4);

    // Two explicit pixels added on top of a dim solid; the rest pass the
    // (black) previous frame through
    let payload = [
        3, // compositor
        0, 10, 10, 10, // A: solid
        1, 0, 2, 100, 0, 0, 0, 100, 0, // B: pixel, two colors
        1,   // add
        255, // full fade
    ];
    brain.transport_mut().inbound.push_back(shade(&payload));
    run_cycle(&mut brain, 0);

    assert_eq!(
        brain.frame(),
        &[rgb(110, 10, 10), rgb(10, 110, 10), rgb(10, 10, 10), rgb(10, 10, 10)]
    );
}

#[test]
fn messages_can_be_handled_without_a_transport() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 2);
    let raw = shade(&[0, 5, 6, 7]);

    brain.handle_msg(&Msg::decode(&raw).unwrap());
    run_cycle(&mut brain, 0);

    assert_eq!(brain.frame(), &[rgb(5, 6, 7); 2]);
}

// -----------------------------------------------------------------------------
// Network behaviour
// -----------------------------------------------------------------------------

#[test]
fn hello_is_sent_at_most_once_per_period() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 8);

    for ms in [0, 16, 1_000, 4_999] {
        run_cycle(&mut brain, ms);
    }
    assert_eq!(brain.transport().sent_of(MsgType::BrainHello).len(), 1);

    run_cycle(&mut brain, 5_000);
    run_cycle(&mut brain, 5_016);

    let hellos = brain.transport().sent_of(MsgType::BrainHello);
    assert_eq!(hellos.len(), 2);
    assert_eq!(hellos[0].source(), ME);
    assert_eq!(hellos[0].dest(), BROADCAST);
    assert_eq!(
        BrainHello::parse(hellos[0].payload()),
        Ok(BrainHello {
            name: "panel-7",
            pixel_count: 8
        })
    );
}

#[test]
fn maybe_send_hello_queues_without_sending() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 8);

    assert!(brain.maybe_send_hello(at(100)));
    assert!(!brain.maybe_send_hello(at(200)));

    assert_eq!(channels.outbox.len(), 1);
    assert!(brain.transport().sent.is_empty());
}

#[test]
fn hello_goes_to_configured_destination() {
    let channels = BrainChannels::new();
    let config = config(8).with_hello(Duration::from_secs(60), PINKY);
    let mut brain = Brain::new(
        config,
        MockTransport::default(),
        RecordingDriver::default(),
        &channels,
    );
    block_on(brain.start()).unwrap();

    run_cycle(&mut brain, 0);
    run_cycle(&mut brain, 59_999);

    let hellos = brain.transport().sent_of(MsgType::BrainHello);
    assert_eq!(hellos.len(), 1);
    assert_eq!(hellos[0].dest(), PINKY);
}

#[test]
fn id_request_is_answered_with_name() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 8);
    let requester = NodeId(0x0777);

    brain
        .transport_mut()
        .deliver(MsgType::BrainIdRequest, requester, ME, &[]);
    run_cycle(&mut brain, 0);

    let responses = brain.transport().sent_of(MsgType::BrainIdResponse);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].dest(), requester);
    assert_eq!(
        BrainIdResponse::parse(responses[0].payload()),
        Ok(BrainIdResponse { name: "panel-7" })
    );
}

#[test]
fn pong_listing_this_node_is_recorded() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 8);
    let mut ids = WireWriter::<16>::new();
    PinkyPong::write_ids(&[NodeId(3), ME], &mut ids).unwrap();
    let mut others = WireWriter::<16>::new();
    PinkyPong::write_ids(&[NodeId(3)], &mut others).unwrap();

    brain
        .transport_mut()
        .deliver(MsgType::PinkyPong, PINKY, BROADCAST, others.as_bytes());
    run_cycle(&mut brain, 0);
    assert_eq!(brain.control().pinky(), None);

    brain
        .transport_mut()
        .deliver(MsgType::PinkyPong, PINKY, BROADCAST, ids.as_bytes());
    run_cycle(&mut brain, 16);
    assert_eq!(brain.control().pinky(), Some(PINKY));
    assert_eq!(brain.control().pongs(), 1);
}

#[test]
fn bad_frames_are_dropped_and_counted() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 2);

    brain.transport_mut().inbound.extend([
        vec![1, 0, 1],
        vec![0xEE, 0, 1, 0, 0x42, 0, 1, 2, 3],
        frame(MsgType::BrainPanelShade, PINKY, NodeId(0x0043), &[0, 9, 9, 9]),
        shade(&[0, 4, 4, 4]),
    ]);
    run_cycle(&mut brain, 0);

    let stats = brain.stats();
    assert_eq!(stats.received, 4);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.unknown_type, 1);
    assert_eq!(stats.not_for_us, 1);
    assert_eq!(stats.delivered, 1);
    assert_eq!(brain.frame(), &[rgb(4, 4, 4); 2]);
}

#[test]
fn ignored_message_types_change_nothing() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 2);

    brain
        .transport_mut()
        .deliver(MsgType::MapperHello, PINKY, BROADCAST, &[1]);
    brain
        .transport_mut()
        .deliver(MsgType::BrainHello, NodeId(7), BROADCAST, &[0, 0, 0]);
    run_cycle(&mut brain, 0);

    assert_eq!(brain.stats().delivered, 2);
    assert_eq!(brain.active_shader(), &ShaderSlot::Off);
    assert_eq!(brain.control().rejected_configs(), 0);
}

// -----------------------------------------------------------------------------
// Rendering under transport load
// -----------------------------------------------------------------------------

#[test]
fn cycle_renders_while_sends_are_stalled() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 4);
    brain.transport_mut().stall_sends = true;
    brain
        .transport_mut()
        .deliver(MsgType::BrainIdRequest, PINKY, ME, &[]);

    for ms in [0, 16, 32] {
        run_cycle(&mut brain, ms);
    }
    assert_eq!(brain.driver().frames.len(), 3);
    assert!(brain.transport().sent.is_empty());
    // Hello and the id response, one of them held by the slinger
    assert_eq!(brain.pending_outbound(), 2);

    brain.transport_mut().stall_sends = false;
    run_cycle(&mut brain, 48);

    assert_eq!(brain.driver().frames.len(), 4);
    assert_eq!(brain.transport().sent_of(MsgType::BrainHello).len(), 1);
    assert_eq!(brain.transport().sent_of(MsgType::BrainIdResponse).len(), 1);
    assert_eq!(brain.pending_outbound(), 0);
    assert_eq!(brain.stats().send_failed, 0);
}

#[test]
fn flooded_link_cannot_starve_a_cycle() {
    let channels = BrainChannels::new();
    let mut brain = started(&channels, 4);
    brain.transport_mut().flood = Some(frame(MsgType::MapperHello, PINKY, BROADCAST, &[]));

    run_cycle(&mut brain, 0);
    run_cycle(&mut brain, 16);

    let per_poll = u32::try_from(MAX_INBOUND_PER_POLL).unwrap();
    assert_eq!(brain.stats().received, 2 * per_poll);
    assert_eq!(brain.driver().frames.len(), 2);
    assert_eq!(brain.transport().sent_of(MsgType::BrainHello).len(), 1);
}

#[test]
fn run_serves_the_network_and_renders() {
    let channels = BrainChannels::new();
    let mut transport = MockTransport::default();
    transport.inbound.push_back(shade(&[0, 7, 8, 9]));
    let (mut brain, frames) = started_counting(&channels, transport);

    assert!(run_until_frames(&mut brain, &frames, 3) >= 3);

    assert_eq!(brain.state(), BrainState::Running);
    assert_eq!(brain.frame(), &[rgb(7, 8, 9); 4]);
    assert_eq!(brain.control().applied_configs(), 1);
    assert_eq!(brain.transport().sent_of(MsgType::BrainHello).len(), 1);
}

#[test]
fn run_keeps_rendering_while_a_send_is_stalled() {
    let channels = BrainChannels::new();
    let transport = MockTransport {
        stall_sends: true,
        ..MockTransport::default()
    };
    let (mut brain, frames) = started_counting(&channels, transport);

    assert!(run_until_frames(&mut brain, &frames, 3) >= 3);
    assert!(brain.transport().sent.is_empty());
}

#[test]
fn run_keeps_rendering_while_the_link_is_flooded() {
    let channels = BrainChannels::new();
    let transport = MockTransport {
        flood: Some(frame(MsgType::MapperHello, PINKY, BROADCAST, &[])),
        ..MockTransport::default()
    };
    let (mut brain, frames) = started_counting(&channels, transport);

    assert!(run_until_frames(&mut brain, &frames, 3) >= 3);
    assert!(brain.stats().received > 0);
}

#[test]
fn run_requires_a_started_brain() {
    let channels = BrainChannels::new();
    let mut brain = Brain::new(
        config(4),
        MockTransport::default(),
        RecordingDriver::default(),
        &channels,
    );

    assert_eq!(
        block_on(brain.run()),
        Err(BrainError::InvalidState(BrainState::Constructed))
    );
}

// -----------------------------------------------------------------------------
// Properties
// -----------------------------------------------------------------------------

proptest! {
    #[test]
    fn any_solid_payload_fills_the_strip(payload in any::<[u8; 3]>(), pixels in 1u16..64) {
        let channels = BrainChannels::new();
        let mut brain = started(&channels, pixels);
        let mut config = vec![0];
        config.extend_from_slice(&payload);

        brain.handle_msg(&Msg::decode(&shade(&config)).unwrap());
        run_cycle(&mut brain, 0);

        let expected = rgb(payload[0], payload[1], payload[2]);
        prop_assert_eq!(brain.frame().len(), usize::from(pixels));
        prop_assert!(brain.frame().iter().all(|p| *p == expected));
    }

    #[test]
    fn short_solid_payload_is_never_installed(len in 0usize..3) {
        let channels = BrainChannels::new();
        let mut brain = started(&channels, 4);
        let config: Vec<u8> = std::iter::once(0).chain(std::iter::repeat_n(200, len)).collect();

        brain.handle_msg(&Msg::decode(&shade(&config)).unwrap());
        run_cycle(&mut brain, 0);

        prop_assert_eq!(brain.active_shader(), &ShaderSlot::Off);
        prop_assert_eq!(brain.control().rejected_configs(), 1);
    }
}
