use rand::rngs::StdRng;
use rand::SeedableRng;
use rauschen::nodes::RtrbSink;
use rauschen::{
    Engine, EngineConfig, EngineError, EngineState, FilterSettings, MasterFilter, OfflineDevice,
    ParameterSmoother, StartOutcome, Transport, TransportState, Voice, VoiceKind,
};
use rtrb::Consumer;

const RATE: u32 = 48_000;

fn config() -> EngineConfig {
    // short loops keep the tests quick; seeded so failures reproduce
    EngineConfig::default().with_seed(42).with_noise_loop_seconds(0.25)
}

fn offline(state: EngineState) -> (Transport<OfflineDevice>, Consumer<f32>) {
    let (device, samples) = OfflineDevice::new(RATE);
    (Transport::new(device, state, config()), samples)
}

/// Render `blocks` blocks, discarding the audio
fn render(transport: &mut Transport<OfflineDevice>, samples: &mut Consumer<f32>, blocks: usize) {
    for _ in 0..blocks {
        transport.process();
        while samples.pop().is_ok() {}
    }
}

#[test]
fn create_then_destroy_returns_to_zero_for_every_kind() {
    let (producer, _consumer) = rtrb::RingBuffer::new(1024);
    let mut engine = Engine::new(RATE).with_output(RtrbSink::mono(producer));
    let filter = MasterFilter::create(&mut engine, &FilterSettings::default(), ParameterSmoother::default());
    let baseline = engine.node_count();
    let mut rng = StdRng::seed_from_u64(7);

    for kind in VoiceKind::ALL {
        let voice = Voice::create(kind, 0.3, &filter, &mut engine, &mut rng, &config());
        assert_eq!(voice.kind(), kind);
        voice.destroy(&mut engine);
        assert_eq!(engine.node_count(), baseline, "{kind} leaked nodes");
    }

    filter.destroy(&mut engine);
    assert_eq!(engine.node_count(), 0);
}

#[test]
fn start_twice_is_start_once() {
    let (mut transport, _samples) = offline(EngineState::default());

    assert_eq!(transport.start(), Ok(StartOutcome::Playing));
    let nodes = transport.live_nodes();
    assert_eq!(transport.start(), Ok(StartOutcome::Playing));

    assert_eq!(transport.live_voices(), 7);
    assert_eq!(transport.live_nodes(), nodes);
}

#[test]
fn stop_while_stopped_is_a_no_op() {
    let (mut transport, mut samples) = offline(EngineState::default());

    transport.stop();
    transport.stop();
    assert_eq!(transport.transport_state(), TransportState::Stopped);

    transport.start().unwrap();
    transport.stop();
    transport.stop();
    assert_eq!(transport.transport_state(), TransportState::Stopped);
    assert_eq!(transport.live_nodes(), 0);

    // the sink keeps running on silence
    render(&mut transport, &mut samples, 1);
    transport.process();
    assert!(std::iter::from_fn(|| samples.pop().ok()).all(|s| s == 0.0));
}

#[test]
fn volume_set_while_stopped_is_used_on_start() {
    let (mut transport, _samples) = offline(EngineState::default());

    transport.set_volume(VoiceKind::Sawtooth, 0.7);
    assert_eq!(transport.voice_gain(VoiceKind::Sawtooth), None);

    transport.start().unwrap();
    transport.process();

    assert_eq!(transport.voice_gain(VoiceKind::Sawtooth), Some(0.7));
    assert_eq!(transport.voice_gain(VoiceKind::Sine), Some(0.0));
}

#[test]
fn initial_state_is_respected() {
    let state = EngineState::default()
        .with_volume(VoiceKind::BrownNoise, 0.9)
        .with_filter(FilterSettings { cutoff_hz: 1_200.0, resonance: 4.0 });
    let (mut transport, _samples) = offline(state);

    transport.start().unwrap();
    transport.process();

    assert_eq!(transport.voice_gain(VoiceKind::BrownNoise), Some(0.9));
    assert_eq!(transport.filter_cutoff(), Some(1_200.0));
    assert_eq!(transport.filter_resonance(), Some(4.0));
}

#[test]
fn pink_volume_survives_a_restart() {
    let (mut transport, mut samples) = offline(EngineState::default());

    transport.start().unwrap();
    transport.set_volume(VoiceKind::PinkNoise, 0.5);
    render(&mut transport, &mut samples, 10);
    transport.stop();

    transport.start().unwrap();
    transport.process();

    // exact from the first block: the rebuilt gain starts at the stored value
    assert_eq!(transport.voice_gain(VoiceKind::PinkNoise), Some(0.5));
    assert_eq!(transport.volume(VoiceKind::PinkNoise), 0.5);
}

#[test]
fn cutoff_settles_within_five_time_constants() {
    let (mut transport, mut samples) = offline(EngineState::default());
    transport.start().unwrap();
    render(&mut transport, &mut samples, 1);

    transport.set_cutoff(500.0);
    render(&mut transport, &mut samples, 1);

    let first = transport.filter_cutoff().unwrap();
    assert!(first > 19_000.0, "cutoff jumped to {first} in one block");

    let mut previous = first;
    // 0.5 s at 48 kHz is 375 blocks of 64
    for _ in 0..380 {
        render(&mut transport, &mut samples, 1);
        let now = transport.filter_cutoff().unwrap();
        assert!(now <= previous, "cutoff went back up");
        previous = now;
    }

    assert!(previous >= 500.0);
    assert!(previous - 500.0 < 19_500.0 * 0.01, "still at {previous}");
    assert_eq!(transport.engine_state().filter.cutoff_hz, 500.0);
}

#[test]
fn resonance_edits_ramp_the_live_filter() {
    let (mut transport, mut samples) = offline(EngineState::default());
    transport.start().unwrap();

    transport.set_resonance(6.0);
    render(&mut transport, &mut samples, 1);
    let early = transport.filter_resonance().unwrap();
    assert!(early > 0.0 && early < 1.0);

    render(&mut transport, &mut samples, 400);
    assert!((transport.filter_resonance().unwrap() - 6.0).abs() < 0.1);
}

#[test]
fn ramps_land_on_the_stored_values() {
    let (mut transport, mut samples) = offline(EngineState::default());
    transport.start().unwrap();

    transport.set_cutoff(500.0);
    transport.set_resonance(6.0);
    transport.set_volume(VoiceKind::Triangle, 0.8);
    // 3 s
    render(&mut transport, &mut samples, 2_250);

    assert_eq!(transport.filter_cutoff(), Some(500.0));
    assert_eq!(transport.filter_resonance(), Some(6.0));
    assert_eq!(transport.voice_gain(VoiceKind::Triangle), Some(0.8));
}

#[test]
fn unavailable_device_leaves_everything_stopped() {
    let device = OfflineDevice::unavailable(RATE);
    let mut transport = Transport::new(device, EngineState::default(), config());

    let err = transport.start().unwrap_err();
    assert!(matches!(err, EngineError::DeviceUnavailable(_)));
    assert_eq!(transport.transport_state(), TransportState::Stopped);
    assert_eq!(transport.live_voices(), 0);
    assert_eq!(transport.live_nodes(), 0);

    // each attempt reports again
    assert!(transport.start().is_err());
}

#[test]
fn pending_start_completes_when_the_device_is_ready() {
    let (device, _samples, gate) = OfflineDevice::gated(RATE);
    let mut transport = Transport::new(device, EngineState::default(), config());

    assert_eq!(transport.start(), Ok(StartOutcome::Pending));
    assert!(transport.is_starting());
    assert_eq!(transport.poll_startup(), Ok(TransportState::Stopped));

    // edits made while waiting are picked up by the build
    transport.set_volume(VoiceKind::Triangle, 0.2);
    gate.open();

    assert_eq!(transport.poll_startup(), Ok(TransportState::Playing));
    assert!(!transport.is_starting());
    transport.process();
    assert_eq!(transport.voice_gain(VoiceKind::Triangle), Some(0.2));
}

#[test]
fn stop_during_startup_never_resurrects_the_graph() {
    let (device, _samples, gate) = OfflineDevice::gated(RATE);
    let mut transport = Transport::new(device, EngineState::default(), config());

    transport.start().unwrap();
    transport.stop();
    gate.open();

    assert_eq!(transport.poll_startup(), Ok(TransportState::Stopped));
    assert!(!transport.is_starting());
    assert_eq!(transport.live_voices(), 0);
    assert_eq!(transport.live_nodes(), 0);

    // a later start goes straight through
    assert_eq!(transport.start(), Ok(StartOutcome::Playing));
    assert_eq!(transport.live_voices(), 7);
}

#[test]
fn start_after_stop_request_revives_the_pending_start() {
    let (device, _samples, gate) = OfflineDevice::gated(RATE);
    let mut transport = Transport::new(device, EngineState::default(), config());

    transport.start().unwrap();
    transport.stop();
    assert_eq!(transport.start(), Ok(StartOutcome::Pending));
    gate.open();

    assert_eq!(transport.poll_startup(), Ok(TransportState::Playing));
}

#[test]
fn failed_activation_reports_once() {
    let (device, _samples, gate) = OfflineDevice::gated(RATE);
    let mut transport = Transport::new(device, EngineState::default(), config());

    transport.start().unwrap();
    gate.fail();

    assert!(matches!(transport.poll_startup(), Err(EngineError::DeviceUnavailable(_))));
    assert!(!transport.is_starting());
    assert_eq!(transport.transport_state(), TransportState::Stopped);
    assert_eq!(transport.poll_startup(), Ok(TransportState::Stopped));
}

#[test]
fn toggle_flips_between_states() {
    let (mut transport, _samples) = offline(EngineState::default());

    transport.toggle().unwrap();
    assert!(transport.is_playing());
    transport.toggle().unwrap();
    assert!(!transport.is_playing());
    assert_eq!(transport.live_nodes(), 0);
}

#[test]
fn playing_mix_is_audible_and_bounded() {
    let state = VoiceKind::ALL
        .into_iter()
        .fold(EngineState::default(), |state, kind| state.with_volume(kind, 0.3));
    let (mut transport, mut samples) = offline(state);
    transport.start().unwrap();

    for _ in 0..20 {
        transport.process();
    }
    let out: Vec<f32> = std::iter::from_fn(|| samples.pop().ok()).collect();

    assert_eq!(out.len(), 20 * 64);
    let peak = out.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    assert!(peak > 0.1 && peak < 7.0, "peak {peak}");
}

#[test]
fn ui_keys_parse_to_kinds() {
    assert_eq!("brown-noise".parse::<VoiceKind>(), Ok(VoiceKind::BrownNoise));
    assert!(matches!("drum".parse::<VoiceKind>(), Err(EngineError::InvalidVoiceKind(_))));
}
