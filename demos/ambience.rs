//! Plays an ambient mix through the default audio device.
//!
//! Run with: cargo run --example ambience --features cpal_sink -- --voice pink=0.4 --voice sine=0.1 --cutoff 900
//!
//! Set `RUST_LOG=rauschen=debug` to watch voices being built and torn down.

use std::thread::sleep;
use std::time::{Duration, Instant};

use clap::Parser;
use rauschen::{CpalDevice, EngineConfig, EngineError, EngineState, OutputDevice, Transport, TransportState, VoiceKind};

#[derive(Parser)]
#[command(name = "ambience")]
#[command(about = "Procedural noise and drone ambience")]
struct Args {
    /// Voice volume as KIND=LEVEL (e.g. `pink=0.4`, `sawtooth=0.05`); repeatable
    #[arg(short, long = "voice", value_parser = parse_voice)]
    voices: Vec<(VoiceKind, f32)>,

    /// Master low-pass cutoff in Hz
    #[arg(short, long, default_value_t = 20_000.0)]
    cutoff: f32,

    /// Master low-pass resonance in dB
    #[arg(short, long, default_value_t = 0.0)]
    q: f32,

    /// Slowly sweep the cutoff between 200 Hz and the given cutoff
    #[arg(long)]
    sweep: bool,

    /// How long to play, in seconds
    #[arg(short, long, default_value_t = 30.0)]
    seconds: f32,

    /// List output devices and exit
    #[arg(long)]
    list: bool,
}

fn parse_voice(arg: &str) -> Result<(VoiceKind, f32), String> {
    let (kind, level) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=LEVEL, got `{arg}`"))?;
    let kind = kind.parse::<VoiceKind>().map_err(|err| err.to_string())?;
    let level = level.parse::<f32>().map_err(|err| format!("bad level `{level}`: {err}"))?;
    Ok((kind, level))
}

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.list {
        for (i, device) in CpalDevice::list_outputs().iter().enumerate() {
            println!("[{}] {} ({} Hz, {} ch)", i, device.name(), device.sample_rate(), device.channels());
        }
        return Ok(());
    }

    let device = CpalDevice::default_output()?;
    println!("Using: {} @ {} Hz", device.name(), device.sample_rate());
    let stats = device.stats();

    let mut state = EngineState::default();
    for (kind, level) in &args.voices {
        state.set_volume(*kind, *level);
    }
    if args.voices.is_empty() {
        state.set_volume(VoiceKind::PinkNoise, 0.3);
        state.set_volume(VoiceKind::Sine, 0.05);
    }
    state.filter.cutoff_hz = args.cutoff;
    state.filter.resonance = args.q;

    let mut transport = Transport::new(device, state, EngineConfig::default());
    transport.start()?;

    // The stream comes up on its own thread
    while transport.poll_startup()? != TransportState::Playing {
        sleep(Duration::from_millis(5));
    }

    println!("Playing for {} s... Ctrl+C to stop\n", args.seconds);

    let start = Instant::now();
    let rate = transport.device().sample_rate() as f64;
    let mut blocks = 0u64;

    while start.elapsed().as_secs_f32() < args.seconds {
        if args.sweep {
            let t = start.elapsed().as_secs_f32();
            let depth = 0.5 + 0.5 * (t * 0.1).sin();
            transport.set_cutoff(200.0 + (args.cutoff - 200.0).max(0.0) * depth);
        }

        // Process audio blocks to stay ahead of playback
        let target = (start.elapsed().as_secs_f64() * rate / 64.0) as u64 + 4;
        while blocks < target {
            transport.process();
            blocks += 1;
        }

        if stats.check_underrun() {
            tracing::warn!("output underrun");
        }

        sleep(Duration::from_millis(10));
    }

    transport.stop();
    println!("Played {} samples", stats.samples_consumed());
    Ok(())
}
