//! Decelerating Fan Simulation
//!
//! Generates a synthetic fan-blade recording after switch-off and writes it
//! as `time,signal,tacho` CSV to stdout.
//!
//! # Usage
//! ```bash
//! ./simulation --seed 42 | ./tsa-engine --stdin
//! ```

use clap::Parser;
use std::io::{self, BufWriter, Write};

use tsa_engine::simulation::FanDeceleration;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "simulation")]
#[command(about = "Synthetic decelerating fan signal for tsa-engine testing")]
#[command(version)]
struct Args {
    /// Sampling rate (Hz)
    #[arg(long, default_value_t = tsa_engine::config::defaults::SIM_SAMPLING_RATE_HZ)]
    sampling_rate: f64,

    /// Recording length (s)
    #[arg(short, long, default_value_t = tsa_engine::config::defaults::SIM_DURATION_S)]
    duration: f64,

    /// Rotation speed at switch-off (rpm)
    #[arg(long, default_value_t = tsa_engine::config::defaults::SIM_INITIAL_RPM)]
    rpm: f64,

    /// Blade displacement amplitude
    #[arg(long, default_value_t = tsa_engine::config::defaults::SIM_AMPLITUDE)]
    amplitude: f64,

    /// Speed decay time constant (s)
    #[arg(long, default_value_t = tsa_engine::config::defaults::SIM_DECAY_TIME_S)]
    decay_time: f64,

    /// Standard deviation of the measurement noise
    #[arg(long, default_value_t = tsa_engine::config::defaults::SIM_NOISE_STD)]
    noise_std: f64,

    /// Random seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Suppress the parameter summary on stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let fan = FanDeceleration {
        sampling_rate_hz: args.sampling_rate,
        duration_s: args.duration,
        initial_rpm: args.rpm,
        amplitude: args.amplitude,
        decay_time_s: args.decay_time,
        noise_std: args.noise_std,
        seed: args.seed,
    };

    let recording = fan.generate()?;

    if !args.quiet {
        eprintln!("DECELERATING FAN SIMULATION");
        eprintln!("  Samples: {} at {} Hz", recording.len(), fan.sampling_rate_hz);
        eprintln!("  Initial speed: {:.0} rpm, decay {:.2} s", fan.initial_rpm, fan.decay_time_s);
        eprintln!("  Complete rotations: {}", fan.rotations());
        if let Some(seed) = fan.seed {
            eprintln!("  Random seed: {seed}");
        }
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "time,signal,tacho")?;
    let tacho = recording.tacho.as_deref().unwrap_or_default();
    for (i, (t, s)) in recording.time.iter().zip(&recording.signal).enumerate() {
        let r = tacho.get(i).copied().unwrap_or(0.0);
        writeln!(out, "{t:.6},{s:.9},{r:.9}")?;
    }
    out.flush()?;

    Ok(())
}
