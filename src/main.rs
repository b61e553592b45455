//! TSA Engine - Main Entry Point
//!
//! Reads a recording, detects cycle-start markers on the reference channel,
//! runs the configured averaging methods and writes the averaged cycle.
//!
//! ```bash
//! ./tsa-engine --csv recording.csv --method both --format json
//! ./simulation --seed 42 | ./tsa-engine --stdin
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use tsa_engine::acquisition::{
    detector_from_config, CsvSignalSource, DetectorKind, MarkerChannel, SignalRecording,
};
use tsa_engine::config::{OutputFormat, TsaConfig};
use tsa_engine::processing::{average, FrequencyDomainOptions, TsaError};
use tsa_engine::report::TsaReport;
use tsa_engine::types::{AveragedWaveform, AveragingMethod, SampledSignal};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "tsa-engine")]
#[command(about = "Time-synchronous averaging of cyclic machine signals")]
#[command(version)]
struct CliArgs {
    /// Read the recording from a CSV file
    #[arg(long, value_name = "PATH", conflicts_with = "stdin", required_unless_present = "stdin")]
    csv: Option<PathBuf>,

    /// Read the recording as CSV from stdin
    #[arg(long)]
    stdin: bool,

    /// Averaging method(s) to run (overrides [averaging] methods)
    #[arg(long, value_enum)]
    method: Option<MethodArg>,

    /// Channel the markers are detected on (tacho | signal)
    #[arg(long)]
    channel: Option<MarkerChannel>,

    /// Pulse detector (trough | threshold)
    #[arg(long)]
    detector: Option<DetectorKind>,

    /// Minimum spacing between cycle starts for the trough detector (samples)
    #[arg(long, value_name = "SAMPLES")]
    min_distance: Option<usize>,

    /// Output format (csv | json)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Config file (default: $TSA_CONFIG, then ./tsa_config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Sampling rate in Hz (default: inferred from the time column)
    #[arg(long, value_name = "HZ")]
    sampling_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Time,
    Frequency,
    Both,
}

impl MethodArg {
    fn methods(self) -> Vec<AveragingMethod> {
        match self {
            Self::Time => vec![AveragingMethod::TimeDomain],
            Self::Frequency => vec![AveragingMethod::FrequencyDomain],
            Self::Both => AveragingMethod::ALL.to_vec(),
        }
    }
}

impl CliArgs {
    /// Fold command-line overrides into the loaded config.
    fn apply_overrides(&self, config: &mut TsaConfig) {
        if let Some(method) = self.method {
            config.averaging.methods = method.methods();
        }
        if let Some(channel) = self.channel {
            config.acquisition.channel = channel;
        }
        if let Some(detector) = self.detector {
            config.markers.detector = detector;
        }
        if let Some(distance) = self.min_distance {
            config.markers.min_distance_samples = distance;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.sampling_rate.is_some() {
            config.acquisition.sampling_rate_hz = self.sampling_rate;
        }
    }
}

// ============================================================================
// Pipeline Steps
// ============================================================================

fn read_recording(args: &CliArgs) -> Result<(SignalRecording, String)> {
    if let Some(path) = &args.csv {
        let recording = CsvSignalSource::load(path)
            .with_context(|| format!("Failed to load recording {}", path.display()))?;
        return Ok((recording, path.display().to_string()));
    }
    if args.stdin {
        let recording = CsvSignalSource::read(io::stdin().lock())
            .context("Failed to read recording from stdin")?;
        info!(samples = recording.len(), "Recording read from stdin");
        return Ok((recording, "<stdin>".to_string()));
    }
    bail!("No input given: pass --csv <path> or --stdin")
}

fn marker_channel(recording: &SignalRecording, channel: MarkerChannel) -> &[f64] {
    match (channel, recording.tacho.as_deref()) {
        (MarkerChannel::Tacho, Some(tacho)) => tacho,
        (MarkerChannel::Tacho, None) => {
            warn!("Recording has no tacho column, detecting markers on the signal");
            &recording.signal
        }
        (MarkerChannel::Signal, _) => &recording.signal,
    }
}

/// Run every requested method; a pair runs on two rayon workers.
fn run_methods(
    signal: &SampledSignal,
    markers: &[usize],
    methods: &[AveragingMethod],
    options: &FrequencyDomainOptions,
) -> Result<Vec<AveragedWaveform>, TsaError> {
    match methods {
        [first, second] => {
            let (a, b) = rayon::join(
                || average(signal, markers, *first, options),
                || average(signal, markers, *second, options),
            );
            Ok(vec![a?, b?])
        }
        _ => methods
            .iter()
            .map(|&method| average(signal, markers, method, options))
            .collect(),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => TsaConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TsaConfig::load(),
    };
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    let (recording, source) = read_recording(&args)?;
    let signal = recording
        .to_sampled_signal(config.acquisition.sampling_rate_hz)
        .context("Recording is not a valid sampled signal")?;
    info!(
        samples = signal.len(),
        sampling_rate_hz = signal.sampling_rate,
        duration_s = signal.duration(),
        "Signal ready"
    );

    let detector = detector_from_config(&config.markers);
    let markers = detector.detect(marker_channel(&recording, config.acquisition.channel));
    info!(detector = detector.name(), markers = markers.len(), "Cycle starts detected");
    debug!(?markers, "Marker indices");

    let waveforms = run_methods(
        &signal,
        &markers,
        &config.averaging.methods,
        &config.frequency_domain_options(),
    )
    .context("Averaging failed")?;

    for waveform in &waveforms {
        info!(
            method = %waveform.method,
            cycles = waveform.cycles_averaged,
            points = waveform.len(),
            rms = waveform.rms(),
            "Averaged cycle computed"
        );
    }

    let report = TsaReport::new(
        source,
        signal.len(),
        signal.sampling_rate,
        detector.name(),
        markers.len(),
        waveforms,
    );

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    report
        .write(config.output.format, &mut out)
        .context("Failed to write report")?;
    out.flush()?;

    if let Some(path) = &args.output {
        info!(path = %path.display(), format = ?config.output.format, "Report written");
    }

    Ok(())
}
