//! CSV Replay Integration Test
//!
//! Exercises the path the `simulation | tsa-engine --stdin` pipe takes:
//! synthetic fan recording -> CSV text -> CsvSignalSource -> pulse detector
//! on the tacho channel -> both averaging methods -> report.

use std::io::{Cursor, Write};

use tsa_engine::acquisition::{
    detector_from_config, CsvSignalSource, PulseDetector, SignalRecording, TroughDetector,
};
use tsa_engine::config::{OutputFormat, TsaConfig};
use tsa_engine::processing::{average, FrequencyDomainOptions};
use tsa_engine::report::TsaReport;
use tsa_engine::simulation::FanDeceleration;
use tsa_engine::types::AveragingMethod;

fn simulated_fan(noise_std: f64) -> FanDeceleration {
    FanDeceleration {
        noise_std,
        seed: Some(42),
        ..Default::default()
    }
}

/// Render a recording the way the simulation binary does.
fn to_csv(recording: &SignalRecording) -> String {
    let mut out = Vec::new();
    writeln!(out, "time,signal,tacho").unwrap();
    let tacho = recording.tacho.as_ref().unwrap();
    for i in 0..recording.len() {
        writeln!(
            out,
            "{:.6},{:.9},{:.9}",
            recording.time[i], recording.signal[i], tacho[i]
        )
        .unwrap();
    }
    String::from_utf8(out).unwrap()
}

fn replay(noise_std: f64) -> (SignalRecording, Vec<usize>) {
    let generated = simulated_fan(noise_std).generate().unwrap();
    let recording = CsvSignalSource::read(Cursor::new(to_csv(&generated))).unwrap();
    assert_eq!(recording.len(), generated.len());

    let markers = TroughDetector::default().detect(recording.tacho.as_ref().unwrap());
    (recording, markers)
}

#[test]
fn tacho_troughs_mark_every_complete_rotation() {
    let fan = simulated_fan(0.0);
    let (recording, markers) = replay(0.0);

    // Rotation 0 sits on the first sample, which is not a trough
    assert_eq!(markers.len(), fan.rotations());
    assert!(markers.windows(2).all(|w| w[1] > w[0]));
    assert!(*markers.last().unwrap() < recording.len());

    // 40 Hz at 1 kHz: the first rotation closes after 25 samples
    assert_eq!(markers[0], 25);
}

#[test]
fn both_methods_recover_the_blade_amplitude() {
    let fan = simulated_fan(fan_noise());
    let (recording, markers) = replay(fan.noise_std);
    let signal = recording.to_sampled_signal(None).unwrap();
    assert!((signal.sampling_rate - fan.sampling_rate_hz).abs() < 1e-6);

    let longest = markers.windows(2).map(|w| w[1] - w[0]).max().unwrap();
    let shortest = markers.windows(2).map(|w| w[1] - w[0]).min().unwrap();

    for method in AveragingMethod::ALL {
        let waveform = average(&signal, &markers, method, &FrequencyDomainOptions::default()).unwrap();
        assert_eq!(waveform.cycles_averaged, markers.len() - 1);

        let expected_len = match method {
            AveragingMethod::TimeDomain => longest,
            AveragingMethod::FrequencyDomain => 2 * (shortest - 1),
        };
        assert_eq!(waveform.len(), expected_len, "{method}");

        // Each cycle starts at the blade crest
        assert!(
            (waveform.values[0] - fan.amplitude).abs() < 0.01,
            "{method}: first value {}",
            waveform.values[0]
        );
        assert!(
            (waveform.peak_to_peak() - 2.0 * fan.amplitude).abs() < 0.015,
            "{method}: peak-to-peak {}",
            waveform.peak_to_peak()
        );
        assert!(
            (waveform.rms() - fan.amplitude / 2f64.sqrt()).abs() < 0.005,
            "{method}: rms {}",
            waveform.rms()
        );
    }
}

#[test]
fn configured_pipeline_writes_csv_report() {
    let (recording, _) = replay(fan_noise());
    let config = TsaConfig::default();

    let detector = detector_from_config(&config.markers);
    let markers = detector.detect(recording.tacho.as_ref().unwrap());
    let signal = recording.to_sampled_signal(config.acquisition.sampling_rate_hz).unwrap();

    let waveforms: Vec<_> = config
        .averaging
        .methods
        .iter()
        .map(|&m| average(&signal, &markers, m, &config.frequency_domain_options()).unwrap())
        .collect();
    let total_points: usize = waveforms.iter().map(|w| w.len()).sum();

    let report = TsaReport::new(
        "<test>",
        signal.len(),
        signal.sampling_rate,
        detector.name(),
        markers.len(),
        waveforms,
    );

    let mut buf = Vec::new();
    report.write(OutputFormat::Csv, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert_eq!(text.lines().count(), total_points + 1);
    assert!(text.lines().nth(1).unwrap().starts_with("time_domain,0,"));
    assert!(text.lines().any(|l| l.starts_with("frequency_domain,0,")));
}

fn fan_noise() -> f64 {
    tsa_engine::config::defaults::SIM_NOISE_STD
}

#[test]
fn recording_loads_from_file() {
    let generated = FanDeceleration {
        duration_s: 0.25,
        seed: Some(3),
        ..Default::default()
    }
    .generate()
    .unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(to_csv(&generated).as_bytes()).unwrap();

    let loaded = CsvSignalSource::load(file.path()).unwrap();
    assert_eq!(loaded.len(), 250);
    assert!(loaded.tacho.is_some());
    let max_diff = loaded
        .signal
        .iter()
        .zip(&generated.signal)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    assert!(max_diff < 1e-8);
}
