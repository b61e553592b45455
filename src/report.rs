//! Run report: averaged waveforms plus summary statistics
//!
//! Written either as pretty JSON or as flat `method,index,time,phase,value`
//! CSV rows, one row per averaged sample.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::config::OutputFormat;
use crate::types::AveragedWaveform;

/// Outcome of one averaging run over a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsaReport {
    pub generated_at: DateTime<Utc>,
    /// Input description (file path or `<stdin>`)
    pub source: String,
    pub samples: usize,
    pub sampling_rate_hz: f64,
    /// Pulse detector that produced the markers
    pub detector: String,
    pub markers: usize,
    pub waveforms: Vec<WaveformSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformSummary {
    pub rms: f64,
    pub peak_to_peak: f64,
    #[serde(flatten)]
    pub waveform: AveragedWaveform,
}

impl From<AveragedWaveform> for WaveformSummary {
    fn from(waveform: AveragedWaveform) -> Self {
        Self {
            rms: waveform.rms(),
            peak_to_peak: waveform.peak_to_peak(),
            waveform,
        }
    }
}

impl TsaReport {
    pub fn new(
        source: impl Into<String>,
        samples: usize,
        sampling_rate_hz: f64,
        detector: impl Into<String>,
        markers: usize,
        waveforms: Vec<AveragedWaveform>,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            source: source.into(),
            samples,
            sampling_rate_hz,
            detector: detector.into(),
            markers,
            waveforms: waveforms.into_iter().map(WaveformSummary::from).collect(),
        }
    }

    pub fn write(&self, format: OutputFormat, out: &mut impl Write) -> io::Result<()> {
        match format {
            OutputFormat::Csv => self.write_csv(out),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, self)?;
                writeln!(out)
            }
        }
    }

    pub fn write_csv(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "method,index,time,phase,value")?;
        for summary in &self.waveforms {
            let waveform = &summary.waveform;
            let phase = waveform.normalized_phase();
            for (i, ((t, p), v)) in waveform
                .time_axis
                .iter()
                .zip(&phase)
                .zip(&waveform.values)
                .enumerate()
            {
                writeln!(out, "{},{i},{t:.9},{p:.6},{v:.9}", waveform.method)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AveragingMethod;

    fn sample_report() -> TsaReport {
        let waveform = AveragedWaveform {
            method: AveragingMethod::TimeDomain,
            values: vec![1.0, -1.0, 1.0, -1.0],
            time_axis: vec![0.0, 0.25, 0.5, 0.75],
            cycles_averaged: 3,
        };
        TsaReport::new("test.csv", 400, 4.0, "trough", 4, vec![waveform])
    }

    #[test]
    fn test_csv_rows() {
        let mut buf = Vec::new();
        sample_report().write(OutputFormat::Csv, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "method,index,time,phase,value");
        assert!(lines[2].starts_with("time_domain,1,0.250000000,0.250000,"));
    }

    #[test]
    fn test_json_contains_summary() {
        let report = sample_report();
        assert!((report.waveforms[0].rms - 1.0).abs() < 1e-12);
        assert!((report.waveforms[0].peak_to_peak - 2.0).abs() < 1e-12);

        let mut buf = Vec::new();
        report.write(OutputFormat::Json, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["markers"], 4);
        assert_eq!(value["waveforms"][0]["method"], "time_domain");
        assert_eq!(value["waveforms"][0]["cycles_averaged"], 3);
    }
}
