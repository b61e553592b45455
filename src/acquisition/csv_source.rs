//! CSV Signal Source
//!
//! Reads `time,signal[,tacho]` recordings, as written by the `simulation`
//! binary: `./simulation | ./tsa-engine --stdin`.
//!
//! A header row is optional. When present, columns are matched by name
//! (`time`/`t`, `signal`/`value`/`y`, `tacho`/`reference`/`ref`); without one
//! the column order above is assumed. Blank lines and `#` comments are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::processing::TsaError;
use crate::types::SampledSignal;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Header has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("Recording contains no samples")]
    Empty,

    #[error("Cannot infer sampling rate: {0}")]
    SamplingRate(String),

    #[error(transparent)]
    Signal(#[from] TsaError),
}

/// A recorded signal with an optional reference channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalRecording {
    pub time: Vec<f64>,
    pub signal: Vec<f64>,
    pub tacho: Option<Vec<f64>>,
}

impl SignalRecording {
    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    /// Reciprocal of the mean time step.
    pub fn inferred_sampling_rate(&self) -> Result<f64, SourceError> {
        if self.time.len() < 2 {
            return Err(SourceError::SamplingRate(format!(
                "need at least 2 samples, have {}",
                self.time.len()
            )));
        }
        let span = self.time[self.time.len() - 1] - self.time[0];
        if !(span > 0.0) {
            return Err(SourceError::SamplingRate(format!(
                "time span {span} is not positive"
            )));
        }
        Ok((self.time.len() - 1) as f64 / span)
    }

    /// Convert into a [`SampledSignal`], inferring the rate unless one is given.
    pub fn to_sampled_signal(&self, sampling_rate: Option<f64>) -> Result<SampledSignal, SourceError> {
        let rate = match sampling_rate {
            Some(rate) => rate,
            None => self.inferred_sampling_rate()?,
        };
        Ok(SampledSignal::with_times(
            self.signal.clone(),
            self.time.clone(),
            rate,
        )?)
    }
}

/// Reads a [`SignalRecording`] from a CSV file or any buffered reader.
pub struct CsvSignalSource;

impl CsvSignalSource {
    pub fn load(path: impl AsRef<Path>) -> Result<SignalRecording, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let recording = Self::read(BufReader::new(file)).map_err(|e| match e {
            SourceError::Io { source, .. } => SourceError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;

        info!(
            file = %path.display(),
            samples = recording.len(),
            tacho = recording.tacho.is_some(),
            "Recording loaded"
        );
        Ok(recording)
    }

    pub fn read(reader: impl BufRead) -> Result<SignalRecording, SourceError> {
        let mut columns: Option<ColumnMap> = None;
        let mut recording = SignalRecording::default();

        for (line_index, line_result) in reader.lines().enumerate() {
            let line_num = line_index + 1;
            let line = line_result.map_err(|source| SourceError::Io {
                path: PathBuf::from("<input>"),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();

            let map = match columns {
                Some(map) => map,
                None => {
                    if fields.iter().any(|f| f.parse::<f64>().is_err()) {
                        columns = Some(ColumnMap::from_header(&fields)?);
                        continue;
                    }
                    let map = ColumnMap::positional(fields.len());
                    columns = Some(map);
                    map
                }
            };

            let time = parse_field(&fields, map.time, line_num, "time")?;
            let signal = parse_field(&fields, map.signal, line_num, "signal")?;
            recording.time.push(time);
            recording.signal.push(signal);

            if let Some(idx) = map.tacho {
                let tacho = parse_field(&fields, idx, line_num, "tacho")?;
                recording.tacho.get_or_insert_with(Vec::new).push(tacho);
            }
        }

        if recording.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(recording)
    }
}

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    time: usize,
    signal: usize,
    tacho: Option<usize>,
}

impl ColumnMap {
    const fn positional(width: usize) -> Self {
        Self {
            time: 0,
            signal: 1,
            tacho: if width > 2 { Some(2) } else { None },
        }
    }

    fn from_header(fields: &[&str]) -> Result<Self, SourceError> {
        let find = |names: &[&str]| {
            fields
                .iter()
                .position(|f| names.iter().any(|n| f.eq_ignore_ascii_case(n)))
        };

        Ok(Self {
            time: find(&["time", "t", "time_s"]).ok_or(SourceError::MissingColumn("time"))?,
            signal: find(&["signal", "value", "y", "amplitude"])
                .ok_or(SourceError::MissingColumn("signal"))?,
            tacho: find(&["tacho", "reference", "ref"]),
        })
    }
}

fn parse_field(fields: &[&str], idx: usize, line: usize, name: &str) -> Result<f64, SourceError> {
    let raw = fields.get(idx).ok_or_else(|| SourceError::Parse {
        line,
        message: format!("missing {name} column"),
    })?;
    let value = raw.parse::<f64>().map_err(|e| SourceError::Parse {
        line,
        message: format!("{name} '{raw}': {e}"),
    })?;
    if !value.is_finite() {
        return Err(SourceError::Parse {
            line,
            message: format!("{name} is not finite"),
        });
    }
    Ok(value)
}
