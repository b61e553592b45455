//! Synthetic decelerating fan-blade signal
//!
//! Models the position of a fan blade after switch-off: the rotation
//! frequency decays exponentially from `f0 = rpm / 60` with time constant
//! `T`, so the accumulated phase is
//!
//! ```text
//! phi(t) = 2*pi*f0*T*(1 - exp(-t/T))
//! ```
//!
//! The measured signal is `a*cos(phi) + noise`; the tacho channel is the
//! noise-free `-a*cos(phi)`, whose troughs mark the start of each rotation.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

use crate::acquisition::SignalRecording;
use crate::config::defaults;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid simulation parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Parameters of the decelerating fan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanDeceleration {
    pub sampling_rate_hz: f64,
    pub duration_s: f64,
    pub initial_rpm: f64,
    pub amplitude: f64,
    pub decay_time_s: f64,
    pub noise_std: f64,
    /// Seed for the noise generator; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for FanDeceleration {
    fn default() -> Self {
        Self {
            sampling_rate_hz: defaults::SIM_SAMPLING_RATE_HZ,
            duration_s: defaults::SIM_DURATION_S,
            initial_rpm: defaults::SIM_INITIAL_RPM,
            amplitude: defaults::SIM_AMPLITUDE,
            decay_time_s: defaults::SIM_DECAY_TIME_S,
            noise_std: defaults::SIM_NOISE_STD,
            seed: None,
        }
    }
}

impl FanDeceleration {
    /// Accumulated rotation phase (rad) at time `t`.
    pub fn phase(&self, t: f64) -> f64 {
        let f0 = self.initial_rpm / 60.0;
        2.0 * PI * f0 * self.decay_time_s * (1.0 - (-t / self.decay_time_s).exp())
    }

    /// Number of complete rotations within the recording.
    pub fn rotations(&self) -> usize {
        let last_t = (self.sample_count().saturating_sub(1)) as f64 / self.sampling_rate_hz;
        (self.phase(last_t) / (2.0 * PI)).floor() as usize
    }

    pub fn sample_count(&self) -> usize {
        (self.duration_s * self.sampling_rate_hz).round() as usize
    }

    fn validate(&self) -> Result<(), SimulationError> {
        let checks = [
            ("sampling_rate_hz", self.sampling_rate_hz, self.sampling_rate_hz > 0.0),
            ("duration_s", self.duration_s, self.duration_s > 0.0),
            ("initial_rpm", self.initial_rpm, self.initial_rpm > 0.0),
            ("decay_time_s", self.decay_time_s, self.decay_time_s > 0.0),
            ("noise_std", self.noise_std, self.noise_std >= 0.0),
            ("amplitude", self.amplitude, true),
        ];
        for (name, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(SimulationError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Generate the recording: time, noisy signal and noise-free tacho.
    pub fn generate(&self) -> Result<SignalRecording, SimulationError> {
        self.validate()?;

        let noise = Normal::new(0.0, self.noise_std).map_err(|_| {
            SimulationError::InvalidParameter {
                name: "noise_std",
                value: self.noise_std,
            }
        })?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let n = self.sample_count();
        let mut recording = SignalRecording {
            time: Vec::with_capacity(n),
            signal: Vec::with_capacity(n),
            tacho: Some(Vec::with_capacity(n)),
        };

        for k in 0..n {
            let t = k as f64 / self.sampling_rate_hz;
            let clean = self.amplitude * self.phase(t).cos();
            recording.time.push(t);
            recording.signal.push(clean + noise.sample(&mut rng));
            if let Some(tacho) = recording.tacho.as_mut() {
                tacho.push(-clean);
            }
        }

        Ok(recording)
    }
}
