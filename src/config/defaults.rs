//! System-wide default constants.
//!
//! Centralises the values used when `tsa_config.toml` leaves a key out.

// ============================================================================
// Config Loading
// ============================================================================

/// Environment variable pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "TSA_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tsa_config.toml";

// ============================================================================
// Markers
// ============================================================================

/// Minimum spacing between detected cycle starts (samples).
pub const MIN_MARKER_DISTANCE_SAMPLES: usize = 1;

/// Crossing level of the threshold detector.
pub const THRESHOLD_LEVEL: f64 = 0.0;

/// Re-arm margin of the threshold detector.
pub const THRESHOLD_HYSTERESIS: f64 = 0.0;

// ============================================================================
// Averaging
// ============================================================================

/// Relative imaginary residue tolerated after spectral reconstruction.
pub const IMAGINARY_TOLERANCE: f64 = crate::processing::DEFAULT_IMAGINARY_TOLERANCE;

// ============================================================================
// Simulation (decelerating fan blade)
// ============================================================================

/// Sampling rate of the synthetic signal (Hz).
pub const SIM_SAMPLING_RATE_HZ: f64 = 1000.0;

/// Length of the synthetic recording (s).
pub const SIM_DURATION_S: f64 = 3.0;

/// Rotation speed at switch-off (rpm).
pub const SIM_INITIAL_RPM: f64 = 2400.0;

/// Blade displacement amplitude.
pub const SIM_AMPLITUDE: f64 = 0.1;

/// Exponential speed decay time constant (s).
pub const SIM_DECAY_TIME_S: f64 = 0.75;

/// Standard deviation of the additive measurement noise.
pub const SIM_NOISE_STD: f64 = 1.0 / 200.0;
