//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! The raw TOML is first walked as a `toml::Value` and compared against the
//! known key paths; typos only produce warnings. Range checks run on the
//! deserialized config and are fatal.

use super::TsaConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `TsaConfig`.
///
/// Any new field added to `TsaConfig` must be added here too.
pub const KNOWN_CONFIG_KEYS: &[&str] = &[
    // [acquisition]
    "acquisition",
    "acquisition.sampling_rate_hz",
    "acquisition.channel",
    // [markers]
    "markers",
    "markers.detector",
    "markers.min_distance_samples",
    "markers.max_height",
    "markers.threshold_level",
    "markers.hysteresis",
    // [averaging]
    "averaging",
    "averaging.methods",
    "averaging.imaginary_tolerance",
    // [output]
    "output",
    "output.format",
];

/// Recursively collect dotted key paths from a TOML value.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str) -> Option<String> {
    KNOWN_CONFIG_KEYS
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by_key(|&(_, dist)| dist)
        .map(|(k, _)| k.to_string())
}

/// Warn about keys in `raw_toml` that `TsaConfig` does not know.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !KNOWN_CONFIG_KEYS.contains(&key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Checks
// ============================================================================

/// Collect every out-of-range value in `config`.
pub fn validate_ranges(config: &TsaConfig) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(rate) = config.acquisition.sampling_rate_hz {
        if !rate.is_finite() || rate <= 0.0 {
            errors.push(format!(
                "acquisition.sampling_rate_hz must be a positive finite number, got {rate}"
            ));
        }
    }

    let markers = &config.markers;
    if markers.min_distance_samples == 0 {
        errors.push("markers.min_distance_samples must be > 0".to_string());
    }
    if let Some(height) = markers.max_height {
        if !height.is_finite() {
            errors.push(format!("markers.max_height must be finite, got {height}"));
        }
    }
    if !markers.threshold_level.is_finite() {
        errors.push(format!(
            "markers.threshold_level must be finite, got {}",
            markers.threshold_level
        ));
    }
    if !markers.hysteresis.is_finite() || markers.hysteresis < 0.0 {
        errors.push(format!(
            "markers.hysteresis must be finite and >= 0, got {}",
            markers.hysteresis
        ));
    }

    let averaging = &config.averaging;
    if averaging.methods.is_empty() {
        errors.push("averaging.methods must name at least one method".to_string());
    }
    let tol = averaging.imaginary_tolerance;
    if !(tol > 0.0 && tol < 1.0) {
        errors.push(format!(
            "averaging.imaginary_tolerance must be in (0, 1), got {tol}"
        ));
    }

    errors
}
