use crate::engine::caps::FilterCaps;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("this ffmpeg build has no usable volume filter (requested level {0})")]
    CapabilityUnavailable(f64),
}

/// Levels this close to 1.0 are treated as "leave the audio alone".
const LEVEL_EPSILON: f64 = 1e-9;

/// A candidate way of scaling sample amplitude. Each strategy is a pure
/// function of the probed capability set and the level; it returns the
/// filter expression when that mechanism is available on this build.
type VolumeStrategy = fn(&FilterCaps, f64) -> Option<String>;

/// Tried in order; the first strategy the engine supports wins. Different
/// ffmpeg builds ship different filter sets, so this must not assume any
/// single filter exists.
const STRATEGIES: &[(&str, VolumeStrategy)] = &[
    ("volume", native_volume),
    ("aeval", per_sample),
];

/// Scale every sample by `level` (1.0 = unchanged, 0 = silence, >1
/// amplifies; larger-than-unity levels are deliberately not clamped).
/// Returns `None` when no filtering is needed, i.e. no mechanism is
/// available but the level is indistinguishable from 1.0.
pub fn scale_filter(caps: &FilterCaps, level: f64) -> Result<Option<String>, VolumeError> {
    for (name, strategy) in STRATEGIES {
        if let Some(expr) = strategy(caps, level) {
            log::debug!("volume {} via {} strategy", level, name);
            return Ok(Some(expr));
        }
    }

    if (level - 1.0).abs() < LEVEL_EPSILON {
        return Ok(None);
    }

    Err(VolumeError::CapabilityUnavailable(level))
}

fn native_volume(caps: &FilterCaps, level: f64) -> Option<String> {
    caps.supports("volume").then(|| format!("volume={}", level))
}

/// Manual fallback: multiply each sample in each channel directly.
fn per_sample(caps: &FilterCaps, level: f64) -> Option<String> {
    caps.supports("aeval")
        .then(|| format!("aeval=exprs=val(ch)*{}:channel_layout=same", level))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_caps() -> FilterCaps {
        FilterCaps::from_names(["volume", "aeval"])
    }

    #[test]
    fn test_native_volume_preferred() {
        let filter = scale_filter(&full_caps(), 0.8).unwrap();
        assert_eq!(filter, Some("volume=0.8".to_string()));
    }

    #[test]
    fn test_per_sample_fallback() {
        let caps = FilterCaps::from_names(["aeval"]);
        let filter = scale_filter(&caps, 0.25).unwrap();
        assert_eq!(
            filter,
            Some("aeval=exprs=val(ch)*0.25:channel_layout=same".to_string())
        );
    }

    #[test]
    fn test_identity_level_without_any_mechanism_is_noop() {
        let caps = FilterCaps::default();
        assert_eq!(scale_filter(&caps, 1.0).unwrap(), None);
    }

    #[test]
    fn test_non_identity_level_without_any_mechanism_fails() {
        let caps = FilterCaps::default();
        let err = scale_filter(&caps, 0.5).unwrap_err();
        assert!(err.to_string().contains("0.5"));
    }

    #[test]
    fn test_amplification_is_not_clamped() {
        let filter = scale_filter(&full_caps(), 2.5).unwrap();
        assert_eq!(filter, Some("volume=2.5".to_string()));
    }

    #[test]
    fn test_silence_level() {
        let filter = scale_filter(&full_caps(), 0.0).unwrap();
        assert_eq!(filter, Some("volume=0".to_string()));
    }
}
