//! Sunspot feature vector and feature column names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sunspot features for a single month.
///
/// `sn_z` is normalized over the study window; every other feature is computed
/// over the full SILSO history so early study months are not starved of data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SunspotFeatures {
    pub sn: Option<f64>,
    pub sn_z: Option<f64>,
    pub sn_z_expanding: Option<f64>,
    pub sn_ma24: Option<f64>,
    /// Month is in the top quintile of full-history activity.
    pub sn_regime80: bool,
    pub sn_diff: Option<f64>,
    pub sn_accel: Option<f64>,
}

/// Names one column of `SunspotFeatures`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SunspotFeature {
    Sn,
    SnZ,
    SnZExpanding,
    SnMa24,
    SnRegime80,
    SnDiff,
    SnAccel,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sunspot feature '{0}' (expected one of: sn, sn_z, sn_z_expanding, sn_ma24, sn_regime80, sn_diff, sn_accel)")]
pub struct UnknownFeature(pub String);

impl SunspotFeature {
    pub const ALL: [SunspotFeature; 7] = [
        SunspotFeature::Sn,
        SunspotFeature::SnZ,
        SunspotFeature::SnZExpanding,
        SunspotFeature::SnMa24,
        SunspotFeature::SnRegime80,
        SunspotFeature::SnDiff,
        SunspotFeature::SnAccel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SunspotFeature::Sn => "sn",
            SunspotFeature::SnZ => "sn_z",
            SunspotFeature::SnZExpanding => "sn_z_expanding",
            SunspotFeature::SnMa24 => "sn_ma24",
            SunspotFeature::SnRegime80 => "sn_regime80",
            SunspotFeature::SnDiff => "sn_diff",
            SunspotFeature::SnAccel => "sn_accel",
        }
    }

    /// Numeric value of this feature; the regime flag maps to 1.0 / 0.0.
    pub fn value(&self, f: &SunspotFeatures) -> Option<f64> {
        match self {
            SunspotFeature::Sn => f.sn,
            SunspotFeature::SnZ => f.sn_z,
            SunspotFeature::SnZExpanding => f.sn_z_expanding,
            SunspotFeature::SnMa24 => f.sn_ma24,
            SunspotFeature::SnRegime80 => Some(if f.sn_regime80 { 1.0 } else { 0.0 }),
            SunspotFeature::SnDiff => f.sn_diff,
            SunspotFeature::SnAccel => f.sn_accel,
        }
    }
}

impl fmt::Display for SunspotFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SunspotFeature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_names_roundtrip() {
        for f in SunspotFeature::ALL {
            assert_eq!(f.name().parse::<SunspotFeature>().unwrap(), f);
        }
        assert!("sunspots".parse::<SunspotFeature>().is_err());
    }

    #[test]
    fn test_regime_value_is_indicator() {
        let mut f = SunspotFeatures::default();
        assert_eq!(SunspotFeature::SnRegime80.value(&f), Some(0.0));
        f.sn_regime80 = true;
        assert_eq!(SunspotFeature::SnRegime80.value(&f), Some(1.0));
        assert_eq!(SunspotFeature::SnZ.value(&f), None);
    }
}
