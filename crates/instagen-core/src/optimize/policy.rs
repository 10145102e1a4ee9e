//! Optimization policy and named presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OptimizeError;
use crate::decode::WHITE;

/// Absolute lower bound on quality in quality-only mode.
pub const QUALITY_FLOOR: u8 = 5;

/// Quality floor in quality-and-rescale mode, independent of `min_quality`.
pub const RESCALE_QUALITY_FLOOR: u8 = 10;

/// The 500 KB export budget, in bytes.
pub const DEFAULT_TARGET_BYTES: u64 = 500 * 1024;

/// Configuration for one optimization call.
///
/// Plain data: callers pick a [`PolicyPreset`] and override fields. When
/// `rescale_factor` is `Some`, every non-terminal iteration also shrinks both
/// dimensions by that factor, floored at `min_dimension`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct OptimizationPolicy {
    /// Encoded size must be strictly below this to meet the budget.
    pub target_bytes: u64,
    /// Quality of the first encode (1-100).
    pub start_quality: u8,
    /// Quality-only mode stops once the next step would go below this.
    pub min_quality: u8,
    /// Quality decrement per iteration.
    pub quality_step: u8,
    /// Safety bound on encode attempts.
    pub max_iterations: u32,
    /// Per-iteration dimension multiplier in (0, 1); `None` disables rescaling.
    pub rescale_factor: Option<f64>,
    /// Floor on width and height while rescaling.
    pub min_dimension: u32,
    /// Background that transparent pixels are flattened onto.
    pub background: [u8; 3],
}

impl Default for OptimizationPolicy {
    fn default() -> Self {
        Self::retail()
    }
}

impl OptimizationPolicy {
    pub fn preset(preset: PolicyPreset) -> Self {
        match preset {
            PolicyPreset::Retail => Self::retail(),
            PolicyPreset::Export => Self::export(),
            PolicyPreset::ExportRescale => Self::export_rescale(),
        }
    }

    /// Feed export: full quality range down to 10, quality only.
    pub fn retail() -> Self {
        Self {
            target_bytes: DEFAULT_TARGET_BYTES,
            start_quality: 95,
            min_quality: 10,
            quality_step: 5,
            max_iterations: 20,
            rescale_factor: None,
            min_dimension: 100,
            background: WHITE,
        }
    }

    /// File export: stops at quality 65 rather than degrade further.
    pub fn export() -> Self {
        Self {
            min_quality: 65,
            ..Self::retail()
        }
    }

    /// Export that trades resolution as well as quality.
    pub fn export_rescale() -> Self {
        Self {
            start_quality: 85,
            max_iterations: 10,
            rescale_factor: Some(0.95),
            ..Self::retail()
        }
    }

    pub fn with_target_bytes(mut self, target_bytes: u64) -> Self {
        self.target_bytes = target_bytes;
        self
    }

    pub fn with_target_kb(self, kb: u64) -> Self {
        self.with_target_bytes(kb.saturating_mul(1024))
    }

    pub fn with_rescale(mut self, factor: f64, min_dimension: u32) -> Self {
        self.rescale_factor = Some(factor);
        self.min_dimension = min_dimension;
        self
    }

    pub fn without_rescale(mut self) -> Self {
        self.rescale_factor = None;
        self
    }

    pub fn rescales(&self) -> bool {
        self.rescale_factor.is_some()
    }

    /// Check every invariant; the first violation is reported.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.target_bytes == 0 {
            return Err(OptimizeError::invalid("target_bytes must be positive"));
        }
        if self.quality_step == 0 {
            return Err(OptimizeError::invalid("quality_step must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(OptimizeError::invalid("max_iterations must be positive"));
        }
        if !(QUALITY_FLOOR..=100).contains(&self.start_quality) {
            return Err(OptimizeError::invalid(format!(
                "start_quality {} must be in {QUALITY_FLOOR}..=100",
                self.start_quality
            )));
        }
        if self.min_quality == 0 || self.min_quality >= self.start_quality {
            return Err(OptimizeError::invalid(format!(
                "min_quality {} must be in 1..start_quality ({})",
                self.min_quality, self.start_quality
            )));
        }
        if let Some(factor) = self.rescale_factor {
            if !factor.is_finite() || factor <= 0.0 || factor >= 1.0 {
                return Err(OptimizeError::invalid(format!(
                    "rescale_factor {factor} must be in (0, 1)"
                )));
            }
            if self.min_dimension == 0 {
                return Err(OptimizeError::invalid("min_dimension must be positive"));
            }
        }
        Ok(())
    }

    /// Quality for the next attempt, or `None` when the quality range is
    /// exhausted and the loop should stop.
    ///
    /// Rescale mode clamps at [`RESCALE_QUALITY_FLOOR`] and never stops on
    /// quality. Quality-only mode stops below `min_quality`, except that a
    /// step landing under [`QUALITY_FLOOR`] gets one final attempt at the
    /// floor.
    pub(crate) fn next_quality(&self, quality: u8) -> Option<u8> {
        let next = quality.saturating_sub(self.quality_step);

        if self.rescales() {
            return Some(next.max(RESCALE_QUALITY_FLOOR.min(quality)));
        }

        if next >= self.min_quality.max(QUALITY_FLOOR) {
            Some(next)
        } else if self.min_quality < QUALITY_FLOOR && quality > QUALITY_FLOOR {
            Some(QUALITY_FLOOR)
        } else {
            None
        }
    }
}

/// The optimizer variants used across the export paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyPreset {
    #[default]
    Retail,
    Export,
    ExportRescale,
}

impl PolicyPreset {
    pub const ALL: [PolicyPreset; 3] = [
        PolicyPreset::Retail,
        PolicyPreset::Export,
        PolicyPreset::ExportRescale,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PolicyPreset::Retail => "retail",
            PolicyPreset::Export => "export",
            PolicyPreset::ExportRescale => "export-rescale",
        }
    }
}

impl fmt::Display for PolicyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyPreset {
    type Err = OptimizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        PolicyPreset::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| {
                OptimizeError::invalid(format!(
                    "unknown preset '{s}' (expected retail, export or export-rescale)"
                ))
            })
    }
}
