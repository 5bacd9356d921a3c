//! Analysis context snapshot: the externally supplied fields injected into the system prompt.
//!
//! The snapshot is produced by the location-analysis tool (usually as a JSON file) and is
//! read-only here. Every field may be absent.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fields available at prompt-composition time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    /// Selected location name (e.g. "Koramangala, Bengaluru").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Business category being evaluated (e.g. "Cafe").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,

    /// Success score on a 0..100 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_score: Option<f64>,

    /// Satellite change-detection result, when an analysis has been run.
    #[serde(default, alias = "satelliteData", skip_serializing_if = "Option::is_none")]
    pub satellite: Option<SatelliteData>,
}

/// Change-detection output. Field names follow the analysis service's snake_case JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatelliteData {
    #[serde(default)]
    pub before_date: Option<String>,
    #[serde(default)]
    pub after_date: Option<String>,
    #[serde(default)]
    pub statistics: Option<SatelliteStatistics>,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatelliteStatistics {
    /// Share of pixels that changed between the two dates, in percent.
    #[serde(default)]
    pub change_percentage: Option<f64>,
    #[serde(default)]
    pub changed_pixels: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model confidence as a 0..1 fraction.
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl ContextSnapshot {
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_business_type(mut self, business_type: impl Into<String>) -> Self {
        self.business_type = Some(business_type.into());
        self
    }

    pub fn with_success_score(mut self, score: f64) -> Self {
        self.success_score = Some(score);
        self
    }

    pub fn with_satellite(mut self, satellite: SatelliteData) -> Self {
        self.satellite = Some(satellite);
        self
    }

    /// Location if present and not blank.
    pub fn location(&self) -> Option<&str> {
        non_blank(self.location.as_deref())
    }

    /// Business type if present and not blank.
    pub fn business_type(&self) -> Option<&str> {
        non_blank(self.business_type.as_deref())
    }

    /// Satellite statistics block, present only when the analysis produced statistics.
    pub fn satellite_statistics(&self) -> Option<(&SatelliteData, &SatelliteStatistics)> {
        let data = self.satellite.as_ref()?;
        let stats = data.statistics.as_ref()?;
        Some((data, stats))
    }

    /// Overlay fields that are set in `other` on top of `self`.
    pub fn merge(mut self, other: ContextSnapshot) -> Self {
        if other.location.is_some() {
            self.location = other.location;
        }
        if other.business_type.is_some() {
            self.business_type = other.business_type;
        }
        if other.success_score.is_some() {
            self.success_score = other.success_score;
        }
        if other.satellite.is_some() {
            self.satellite = other.satellite;
        }
        self
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Load a context snapshot from a JSON file. Missing file => empty snapshot.
pub fn load_context(path: &Path) -> Result<ContextSnapshot> {
    if !path.exists() {
        log::debug!("context file not found, using empty context: {}", path.display());
        return Ok(ContextSnapshot::default());
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading context from {}", path.display()))?;
    let snapshot = serde_json::from_str(&s)
        .with_context(|| format!("parsing context from {}", path.display()))?;
    Ok(snapshot)
}
