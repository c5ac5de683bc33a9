pub mod errors;

pub use errors::{ExitPolicy, ImpactError, ImpactErrorCategory, ImpactResult, StageResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    PostProcess,
    Indicators,
}

impl PipelineStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PostProcess => "POSTPROCESS",
            Self::Indicators => "INDICATORS",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// The two tracked frontier conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrontierKind {
    WaterLine,
    ErosionScarp,
}

impl FrontierKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaterLine => "water_line",
            Self::ErosionScarp => "erosion_scarp",
        }
    }
}

impl Display for FrontierKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorKind {
    /// Reference point to erosion scarp.
    ScarpDistance,
    /// Reference point to extreme water line.
    CorridorWidth,
}

impl IndicatorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ScarpDistance => "scarp_distance",
            Self::CorridorWidth => "corridor_width",
        }
    }

    pub const fn frontier(self) -> FrontierKind {
        match self {
            Self::ScarpDistance => FrontierKind::ErosionScarp,
            Self::CorridorWidth => FrontierKind::WaterLine,
        }
    }
}

impl Display for IndicatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Ordinal risk band. Ordering follows severity, so `max` picks the worst case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRequest {
    pub run_id: String,
    pub stage: PipelineStage,
    pub manifest_path: PathBuf,
    pub output_dir: PathBuf,
}

impl StageRequest {
    pub fn new(
        run_id: impl Into<String>,
        stage: PipelineStage,
        manifest_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            stage,
            manifest_path: manifest_path.into(),
            output_dir: output_dir.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageArtifact {
    pub relative_path: PathBuf,
}

impl StageArtifact {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
        }
    }

    pub fn display_name(&self) -> String {
        self.relative_path.to_string_lossy().replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::{FrontierKind, IndicatorKind, PipelineStage, RiskLevel, StageRequest};

    #[test]
    fn stage_request_keeps_stage_identity() {
        let request = StageRequest::new("RUN-001", PipelineStage::Indicators, "run.json", "out");
        assert_eq!(request.stage.to_string(), "INDICATORS");
        assert_eq!(request.run_id, "RUN-001");
    }

    #[test]
    fn risk_levels_order_by_severity() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert_eq!(
            [RiskLevel::Medium, RiskLevel::High, RiskLevel::Low]
                .into_iter()
                .max(),
            Some(RiskLevel::High)
        );
        assert_eq!(RiskLevel::default(), RiskLevel::Low);
    }

    #[test]
    fn indicators_measure_against_their_own_frontier() {
        assert_eq!(IndicatorKind::ScarpDistance.frontier(), FrontierKind::ErosionScarp);
        assert_eq!(IndicatorKind::CorridorWidth.frontier(), FrontierKind::WaterLine);
    }
}
