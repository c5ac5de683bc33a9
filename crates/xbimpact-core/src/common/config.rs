//! Run configuration shared by the post-processing and indicator stages.
//!
//! Every field is defaulted so a manifest may omit the whole `config` block.

use super::constants::{
    DEFAULT_EROSION_THRESHOLD_M, DEFAULT_FLOW_DEPTH_MIN_M, DEFAULT_OUTPUT_INTERVAL_SECONDS,
    EROSION_TRACE_OFFSET_STEPS, LEGACY_EROSION_BASELINE_INDEX, LEGACY_EROSION_THRESHOLD_M,
    WATER_LINE_EXPORT_INTERVAL_SECONDS,
};
use crate::domain::{ImpactError, ImpactResult};
use crate::modules::classify::{FrontierGeometry, RowPairing, ThresholdTable};
use serde::{Deserialize, Serialize};

/// Which global output step holds the pre-storm bed used as erosion baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ErosionBaseline {
    /// `floor(morphologyStart / outputInterval) + 1`.
    #[default]
    MorphologyOffset,
    FixedIndex { index: usize },
}

impl ErosionBaseline {
    pub fn baseline_index(
        &self,
        morphology_start_seconds: f64,
        output_interval_seconds: f64,
    ) -> ImpactResult<usize> {
        match self {
            Self::MorphologyOffset => {
                let whole_intervals = (morphology_start_seconds / output_interval_seconds).floor();
                if !whole_intervals.is_finite()
                    || whole_intervals < 0.0
                    || whole_intervals >= usize::MAX as f64
                {
                    return Err(baseline_out_of_range(format!(
                        "morphology start {}s over {}s intervals is not a usable step offset",
                        morphology_start_seconds, output_interval_seconds
                    )));
                }
                (whole_intervals as usize).checked_add(1).ok_or_else(|| {
                    baseline_out_of_range(format!(
                        "morphology start {}s overflows the step index",
                        morphology_start_seconds
                    ))
                })
            }
            Self::FixedIndex { index } => Ok(*index),
        }
    }
}

fn baseline_out_of_range(message: String) -> ImpactError {
    ImpactError::configuration("CONFIG.EROSION_BASELINE", message)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaterLineMethod {
    /// Follow the solver's moving point gauges, one per mesh row.
    #[default]
    GaugeTracking,
    /// Landward-most cell whose maximum flow depth exceeds `min_depth`.
    FlowDepth {
        #[serde(rename = "minDepth", default = "default_flow_depth_min")]
        min_depth: f64,
    },
}

fn default_flow_depth_min() -> f64 {
    DEFAULT_FLOW_DEPTH_MIN_M
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub erosion_threshold: f64,
    pub erosion_baseline: ErosionBaseline,
    pub erosion_trace_offset_steps: usize,
    pub morphology_start_seconds: f64,
    pub output_interval_seconds: f64,
    pub water_line_export_interval_seconds: f64,
    pub water_line_method: WaterLineMethod,
    pub scarp_distance_table: ThresholdTable,
    pub corridor_width_table: ThresholdTable,
    pub scarp_row_pairing: RowPairing,
    pub corridor_row_pairing: RowPairing,
    pub frontier_geometry: FrontierGeometry,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            erosion_threshold: DEFAULT_EROSION_THRESHOLD_M,
            erosion_baseline: ErosionBaseline::MorphologyOffset,
            erosion_trace_offset_steps: EROSION_TRACE_OFFSET_STEPS,
            morphology_start_seconds: 0.0,
            output_interval_seconds: DEFAULT_OUTPUT_INTERVAL_SECONDS,
            water_line_export_interval_seconds: WATER_LINE_EXPORT_INTERVAL_SECONDS,
            water_line_method: WaterLineMethod::GaugeTracking,
            scarp_distance_table: ThresholdTable::scarp_distance(),
            corridor_width_table: ThresholdTable::corridor_width(),
            scarp_row_pairing: RowPairing::SameRow,
            corridor_row_pairing: RowPairing::AnyRow,
            frontier_geometry: FrontierGeometry::Points,
        }
    }
}

impl RunConfig {
    /// The earliest scarp-tracing variant: 0.05 m threshold against step 13.
    pub fn legacy_erosion() -> Self {
        Self {
            erosion_threshold: LEGACY_EROSION_THRESHOLD_M,
            erosion_baseline: ErosionBaseline::FixedIndex {
                index: LEGACY_EROSION_BASELINE_INDEX,
            },
            ..Self::default()
        }
    }

    pub fn erosion_baseline_index(&self) -> ImpactResult<usize> {
        self.erosion_baseline
            .baseline_index(self.morphology_start_seconds, self.output_interval_seconds)
    }

    /// First step index at which erosion tracing runs.
    pub fn erosion_trace_start(&self) -> ImpactResult<usize> {
        self.erosion_baseline_index()?
            .checked_add(self.erosion_trace_offset_steps)
            .ok_or_else(|| {
                ImpactError::configuration(
                    "CONFIG.EROSION_TRACE_OFFSET",
                    format!(
                        "erosion trace offset {} overflows the step index",
                        self.erosion_trace_offset_steps
                    ),
                )
            })
    }

    pub fn validate(&self) -> ImpactResult<()> {
        if !self.erosion_threshold.is_finite() || self.erosion_threshold < 0.0 {
            return Err(ImpactError::configuration(
                "CONFIG.EROSION_THRESHOLD",
                format!(
                    "erosion threshold must be a non-negative number, got {}",
                    self.erosion_threshold
                ),
            ));
        }

        if !self.morphology_start_seconds.is_finite() || self.morphology_start_seconds < 0.0 {
            return Err(ImpactError::configuration(
                "CONFIG.MORPHOLOGY_START",
                format!(
                    "morphology start must be a non-negative number of seconds, got {}",
                    self.morphology_start_seconds
                ),
            ));
        }

        for (name, value) in [
            ("outputIntervalSeconds", self.output_interval_seconds),
            (
                "waterLineExportIntervalSeconds",
                self.water_line_export_interval_seconds,
            ),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ImpactError::configuration(
                    "CONFIG.INTERVAL",
                    format!("{} must be positive, got {}", name, value),
                ));
            }
        }

        if let WaterLineMethod::FlowDepth { min_depth } = self.water_line_method {
            if !min_depth.is_finite() || min_depth < 0.0 {
                return Err(ImpactError::configuration(
                    "CONFIG.FLOW_DEPTH",
                    format!("flow-depth water line needs a non-negative minDepth, got {min_depth}"),
                ));
            }
        }

        self.erosion_trace_start()?;

        self.scarp_distance_table.validate("scarpDistanceTable")?;
        self.corridor_width_table.validate("corridorWidthTable")?;
        Ok(())
    }
}

/// Identity and settings of one forecast run, passed by value into each stage.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub run_id: &'a str,
    pub epsg: Option<u32>,
    pub config: &'a RunConfig,
}
