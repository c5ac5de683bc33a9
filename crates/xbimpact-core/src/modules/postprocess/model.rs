use crate::domain::FrontierKind;
use crate::modules::frontier::{Frontier, SkippedStep};
use crate::modules::serialization::hours_stamp;
use crate::numerics::Point2;
use serde::Serialize;

/// One frontier as written to disk: its points plus the polyline through them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontierDocument<'a> {
    pub run_id: &'a str,
    pub epsg: Option<u32>,
    pub kind: FrontierKind,
    pub step_index: Option<usize>,
    /// `None` for an overall frontier.
    pub time: Option<f64>,
    pub points: &'a Frontier,
    pub polyline: Option<Vec<Point2>>,
}

impl<'a> FrontierDocument<'a> {
    pub fn overall(
        run_id: &'a str,
        epsg: Option<u32>,
        kind: FrontierKind,
        frontier: &'a Frontier,
    ) -> Self {
        Self {
            run_id,
            epsg,
            kind,
            step_index: None,
            time: None,
            points: frontier,
            polyline: frontier.polyline(),
        }
    }

    pub fn at(mut self, step_index: Option<usize>, time: f64) -> Self {
        self.step_index = step_index;
        self.time = Some(time);
        self
    }
}

pub fn step_frontier_path(kind: FrontierKind, time: f64) -> String {
    format!("{0}/{0}_{1}hrs.json", kind.as_str(), hours_stamp(time))
}

pub fn gauge_export_path(time: f64) -> String {
    format!("water_line/gauges/gauges_{}hrs.json", hours_stamp(time))
}

pub fn overall_frontier_path(kind: FrontierKind) -> String {
    format!("{}_overall.json", kind.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProcessSummary {
    pub run_id: String,
    pub steps_total: usize,
    pub steps_processed: usize,
    pub steps_skipped: usize,
    pub erosion_steps: usize,
    pub erosion_baseline_step: usize,
    pub erosion_trace_start: usize,
    pub water_line_rows: usize,
    pub erosion_scarp_rows: usize,
    pub rows_without_water_line: usize,
    pub rows_without_erosion_scarp: usize,
    pub gauge_exports: usize,
    pub removed_gauge: Option<usize>,
    pub maxima: Vec<String>,
    pub skipped: Vec<SkippedStep>,
    /// Steps traced normally but left out of the maxima grids.
    pub maxima_gaps: Vec<SkippedStep>,
}

#[cfg(test)]
mod tests {
    use super::{gauge_export_path, overall_frontier_path, step_frontier_path};
    use crate::domain::FrontierKind;

    #[test]
    fn artifact_paths_carry_kind_and_hour_stamp() {
        assert_eq!(
            step_frontier_path(FrontierKind::ErosionScarp, 7200.0),
            "erosion_scarp/erosion_scarp_002.00hrs.json"
        );
        assert_eq!(
            gauge_export_path(900.0),
            "water_line/gauges/gauges_000.25hrs.json"
        );
        assert_eq!(
            overall_frontier_path(FrontierKind::WaterLine),
            "water_line_overall.json"
        );
    }
}
