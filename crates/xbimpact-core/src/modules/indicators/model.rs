use super::pipeline::{IndicatorRecord, IndicatorRun};
use crate::domain::{IndicatorKind, RiskLevel};
use crate::modules::frontier::SkippedStep;
use crate::modules::serialization::hours_stamp;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorDocument<'a> {
    pub run_id: &'a str,
    pub epsg: Option<u32>,
    pub indicator: IndicatorKind,
    pub step_index: Option<usize>,
    pub time: Option<f64>,
    pub records: Vec<&'a IndicatorRecord>,
}

pub fn step_indicator_path(indicator: IndicatorKind, time: f64) -> String {
    format!("{0}/{0}_{1}hrs.json", indicator.as_str(), hours_stamp(time))
}

pub fn overall_indicator_path(indicator: IndicatorKind) -> String {
    format!("{}_overall.json", indicator.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl LevelCounts {
    fn add(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorTotals {
    pub indicator: IndicatorKind,
    pub steps_classified: usize,
    pub highest_level: Option<RiskLevel>,
    pub overall_levels: LevelCounts,
    /// Reference rows the overall frontier never reached. Distinct from
    /// skipped steps, which are counted separately.
    pub rows_without_frontier: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSummary {
    pub run_id: String,
    pub reference_points: usize,
    pub steps_total: usize,
    pub steps_processed: usize,
    pub steps_skipped: usize,
    pub indicators: Vec<IndicatorTotals>,
    pub skipped: Vec<SkippedStep>,
}

impl IndicatorSummary {
    pub fn from_run(run_id: &str, steps_total: usize, run: &IndicatorRun) -> Self {
        let indicators = [IndicatorKind::CorridorWidth, IndicatorKind::ScarpDistance]
            .into_iter()
            .map(|indicator| {
                let mut overall_levels = LevelCounts::default();
                for record in run.overall_records(indicator) {
                    overall_levels.add(record.level);
                }
                IndicatorTotals {
                    indicator,
                    steps_classified: run
                        .steps
                        .iter()
                        .filter(|step| {
                            step.records
                                .iter()
                                .any(|record| record.indicator == indicator)
                        })
                        .count(),
                    highest_level: run.highest_level(indicator),
                    overall_levels,
                    rows_without_frontier: run.rows_without_frontier(indicator),
                }
            })
            .collect();

        Self {
            run_id: run_id.to_string(),
            reference_points: run.reference_points.len(),
            steps_total,
            steps_processed: run.steps.len(),
            steps_skipped: run.skipped_steps.len(),
            indicators,
            skipped: run.skipped_steps.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{overall_indicator_path, step_indicator_path};
    use crate::domain::IndicatorKind;

    #[test]
    fn indicator_paths_follow_indicator_names() {
        assert_eq!(
            step_indicator_path(IndicatorKind::CorridorWidth, 3600.0),
            "corridor_width/corridor_width_001.00hrs.json"
        );
        assert_eq!(
            overall_indicator_path(IndicatorKind::ScarpDistance),
            "scarp_distance_overall.json"
        );
    }
}
