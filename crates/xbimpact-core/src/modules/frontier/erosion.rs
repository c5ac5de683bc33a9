use super::Envelope;
use crate::common::config::RunConfig;
use crate::domain::{ImpactError, ImpactResult};
use crate::modules::mesh::{Grid, MeshIndex};

/// Step range over which the erosion scarp is traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErosionWindow {
    pub baseline_index: usize,
    pub trace_start: usize,
}

impl ErosionWindow {
    pub fn from_config(config: &RunConfig, step_count: usize) -> ImpactResult<Self> {
        let baseline_index = config.erosion_baseline_index()?;
        if baseline_index >= step_count {
            return Err(ImpactError::configuration(
                "CONFIG.EROSION_BASELINE",
                format!(
                    "erosion baseline step {} is outside the {}-step series",
                    baseline_index, step_count
                ),
            ));
        }

        if config.erosion_trace_offset_steps > step_count {
            return Err(ImpactError::configuration(
                "CONFIG.EROSION_TRACE_OFFSET",
                format!(
                    "erosion trace offset of {} steps exceeds the {}-step series",
                    config.erosion_trace_offset_steps, step_count
                ),
            ));
        }

        Ok(Self {
            baseline_index,
            trace_start: config.erosion_trace_start()?,
        })
    }

    pub fn is_active(&self, step_index: usize) -> bool {
        step_index >= self.trace_start
    }
}

/// Bed lowering since the baseline; positive where the bed has eroded.
pub fn erosion_depth(baseline: &Grid, bed: &Grid) -> ImpactResult<Grid> {
    baseline.zip_map(bed, |initial, current| initial - current)
}

pub fn erosion_columns(
    index: &MeshIndex<'_>,
    baseline: &Grid,
    bed: &Grid,
    threshold: f64,
) -> ImpactResult<Envelope> {
    let depth = erosion_depth(baseline, bed)?;
    let columns = (0..index.rows())
        .map(|row| index.landward_column_for_row(row, &depth, |value| value > threshold))
        .collect::<ImpactResult<Vec<_>>>()?;
    Ok(Envelope::from_columns(columns))
}

#[cfg(test)]
mod tests {
    use super::{ErosionWindow, erosion_columns};
    use crate::common::config::{ErosionBaseline, RunConfig};
    use crate::domain::ImpactErrorCategory;
    use crate::modules::mesh::{Grid, MeshGeometry};

    #[test]
    fn window_starts_two_steps_after_the_baseline() {
        let config = RunConfig {
            morphology_start_seconds: 7200.0,
            ..RunConfig::default()
        };
        let window = ErosionWindow::from_config(&config, 10).expect("window should build");

        assert_eq!(window.baseline_index, 3);
        assert_eq!(window.trace_start, 5);
        assert!(!window.is_active(4));
        assert!(window.is_active(5));
    }

    #[test]
    fn baseline_outside_the_series_is_a_configuration_error() {
        let config = RunConfig {
            erosion_baseline: ErosionBaseline::FixedIndex { index: 13 },
            ..RunConfig::default()
        };
        let error = ErosionWindow::from_config(&config, 10).expect_err("baseline should not fit");
        assert_eq!(error.category(), ImpactErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.EROSION_BASELINE");
    }

    #[test]
    fn erosion_threshold_is_strict_and_configurable() {
        let coordinates = Grid::filled(2, 4, 0.0).expect("grid");
        let geometry = MeshGeometry::new(coordinates.clone(), coordinates).expect("geometry");
        let baseline = Grid::filled(2, 4, 2.0).expect("grid");
        let bed = Grid::from_rows(&[vec![1.4, 1.5, 1.4, 1.9], vec![1.96, 1.9, 2.0, 2.1]])
            .expect("bed");

        let default = erosion_columns(&geometry.index(), &baseline, &bed, 0.5).expect("scan");
        assert_eq!(default.columns(), &[Some(2), None]);

        let legacy = erosion_columns(&geometry.index(), &baseline, &bed, 0.05).expect("scan");
        assert_eq!(legacy.columns(), &[Some(3), Some(1)]);
    }

    #[test]
    fn trace_offset_longer_than_the_series_is_a_configuration_error() {
        let config = RunConfig {
            erosion_trace_offset_steps: 11,
            ..RunConfig::default()
        };
        let error = ErosionWindow::from_config(&config, 10).expect_err("offset should not fit");
        assert_eq!(error.category(), ImpactErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.EROSION_TRACE_OFFSET");
    }
}
