//! Time-ordered access to mesh output and the solver's point-gauge series.

use super::mesh::{Grid, MeshField, MeshGeometry, MeshIndex, MeshSlice};
use crate::domain::{ImpactError, ImpactResult};
use crate::numerics::Point2;
use std::collections::BTreeMap;

/// A forecast run's global output steps, ascending in time.
///
/// `load_step` may fail per step; callers treat any error it returns as
/// recoverable for that step alone.
pub trait MeshTimeSeries {
    fn geometry(&self) -> &MeshGeometry;

    fn step_count(&self) -> usize;

    fn step_time(&self, step_index: usize) -> Option<f64>;

    /// Fields the step declares, whether or not they turn out to be readable.
    fn available_fields(&self, step_index: usize) -> Vec<MeshField>;

    fn load_step(&self, step_index: usize, fields: &[MeshField]) -> ImpactResult<MeshSlice<'_>>;

    fn gauges(&self) -> Option<&GaugeSeries> {
        None
    }
}

#[derive(Debug, Clone)]
enum StoredStep {
    Available(BTreeMap<MeshField, Grid>),
    Unavailable(String),
}

/// Series held entirely in memory. Steps can be marked unavailable to model a
/// corrupted solver output file.
#[derive(Debug, Clone)]
pub struct InMemoryTimeSeries {
    geometry: MeshGeometry,
    steps: Vec<(f64, StoredStep)>,
    gauges: Option<GaugeSeries>,
}

impl InMemoryTimeSeries {
    pub fn new(geometry: MeshGeometry) -> Self {
        Self {
            geometry,
            steps: Vec::new(),
            gauges: None,
        }
    }

    pub fn with_gauges(mut self, gauges: GaugeSeries) -> Self {
        self.gauges = Some(gauges);
        self
    }

    pub fn push_step(&mut self, time: f64, fields: BTreeMap<MeshField, Grid>) {
        self.steps.push((time, StoredStep::Available(fields)));
    }

    pub fn push_bed_step(&mut self, time: f64, bed: Grid) {
        self.push_step(time, BTreeMap::from([(MeshField::BedLevel, bed)]));
    }

    pub fn push_unavailable_step(&mut self, time: f64, reason: impl Into<String>) {
        self.steps.push((time, StoredStep::Unavailable(reason.into())));
    }
}

impl MeshTimeSeries for InMemoryTimeSeries {
    fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    fn step_count(&self) -> usize {
        self.steps.len()
    }

    fn step_time(&self, step_index: usize) -> Option<f64> {
        self.steps.get(step_index).map(|(time, _)| *time)
    }

    fn available_fields(&self, step_index: usize) -> Vec<MeshField> {
        match self.steps.get(step_index) {
            Some((_, StoredStep::Available(grids))) => grids.keys().copied().collect(),
            _ => Vec::new(),
        }
    }

    fn load_step(&self, step_index: usize, fields: &[MeshField]) -> ImpactResult<MeshSlice<'_>> {
        let (time, stored) = self.steps.get(step_index).ok_or_else(|| {
            ImpactError::step_unavailable(
                "STEP.INDEX",
                format!("step {} is beyond the {}-step series", step_index, self.steps.len()),
            )
        })?;

        let grids = match stored {
            StoredStep::Available(grids) => grids,
            StoredStep::Unavailable(reason) => {
                return Err(ImpactError::step_unavailable(
                    "STEP.READ",
                    format!("step {} (t={}s): {}", step_index, time, reason),
                ));
            }
        };

        let mut slice = MeshSlice::new(&self.geometry, step_index, *time);
        for field in fields {
            let grid = grids.get(field).ok_or_else(|| {
                ImpactError::step_unavailable(
                    "STEP.FIELD_MISSING",
                    format!("step {} (t={}s) has no '{}' field", step_index, time, field),
                )
            })?;
            slice = slice
                .with_field(*field, grid.clone())
                .map_err(|error| error.into_step_unavailable("STEP.FIELD_SHAPE"))?;
        }
        Ok(slice)
    }

    fn gauges(&self) -> Option<&GaugeSeries> {
        self.gauges.as_ref()
    }
}

/// Point gauges that follow the moving water line, one per mesh row after the
/// solver's dummy gauge is removed. `x`/`y` are `gauges x samples`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeSeries {
    times: Vec<f64>,
    x: Grid,
    y: Grid,
}

impl GaugeSeries {
    pub fn new(times: Vec<f64>, x: Grid, y: Grid) -> ImpactResult<Self> {
        MeshIndex::new(&x, &y)?;
        if times.len() != x.cols() {
            return Err(ImpactError::shape_mismatch(
                "GAUGE.SHAPE",
                format!(
                    "gauge series has {} times but {} samples per gauge",
                    times.len(),
                    x.cols()
                ),
            ));
        }
        Ok(Self { times, x, y })
    }

    pub fn gauge_count(&self) -> usize {
        self.x.rows()
    }

    pub fn sample_count(&self) -> usize {
        self.times.len()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn x(&self) -> &Grid {
        &self.x
    }

    pub fn gauge_x(&self, gauge: usize, sample: usize) -> ImpactResult<f64> {
        self.x.get(gauge, sample)
    }

    /// Drops the gauge whose track passes closest to `dummy_point`.
    pub fn without_dummy_gauge(&self, dummy_point: Point2) -> ImpactResult<(GaugeSeries, usize)> {
        let index = MeshIndex::new(&self.x, &self.y)?;
        let cell = index.nearest_point_index(dummy_point).ok_or_else(|| {
            ImpactError::configuration(
                "GAUGE.DUMMY",
                "gauge series has no finite positions to match the dummy point against",
            )
        })?;

        let trimmed = Self {
            times: self.times.clone(),
            x: self.x.without_row(cell.row)?,
            y: self.y.without_row(cell.row)?,
        };
        Ok((trimmed, cell.row))
    }

    pub fn ensure_matches_mesh(&self, geometry: &MeshGeometry) -> ImpactResult<()> {
        if self.gauge_count() != geometry.rows() {
            return Err(ImpactError::shape_mismatch(
                "GAUGE.ROWS",
                format!(
                    "gauge series has {} gauges but the mesh has {} rows",
                    self.gauge_count(),
                    geometry.rows()
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{GaugeSeries, InMemoryTimeSeries, MeshTimeSeries};
    use crate::domain::ImpactErrorCategory;
    use crate::modules::mesh::{Grid, MeshField, MeshGeometry};

    fn geometry() -> MeshGeometry {
        MeshGeometry::new(
            Grid::from_rows(&[vec![0.0, 1.0], vec![0.0, 1.0]]).expect("x"),
            Grid::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0]]).expect("y"),
        )
        .expect("geometry")
    }

    #[test]
    fn unavailable_steps_fail_without_affecting_neighbours() {
        let mut series = InMemoryTimeSeries::new(geometry());
        series.push_bed_step(0.0, Grid::filled(2, 2, 1.0).expect("grid"));
        series.push_unavailable_step(3600.0, "truncated output");
        series.push_bed_step(7200.0, Grid::filled(2, 2, 0.5).expect("grid"));

        assert_eq!(series.step_count(), 3);
        assert!(series.load_step(0, &[MeshField::BedLevel]).is_ok());
        let error = series
            .load_step(1, &[MeshField::BedLevel])
            .expect_err("corrupted step should fail");
        assert_eq!(error.category(), ImpactErrorCategory::StepUnavailable);
        assert!(!error.is_fatal());
        assert!(series.load_step(2, &[MeshField::BedLevel]).is_ok());
    }

    #[test]
    fn missing_or_misshapen_fields_make_the_step_unavailable() {
        let mut series = InMemoryTimeSeries::new(geometry());
        series.push_bed_step(0.0, Grid::filled(3, 2, 1.0).expect("grid"));
        series.push_bed_step(3600.0, Grid::filled(2, 2, 1.0).expect("grid"));

        let misshapen = series
            .load_step(0, &[MeshField::BedLevel])
            .expect_err("misshapen bed should fail");
        assert_eq!(misshapen.category(), ImpactErrorCategory::StepUnavailable);
        assert_eq!(misshapen.placeholder(), "STEP.FIELD_SHAPE");

        let missing = series
            .load_step(1, &[MeshField::BedLevel, MeshField::MaxWaterLevel])
            .expect_err("missing field should fail");
        assert_eq!(missing.placeholder(), "STEP.FIELD_MISSING");
    }

    #[test]
    fn dummy_gauge_is_removed_by_nearest_track_position() {
        let times = vec![0.0, 900.0];
        let x = Grid::from_rows(&[vec![5.0, 6.0], vec![-500.0, -500.0], vec![7.0, 8.0]])
            .expect("gauge x");
        let y = Grid::from_rows(&[vec![0.0, 0.0], vec![-500.0, -500.0], vec![1.0, 1.0]])
            .expect("gauge y");
        let gauges = GaugeSeries::new(times, x, y).expect("gauges should build");

        let (trimmed, removed) = gauges
            .without_dummy_gauge([-499.0, -499.0])
            .expect("dummy should be removed");
        assert_eq!(removed, 1);
        assert_eq!(trimmed.gauge_count(), 2);
        assert_eq!(trimmed.gauge_x(1, 1), Ok(8.0));
        assert!(trimmed.ensure_matches_mesh(&geometry()).is_ok());

        let error = gauges
            .ensure_matches_mesh(&geometry())
            .expect_err("three gauges should not match two rows");
        assert_eq!(error.category(), ImpactErrorCategory::ShapeMismatch);
    }

    #[test]
    fn gauge_times_must_match_sample_columns() {
        let positions = Grid::filled(2, 2, 0.0).expect("grid");
        let error = GaugeSeries::new(vec![0.0], positions.clone(), positions)
            .expect_err("time count mismatch should fail");
        assert_eq!(error.placeholder(), "GAUGE.SHAPE");
    }
}
