use super::Envelope;
use crate::common::constants::EXPORT_TIME_TOLERANCE_S;
use crate::domain::{ImpactError, ImpactResult};
use crate::modules::mesh::{MeshField, MeshIndex, MeshSlice};
use crate::modules::series::GaugeSeries;

/// Gauge-derived water line: each gauge sample is reduced once to the mesh
/// column nearest the gauge's x position on its row.
#[derive(Debug, Clone)]
pub struct GaugeWaterLine {
    times: Vec<f64>,
    samples: Vec<Envelope>,
}

impl GaugeWaterLine {
    pub fn new(index: &MeshIndex<'_>, gauges: &GaugeSeries) -> ImpactResult<Self> {
        if gauges.gauge_count() != index.rows() {
            return Err(ImpactError::shape_mismatch(
                "GAUGE.ROWS",
                format!(
                    "gauge series has {} gauges but the mesh has {} rows",
                    gauges.gauge_count(),
                    index.rows()
                ),
            ));
        }

        let mut samples = Vec::with_capacity(gauges.sample_count());
        for sample in 0..gauges.sample_count() {
            let columns = (0..index.rows())
                .map(|row| {
                    let x = gauges.gauge_x(row, sample)?;
                    index.column_nearest_x(row, x)
                })
                .collect::<ImpactResult<Vec<_>>>()?;
            samples.push(Envelope::from_columns(columns));
        }

        Ok(Self {
            times: gauges.times().to_vec(),
            samples,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn rows(&self) -> usize {
        self.samples.first().map_or(0, Envelope::rows)
    }

    /// Row-wise max over samples with `after < time <= until`; `after = None`
    /// opens the window at the start of the series.
    pub fn window(&self, after: Option<f64>, until: f64, rows: usize) -> Envelope {
        let mut window = Envelope::new(rows);
        for (time, sample) in self.times.iter().zip(&self.samples) {
            let opened = after.is_none_or(|start| *time > start + EXPORT_TIME_TOLERANCE_S);
            if opened && *time <= until + EXPORT_TIME_TOLERANCE_S {
                for (row, column) in sample.columns().iter().enumerate() {
                    if let Some(column) = column {
                        window.record(row, *column);
                    }
                }
            }
        }
        window
    }

    /// Gauge times falling on a multiple of `interval`.
    pub fn export_times(&self, interval: f64) -> Vec<f64> {
        self.times
            .iter()
            .copied()
            .filter(|time| {
                let remainder = time.rem_euclid(interval);
                remainder <= EXPORT_TIME_TOLERANCE_S
                    || interval - remainder <= EXPORT_TIME_TOLERANCE_S
            })
            .collect()
    }
}

/// Landward-most column per row where `zs_max - zb` exceeds `min_depth`.
pub fn flow_depth_columns(
    index: &MeshIndex<'_>,
    slice: &MeshSlice<'_>,
    min_depth: f64,
) -> ImpactResult<Envelope> {
    let bed = slice.require_field(MeshField::BedLevel)?;
    let water = slice.require_field(MeshField::MaxWaterLevel)?;
    let depth = water.zip_map(bed, |zs, zb| zs - zb)?;

    let columns = (0..index.rows())
        .map(|row| index.landward_column_for_row(row, &depth, |value| value > min_depth))
        .collect::<ImpactResult<Vec<_>>>()?;
    Ok(Envelope::from_columns(columns))
}

#[cfg(test)]
mod tests {
    use super::{GaugeWaterLine, flow_depth_columns};
    use crate::modules::mesh::{Grid, MeshField, MeshGeometry, MeshSlice};
    use crate::modules::series::GaugeSeries;

    fn geometry() -> MeshGeometry {
        MeshGeometry::new(
            Grid::from_rows(&[vec![0.0, 10.0, 20.0, 30.0], vec![0.0, 10.0, 20.0, 30.0]])
                .expect("x"),
            Grid::from_rows(&[vec![0.0; 4], vec![5.0; 4]]).expect("y"),
        )
        .expect("geometry")
    }

    fn gauges() -> GaugeSeries {
        GaugeSeries::new(
            vec![0.0, 450.0, 900.0, 1350.0, 1800.0],
            Grid::from_rows(&[
                vec![1.0, 12.0, 9.0, 29.0, 2.0],
                vec![f64::NAN, 4.0, 21.0, 3.0, 3.0],
            ])
            .expect("gauge x"),
            Grid::from_rows(&[vec![0.0; 5], vec![5.0; 5]]).expect("gauge y"),
        )
        .expect("gauges")
    }

    #[test]
    fn windows_take_the_landward_most_sample_per_row() {
        let geometry = geometry();
        let water = GaugeWaterLine::new(&geometry.index(), &gauges()).expect("water line");

        let first = water.window(None, 900.0, 2);
        assert_eq!(first.columns(), &[Some(1), Some(2)]);

        let second = water.window(Some(900.0), 1800.0, 2);
        assert_eq!(second.columns(), &[Some(3), Some(0)]);

        let opening = water.window(None, 0.0, 2);
        assert_eq!(opening.columns(), &[Some(0), None]);
    }

    #[test]
    fn export_times_fall_on_interval_multiples() {
        let geometry = geometry();
        let water = GaugeWaterLine::new(&geometry.index(), &gauges()).expect("water line");
        assert_eq!(water.export_times(900.0), vec![0.0, 900.0, 1800.0]);
        assert_eq!(water.sample_count(), 5);
        assert_eq!(water.rows(), 2);
    }

    #[test]
    fn gauge_count_must_match_mesh_rows() {
        let geometry = geometry();
        let single = GaugeSeries::new(
            vec![0.0],
            Grid::filled(1, 1, 0.0).expect("grid"),
            Grid::filled(1, 1, 0.0).expect("grid"),
        )
        .expect("gauges");
        assert!(GaugeWaterLine::new(&geometry.index(), &single).is_err());
    }

    #[test]
    fn flow_depth_marks_the_landward_wet_cell() {
        let geometry = geometry();
        let slice = MeshSlice::new(&geometry, 0, 0.0)
            .with_field(
                MeshField::BedLevel,
                Grid::from_rows(&[vec![-1.0, 0.0, 0.5, 2.0], vec![-1.0, 1.0, 2.0, 3.0]])
                    .expect("bed"),
            )
            .and_then(|slice| {
                slice.with_field(
                    MeshField::MaxWaterLevel,
                    Grid::from_rows(&[vec![1.0, 1.0, 1.0, 1.0], vec![-2.0, 0.5, 1.0, 1.0]])
                        .expect("zs_max"),
                )
            })
            .expect("slice");

        let columns = flow_depth_columns(&geometry.index(), &slice, 0.05).expect("flow depth");
        assert_eq!(columns.columns(), &[Some(2), None]);
    }
}
