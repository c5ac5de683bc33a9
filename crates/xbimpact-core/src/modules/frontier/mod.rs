//! Per-row frontier extraction and the run-long envelope of landward-most positions.

mod erosion;
mod sweep;
mod water;

pub use erosion::{ErosionWindow, erosion_columns, erosion_depth};
pub use sweep::{FrontierSweep, SkippedStep, StepFrontiers, SweepOutcome, WaterSource};
pub use water::{GaugeWaterLine, flow_depth_columns};

use super::mesh::{MeshCell, MeshIndex};
use crate::domain::{FrontierKind, ImpactError, ImpactResult};
use crate::numerics::Point2;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontierPoint {
    pub row: usize,
    pub column: usize,
    pub point: Point2,
}

/// At most one point per row, rows ascending. Rows with no point had no
/// matching cell for that step.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Frontier {
    points: Vec<FrontierPoint>,
}

impl Frontier {
    /// Sorts by row; when a row repeats, the landward-most entry is kept.
    pub fn from_points(mut points: Vec<FrontierPoint>) -> Self {
        points.sort_by_key(|entry| (entry.row, entry.column));
        let mut unique: Vec<FrontierPoint> = Vec::with_capacity(points.len());
        for entry in points {
            match unique.last_mut() {
                Some(last) if last.row == entry.row => *last = entry,
                _ => unique.push(entry),
            }
        }
        Self { points: unique }
    }

    pub fn points(&self) -> &[FrontierPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.points.iter().map(|entry| entry.row)
    }

    pub fn point_for_row(&self, row: usize) -> Option<&FrontierPoint> {
        self.points
            .binary_search_by_key(&row, |entry| entry.row)
            .ok()
            .map(|position| &self.points[position])
    }

    /// The frontier as a line through its points in row order. A line needs two points.
    pub fn polyline(&self) -> Option<Vec<Point2>> {
        if self.points.len() < 2 {
            return None;
        }
        Some(self.points.iter().map(|entry| entry.point).collect())
    }
}

/// Row-indexed landward-most column, `None` where nothing was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    columns: Vec<Option<usize>>,
}

impl Envelope {
    pub fn new(rows: usize) -> Self {
        Self {
            columns: vec![None; rows],
        }
    }

    pub fn from_columns(columns: Vec<Option<usize>>) -> Self {
        Self { columns }
    }

    pub fn rows(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Option<usize>] {
        &self.columns
    }

    pub fn column(&self, row: usize) -> Option<usize> {
        self.columns.get(row).copied().flatten()
    }

    pub fn populated_rows(&self) -> usize {
        self.columns.iter().filter(|column| column.is_some()).count()
    }

    pub fn record(&mut self, row: usize, column: usize) {
        if let Some(slot) = self.columns.get_mut(row) {
            *slot = (*slot).max(Some(column));
        }
    }

    /// Row-wise max of `other` into `self`.
    pub fn fold(&mut self, other: &Envelope) -> ImpactResult<()> {
        if self.rows() != other.rows() {
            return Err(ImpactError::shape_mismatch(
                "FRONTIER.ENVELOPE_ROWS",
                format!(
                    "cannot fold a {}-row envelope into a {}-row envelope",
                    other.rows(),
                    self.rows()
                ),
            ));
        }
        for (slot, candidate) in self.columns.iter_mut().zip(&other.columns) {
            *slot = (*slot).max(*candidate);
        }
        Ok(())
    }

    /// Associative and commutative, so per-step envelopes reduce in any order.
    pub fn merge(&self, other: &Envelope) -> ImpactResult<Envelope> {
        let mut merged = self.clone();
        merged.fold(other)?;
        Ok(merged)
    }

    /// Fails when a recorded cell lies outside `index`.
    pub fn to_frontier(&self, index: &MeshIndex<'_>) -> ImpactResult<Frontier> {
        let points = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(row, column)| column.map(|col| (row, col)))
            .map(|(row, col)| {
                index
                    .point(MeshCell { row, col })
                    .map(|point| FrontierPoint {
                        row,
                        column: col,
                        point,
                    })
                    .map_err(|error| {
                        ImpactError::shape_mismatch("FRONTIER.CELL_RANGE", error.message())
                    })
            })
            .collect::<ImpactResult<Vec<_>>>()?;
        Ok(Frontier { points })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracerState {
    Idle,
    Tracking,
    Finalized,
}

/// Tracks one frontier condition across a run and owns its envelope.
#[derive(Debug, Clone)]
pub struct FrontierTracer {
    kind: FrontierKind,
    state: TracerState,
    envelope: Envelope,
    steps_traced: usize,
    steps_skipped: usize,
}

impl FrontierTracer {
    pub fn new(kind: FrontierKind, rows: usize) -> Self {
        Self {
            kind,
            state: TracerState::Idle,
            envelope: Envelope::new(rows),
            steps_traced: 0,
            steps_skipped: 0,
        }
    }

    pub fn kind(&self) -> FrontierKind {
        self.kind
    }

    pub fn state(&self) -> TracerState {
        self.state
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn steps_traced(&self) -> usize {
        self.steps_traced
    }

    pub fn steps_skipped(&self) -> usize {
        self.steps_skipped
    }

    /// Evaluates `column_for_row` on every row and records the result. Nothing
    /// is recorded if any row fails.
    pub fn trace_step<F>(
        &mut self,
        index: &MeshIndex<'_>,
        mut column_for_row: F,
    ) -> ImpactResult<Frontier>
    where
        F: FnMut(usize) -> ImpactResult<Option<usize>>,
    {
        let columns = (0..index.rows())
            .map(&mut column_for_row)
            .collect::<ImpactResult<Vec<_>>>()?;
        self.record(index, &Envelope::from_columns(columns))
    }

    /// Records a step already reduced to per-row columns.
    pub fn record(&mut self, index: &MeshIndex<'_>, step: &Envelope) -> ImpactResult<Frontier> {
        self.ensure_open()?;
        self.envelope.fold(step)?;
        self.state = TracerState::Tracking;
        self.steps_traced += 1;
        step.to_frontier(index)
    }

    pub fn skip_step(&mut self) -> ImpactResult<()> {
        self.ensure_open()?;
        self.steps_skipped += 1;
        Ok(())
    }

    /// The envelope as the run's overall frontier. No further steps are accepted.
    pub fn finalize(&mut self, index: &MeshIndex<'_>) -> ImpactResult<Frontier> {
        self.ensure_open()?;
        self.state = TracerState::Finalized;
        self.envelope.to_frontier(index)
    }

    fn ensure_open(&self) -> ImpactResult<()> {
        if self.state == TracerState::Finalized {
            return Err(ImpactError::internal(
                "FRONTIER.FINALIZED",
                format!("{} tracer is already finalized", self.kind),
            ));
        }
        Ok(())
    }
}
