//! Curvilinear mesh storage and the spatial lookups the frontier tracers run on.
//!
//! Row index runs alongshore, column index runs seaward to landward. Every
//! coordinate and field grid attached to one mesh shares the same shape.

mod parser;

pub use parser::{GridParseError, parse_grid_source, read_grid_file};

use crate::domain::{ImpactError, ImpactResult};
use crate::numerics::{Point2, squared_distance2};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Dense row-major `rows x cols` matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> ImpactResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(ImpactError::shape_mismatch(
                "MESH.EMPTY",
                format!("grid must have at least one cell, got {rows}x{cols}"),
            ));
        }
        if values.len() != rows * cols {
            return Err(ImpactError::shape_mismatch(
                "MESH.GRID_LENGTH",
                format!(
                    "{}x{} grid needs {} values, got {}",
                    rows,
                    cols,
                    rows * cols,
                    values.len()
                ),
            ));
        }
        Ok(Self::from_row_major(rows, cols, values))
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> ImpactResult<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(ImpactError::shape_mismatch(
                "MESH.GRID_LENGTH",
                format!(
                    "grid row {} has {} values but row 0 has {}",
                    index,
                    row.len(),
                    cols
                ),
            ));
        }
        Self::new(rows.len(), cols, rows.concat())
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> ImpactResult<Self> {
        Self::new(rows, cols, vec![value; rows * cols])
    }

    pub(crate) fn from_row_major(rows: usize, cols: usize, values: Vec<f64>) -> Self {
        Self { rows, cols, values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, col: usize) -> ImpactResult<f64> {
        if row >= self.rows || col >= self.cols {
            return Err(ImpactError::shape_mismatch(
                "MESH.CELL_RANGE",
                format!(
                    "cell ({}, {}) is outside a {}x{} grid",
                    row, col, self.rows, self.cols
                ),
            ));
        }
        Ok(self.values[row * self.cols + col])
    }

    pub fn row(&self, row: usize) -> ImpactResult<&[f64]> {
        if row >= self.rows {
            return Err(ImpactError::shape_mismatch(
                "MESH.ROW_RANGE",
                format!("row {} is outside a {}-row grid", row, self.rows),
            ));
        }
        let start = row * self.cols;
        Ok(&self.values[start..start + self.cols])
    }

    pub fn row_iter(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(self.cols)
    }

    /// Cell-wise `f(self, other)`; both grids must share a shape.
    pub fn zip_map(&self, other: &Grid, f: impl Fn(f64, f64) -> f64) -> ImpactResult<Grid> {
        ensure_same_shape("grid", self, other)?;
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(lhs, rhs)| f(*lhs, *rhs))
            .collect();
        Ok(Self::from_row_major(self.rows, self.cols, values))
    }

    /// Cell-wise running maximum. NaN cells on either side never replace a number.
    pub fn max_assign(&mut self, other: &Grid) -> ImpactResult<()> {
        ensure_same_shape("grid", self, other)?;
        for (current, candidate) in self.values.iter_mut().zip(&other.values) {
            *current = current.max(*candidate);
        }
        Ok(())
    }

    pub fn without_row(&self, row: usize) -> ImpactResult<Grid> {
        if row >= self.rows {
            return Err(ImpactError::internal(
                "MESH.ROW_RANGE",
                format!("cannot drop row {} from a {}-row grid", row, self.rows),
            ));
        }
        let values = self
            .row_iter()
            .enumerate()
            .filter(|(index, _)| *index != row)
            .flat_map(|(_, values)| values.iter().copied())
            .collect();
        Grid::new(self.rows - 1, self.cols, values)
    }
}

pub fn ensure_same_shape(what: &str, expected: &Grid, actual: &Grid) -> ImpactResult<()> {
    if expected.shape() != actual.shape() {
        return Err(ImpactError::shape_mismatch(
            "MESH.SHAPE",
            format!(
                "{} shape {}x{} does not match mesh shape {}x{}",
                what,
                actual.rows(),
                actual.cols(),
                expected.rows(),
                expected.cols()
            ),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshCell {
    pub row: usize,
    pub col: usize,
}

/// Planar projected coordinates of the mesh nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    x: Grid,
    y: Grid,
}

impl MeshGeometry {
    pub fn new(x: Grid, y: Grid) -> ImpactResult<Self> {
        ensure_same_shape("y coordinate", &x, &y)?;
        Ok(Self { x, y })
    }

    pub fn rows(&self) -> usize {
        self.x.rows()
    }

    pub fn cols(&self) -> usize {
        self.x.cols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.x.shape()
    }

    pub fn x(&self) -> &Grid {
        &self.x
    }

    pub fn y(&self) -> &Grid {
        &self.y
    }

    pub fn index(&self) -> MeshIndex<'_> {
        MeshIndex {
            x: &self.x,
            y: &self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshField {
    BedLevel,
    MaxWaterLevel,
    MaxVelocityU,
    MaxVelocityV,
}

impl MeshField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BedLevel => "zb",
            Self::MaxWaterLevel => "zs_max",
            Self::MaxVelocityU => "u_max",
            Self::MaxVelocityV => "v_max",
        }
    }
}

impl Display for MeshField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// One output instant of the mesh. Read-only once built.
#[derive(Debug, Clone)]
pub struct MeshSlice<'g> {
    geometry: &'g MeshGeometry,
    step_index: usize,
    time: f64,
    fields: BTreeMap<MeshField, Grid>,
}

impl<'g> MeshSlice<'g> {
    pub fn new(geometry: &'g MeshGeometry, step_index: usize, time: f64) -> Self {
        Self {
            geometry,
            step_index,
            time,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: MeshField, grid: Grid) -> ImpactResult<Self> {
        ensure_same_shape(field.as_str(), self.geometry.x(), &grid)?;
        self.fields.insert(field, grid);
        Ok(self)
    }

    /// Takes every field of `other` into this slice. Nothing is taken unless
    /// all of them match the mesh shape.
    pub fn absorb(&mut self, other: MeshSlice<'_>) -> ImpactResult<()> {
        for (field, grid) in &other.fields {
            ensure_same_shape(field.as_str(), self.geometry.x(), grid)?;
        }
        self.fields.extend(other.fields);
        Ok(())
    }

    pub fn geometry(&self) -> &'g MeshGeometry {
        self.geometry
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn field(&self, field: MeshField) -> Option<&Grid> {
        self.fields.get(&field)
    }

    pub fn require_field(&self, field: MeshField) -> ImpactResult<&Grid> {
        self.fields.get(&field).ok_or_else(|| {
            ImpactError::step_unavailable(
                "STEP.FIELD_MISSING",
                format!(
                    "step {} (t={}s) has no '{}' field",
                    self.step_index, self.time, field
                ),
            )
        })
    }

    pub fn index(&self) -> MeshIndex<'g> {
        self.geometry.index()
    }
}

/// Spatial lookup over a pair of coordinate grids.
#[derive(Debug, Clone, Copy)]
pub struct MeshIndex<'a> {
    x: &'a Grid,
    y: &'a Grid,
}

impl<'a> MeshIndex<'a> {
    pub fn new(x: &'a Grid, y: &'a Grid) -> ImpactResult<Self> {
        ensure_same_shape("y coordinate", x, y)?;
        Ok(Self { x, y })
    }

    pub fn rows(&self) -> usize {
        self.x.rows()
    }

    pub fn cols(&self) -> usize {
        self.x.cols()
    }

    pub fn point(&self, cell: MeshCell) -> ImpactResult<Point2> {
        Ok([
            self.x.get(cell.row, cell.col)?,
            self.y.get(cell.row, cell.col)?,
        ])
    }

    /// Closest node to `query` in row-major scan order; the first of several
    /// equidistant nodes wins. `None` only when no node has finite coordinates.
    pub fn nearest_point_index(&self, query: Point2) -> Option<MeshCell> {
        let mut best: Option<(MeshCell, f64)> = None;
        for (row, (xs, ys)) in self.x.row_iter().zip(self.y.row_iter()).enumerate() {
            for (col, (x, y)) in xs.iter().zip(ys).enumerate() {
                let cell = MeshCell { row, col };
                let distance = squared_distance2([*x, *y], query);
                if !distance.is_finite() {
                    continue;
                }
                if best.is_none_or(|(_, current)| distance < current) {
                    best = Some((cell, distance));
                }
            }
        }
        best.map(|(cell, _)| cell)
    }

    /// Highest column of `row` whose `field` value satisfies `predicate`.
    pub fn landward_column_for_row(
        &self,
        row: usize,
        field: &Grid,
        predicate: impl Fn(f64) -> bool,
    ) -> ImpactResult<Option<usize>> {
        ensure_same_shape("field", self.x, field)?;
        self.check_row(row)?;
        Ok(field.row(row)?.iter().rposition(|value| predicate(*value)))
    }

    /// Column of `row` whose x coordinate is closest to `target_x`.
    pub fn column_nearest_x(&self, row: usize, target_x: f64) -> ImpactResult<Option<usize>> {
        self.check_row(row)?;
        if !target_x.is_finite() {
            return Ok(None);
        }

        let mut best: Option<(usize, f64)> = None;
        for (col, x) in self.x.row(row)?.iter().enumerate() {
            let offset = (x - target_x).abs();
            if !offset.is_finite() {
                continue;
            }
            if best.is_none_or(|(_, current)| offset < current) {
                best = Some((col, offset));
            }
        }
        Ok(best.map(|(col, _)| col))
    }

    fn check_row(&self, row: usize) -> ImpactResult<()> {
        if row >= self.rows() {
            return Err(ImpactError::internal(
                "MESH.ROW_RANGE",
                format!("row {} is outside a {}-row mesh", row, self.rows()),
            ));
        }
        Ok(())
    }
}
