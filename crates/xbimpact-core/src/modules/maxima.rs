//! Cell-wise maxima of erosion depth, flow depth and peak velocities over a run.

use super::mesh::{Grid, MeshField, MeshSlice};
use crate::domain::ImpactResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaximaField {
    ErosionDepth,
    FlowDepth,
    VelocityU,
    VelocityV,
}

impl MaximaField {
    pub const ALL: [MaximaField; 4] = [
        Self::ErosionDepth,
        Self::FlowDepth,
        Self::VelocityU,
        Self::VelocityV,
    ];

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::ErosionDepth => "xbout_maxEro.grd",
            Self::FlowDepth => "xbout_maxFlowDepth.grd",
            Self::VelocityU => "xbout_maxUVel.grd",
            Self::VelocityV => "xbout_maxVVel.grd",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMaxima {
    erosion_depth: Option<Grid>,
    flow_depth: Option<Grid>,
    velocity_u: Option<Grid>,
    velocity_v: Option<Grid>,
}

impl FieldMaxima {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one step in. Fields absent from the slice leave their maximum untouched.
    pub fn accumulate(&mut self, slice: &MeshSlice<'_>, baseline_bed: &Grid) -> ImpactResult<()> {
        let bed = slice.field(MeshField::BedLevel);

        if let Some(bed) = bed {
            let eroded =
                baseline_bed.zip_map(bed, |initial, current| (initial - current).max(0.0))?;
            fold_max(&mut self.erosion_depth, eroded)?;

            if let Some(water) = slice.field(MeshField::MaxWaterLevel) {
                fold_max(&mut self.flow_depth, water.zip_map(bed, |zs, zb| zs - zb)?)?;
            }
        }

        if let Some(u) = slice.field(MeshField::MaxVelocityU) {
            fold_max(&mut self.velocity_u, u.clone())?;
        }
        if let Some(v) = slice.field(MeshField::MaxVelocityV) {
            fold_max(&mut self.velocity_v, v.clone())?;
        }
        Ok(())
    }

    pub fn get(&self, field: MaximaField) -> Option<&Grid> {
        match field {
            MaximaField::ErosionDepth => self.erosion_depth.as_ref(),
            MaximaField::FlowDepth => self.flow_depth.as_ref(),
            MaximaField::VelocityU => self.velocity_u.as_ref(),
            MaximaField::VelocityV => self.velocity_v.as_ref(),
        }
    }

    pub fn computed(&self) -> Vec<(MaximaField, &Grid)> {
        MaximaField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|grid| (field, grid)))
            .collect()
    }
}

fn fold_max(slot: &mut Option<Grid>, candidate: Grid) -> ImpactResult<()> {
    match slot {
        Some(current) => current.max_assign(&candidate),
        None => {
            *slot = Some(candidate);
            Ok(())
        }
    }
}
