//! Named defaults for the post-processing and indicator stages.

/// Bed lowering (m) above which a cell counts as eroded.
pub const DEFAULT_EROSION_THRESHOLD_M: f64 = 0.5;

/// Threshold used by the earliest scarp-tracing variant. Selectable through config.
pub const LEGACY_EROSION_THRESHOLD_M: f64 = 0.05;

/// Steps skipped after the erosion baseline before tracing starts. The first
/// steps after morphology is switched on are dominated by subaerial slumping.
pub const EROSION_TRACE_OFFSET_STEPS: usize = 2;

/// Fixed baseline step used by the earliest scarp-tracing variant.
pub const LEGACY_EROSION_BASELINE_INDEX: usize = 13;

pub const DEFAULT_OUTPUT_INTERVAL_SECONDS: f64 = 3600.0;

/// Gauge-derived water lines are emitted every 15 minutes of model time.
pub const WATER_LINE_EXPORT_INTERVAL_SECONDS: f64 = 900.0;

/// Minimum flow depth (m) marking a wet cell for the flow-depth water line.
pub const DEFAULT_FLOW_DEPTH_MIN_M: f64 = 0.05;

pub const SCARP_HIGH_UPPER_M: f64 = 10.0;
pub const SCARP_MEDIUM_UPPER_M: f64 = 20.0;

pub const CORRIDOR_HIGH_UPPER_M: f64 = 5.0;
pub const CORRIDOR_MEDIUM_UPPER_M: f64 = 10.0;

/// Absolute tolerance when matching gauge times to export-interval boundaries.
pub const EXPORT_TIME_TOLERANCE_S: f64 = 1.0e-6;
