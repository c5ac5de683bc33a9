pub mod classify;
pub mod frontier;
pub mod indicators;
pub mod manifest;
pub mod maxima;
pub mod mesh;
pub mod postprocess;
pub mod serialization;
pub mod series;

mod dispatch;
mod helpers;
mod traits;

pub use dispatch::execute_stage;
pub use traits::StageExecutor;
