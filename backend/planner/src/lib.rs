pub mod planner;
pub mod template;

pub use planner::{build, expand_units, ExecutionPlan, PlannedUnit, RequestOverlay, TextRoute};
pub use template::{DefaultName, NameStyle};
