use thiserror::Error;

use crate::model::AssignmentId;

/// Failures surfaced by the planner engine and its storage collaborator.
///
/// Date-range inversions and dangling references are not represented here:
/// the former are clamped on edit and the latter are skipped silently.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("dependency cycle detected: {}", format_cycle(.cycle))]
    CycleDetected { cycle: Vec<AssignmentId> },
    #[error("unknown assignment '{0}'")]
    UnknownAssignment(AssignmentId),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

fn format_cycle(cycle: &[AssignmentId]) -> String {
    cycle
        .iter()
        .map(AssignmentId::as_str)
        .collect::<Vec<_>>()
        .join(" → ")
}
