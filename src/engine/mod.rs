pub mod arrows;
pub mod drag;
pub mod filter;
pub mod geometry;
pub mod graph;
pub mod keys;
pub mod lanes;
pub mod selection;

pub use arrows::Arrow;
pub use drag::{DragController, DragMode, DragOutcome, DragState};
pub use filter::FilterCriteria;
pub use geometry::{BarGeometry, ChartLayout, LayoutMetrics};
pub use graph::{CriticalPath, CriticalPathCache, DependencyGraph};
pub use keys::{command_for, Command};
pub use lanes::{build_rows, Row, RowKey, ViewMode};
pub use selection::SelectionModel;
