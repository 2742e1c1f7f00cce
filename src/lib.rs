//! Interactive Gantt timeline engine: date-to-pixel timeline with infinite
//! scroll, per-row lane layout, multi-select move/resize, and the dependency
//! critical path. The `ui` module renders it with egui.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod planner;
pub mod store;
pub mod ui;

pub use config::PlannerSettings;
pub use error::{PlannerError, Result};
pub use planner::{Frame, Planner};
pub use store::PlannerStore;
