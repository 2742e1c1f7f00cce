pub mod file;

pub use file::{JsonFileStorage, PlannerStorage};
