pub mod assignment;
pub mod dataset;
pub mod project;
pub mod timeline;

pub use assignment::{
    Assignment, AssignmentId, Baseline, Dependency, DependencyKind, ProjectId, ResourceId,
    TaskPriority, TaskStatus,
};
pub use dataset::Dataset;
pub use project::{Project, Resource};
pub use timeline::{
    add_days, days_between, Day, ExtendPolicy, Extension, HeaderBlock, ScrollMetrics,
    TimelineWindow,
};
