use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::timeline::{add_days, days_between};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mint a fresh random id.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of an [`Assignment`].
    AssignmentId
);
string_id!(
    /// Identifier of a resource (person, machine, team).
    ResourceId
);
string_id!(
    /// Identifier of a project.
    ProjectId
);

/// Represents the type of dependency between two assignments.
///
/// The kind is stored and shown but never used to constrain dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    #[serde(rename = "FS")]
    FinishToStart,
    #[serde(rename = "SS")]
    StartToStart,
    #[serde(rename = "FF")]
    FinishToFinish,
    #[serde(rename = "SF")]
    StartToFinish,
}

impl Default for DependencyKind {
    fn default() -> Self {
        Self::FinishToStart
    }
}

/// A dependency link between two assignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub from: AssignmentId,
    pub to: AssignmentId,
    #[serde(rename = "type", default)]
    pub kind: DependencyKind,
    /// Lag in days; negative values are lead time.
    #[serde(default)]
    pub lag: i32,
}

impl Dependency {
    pub fn finish_to_start(from: AssignmentId, to: AssignmentId) -> Self {
        Self {
            from,
            to,
            kind: DependencyKind::FinishToStart,
            lag: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    Blocked,
    OnHold,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Blocked,
        TaskStatus::OnHold,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not started",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::OnHold => "On hold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Critical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Critical => "Critical",
        }
    }
}

/// The originally planned range, kept to show drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A ranged task (or milestone) placed on a resource and a project.
///
/// `start` and `end` are inclusive calendar days and `end >= start` holds after
/// every mutation made through the methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: AssignmentId,
    pub resource_id: ResourceId,
    pub project_id: ProjectId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub note: String,
    /// Completion from 0 to 100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub milestone: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<AssignmentId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<Baseline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<NaiveDate>,
}

impl Assignment {
    /// Create a new assignment with sensible defaults. An inverted range is
    /// collapsed onto `start`.
    pub fn new(
        resource_id: ResourceId,
        project_id: ProjectId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            id: AssignmentId::generate(),
            resource_id,
            project_id,
            start,
            end: end.max(start),
            note: String::new(),
            progress: 0,
            milestone: false,
            parent: None,
            dependencies: Vec::new(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            tags: Vec::new(),
            description: String::new(),
            baseline: None,
            actual_start: None,
            actual_end: None,
        }
    }

    /// Create a new milestone.
    pub fn new_milestone(resource_id: ResourceId, project_id: ProjectId, date: NaiveDate) -> Self {
        let mut a = Self::new(resource_id, project_id, date, date);
        a.milestone = true;
        a
    }

    pub fn with_id(mut self, id: impl Into<AssignmentId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Inclusive length in days; a milestone counts as one day.
    pub fn duration_days(&self) -> i64 {
        days_between(self.start, self.end) + 1
    }

    /// Set both dates, clamping `end` onto `start` when inverted.
    pub fn set_dates(&mut self, start: NaiveDate, end: NaiveDate) {
        self.start = start;
        self.end = if self.milestone { start } else { end.max(start) };
    }

    /// Shift the whole range by `days`, keeping the duration.
    pub fn shift(&mut self, days: i64) {
        self.start = add_days(self.start, days);
        self.end = add_days(self.end, days);
    }

    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
    }

    /// Repair invariants on data that did not come through the setters.
    pub fn normalize(&mut self) {
        if self.milestone || self.end < self.start {
            self.end = self.start;
        }
        self.progress = self.progress.min(100);
        if let Some(b) = self.baseline.as_mut() {
            b.end = b.end.max(b.start);
        }
    }

    /// True when the two inclusive ranges share at least one day.
    pub fn overlaps(&self, other: &Assignment) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> Assignment {
        Assignment::new("r1".into(), "p1".into(), d(2025, 1, 1), d(2025, 1, 5))
    }

    #[test]
    fn test_new_clamps_inverted_range() {
        let a = Assignment::new("r1".into(), "p1".into(), d(2025, 1, 5), d(2025, 1, 1));
        assert_eq!(a.start, d(2025, 1, 5));
        assert_eq!(a.end, d(2025, 1, 5));
    }

    #[test]
    fn test_duration_is_inclusive() {
        assert_eq!(sample().duration_days(), 5);
        let m = Assignment::new_milestone("r1".into(), "p1".into(), d(2025, 3, 1));
        assert_eq!(m.duration_days(), 1);
    }

    #[test]
    fn test_set_dates_clamps_end() {
        let mut a = sample();
        a.set_dates(d(2025, 2, 10), d(2025, 2, 1));
        assert_eq!(a.end, a.start);
    }

    #[test]
    fn test_milestone_stays_a_point() {
        let mut m = Assignment::new_milestone("r1".into(), "p1".into(), d(2025, 3, 1));
        m.set_dates(d(2025, 3, 2), d(2025, 3, 9));
        assert_eq!(m.start, m.end);
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let a = sample();
        let b = Assignment::new("r1".into(), "p1".into(), d(2025, 1, 5), d(2025, 1, 7));
        let c = Assignment::new("r1".into(), "p1".into(), d(2025, 1, 6), d(2025, 1, 7));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_deserialize_original_shape() {
        let json = r#"{
            "id": "a1", "projectId": "p1", "resourceId": "r1",
            "start": "2025-11-01", "end": "2025-11-03", "note": "Kickoff",
            "status": "in-progress", "priority": "critical",
            "dependencies": [{"from": "a0", "to": "a1", "type": "SS", "lag": -2}]
        }"#;
        let a: Assignment = serde_json::from_str(json).unwrap();
        assert_eq!(a.id.as_str(), "a1");
        assert_eq!(a.status, TaskStatus::InProgress);
        assert_eq!(a.priority, TaskPriority::Critical);
        assert_eq!(a.dependencies[0].kind, DependencyKind::StartToStart);
        assert_eq!(a.dependencies[0].lag, -2);
        assert!(!a.milestone);
        assert_eq!(a.progress, 0);
    }
}
