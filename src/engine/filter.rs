use std::collections::BTreeSet;

use crate::model::{Assignment, TaskPriority, TaskStatus};

/// Search / status / priority predicate applied before lane layout.
///
/// Empty sets and an empty search string match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    search: String,
    search_lower: String,
    pub statuses: BTreeSet<TaskStatus>,
    pub priorities: BTreeSet<TaskPriority>,
}

impl FilterCriteria {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.search_lower = self.search.to_lowercase();
    }

    pub fn toggle_status(&mut self, status: TaskStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    pub fn toggle_priority(&mut self, priority: TaskPriority) {
        if !self.priorities.remove(&priority) {
            self.priorities.insert(priority);
        }
    }

    pub fn is_active(&self) -> bool {
        !self.search_lower.is_empty() || !self.statuses.is_empty() || !self.priorities.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn passes(&self, a: &Assignment) -> bool {
        (self.search_lower.is_empty() || a.note.to_lowercase().contains(&self.search_lower))
            && (self.statuses.is_empty() || self.statuses.contains(&a.status))
            && (self.priorities.is_empty() || self.priorities.contains(&a.priority))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(note: &str, status: TaskStatus, priority: TaskPriority) -> Assignment {
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut a = Assignment::new("r".into(), "p".into(), day, day).with_note(note);
        a.status = status;
        a.priority = priority;
        a
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let f = FilterCriteria::default();
        assert!(!f.is_active());
        assert!(f.passes(&task("", TaskStatus::Blocked, TaskPriority::Low)));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut f = FilterCriteria::default();
        f.set_search("BACKEND");
        assert!(f.passes(&task("Backend development", TaskStatus::NotStarted, TaskPriority::Medium)));
        assert!(!f.passes(&task("UI design", TaskStatus::NotStarted, TaskPriority::Medium)));
    }

    #[test]
    fn test_whitespace_is_part_of_the_query() {
        let mut f = FilterCriteria::default();
        f.set_search("  ");
        assert!(f.is_active());
        assert!(!f.passes(&task("design", TaskStatus::NotStarted, TaskPriority::Medium)));
        assert!(f.passes(&task("UI  design", TaskStatus::NotStarted, TaskPriority::Medium)));
    }

    #[test]
    fn test_sets_are_conjunctive() {
        let mut f = FilterCriteria::default();
        f.toggle_status(TaskStatus::InProgress);
        f.toggle_priority(TaskPriority::High);
        f.toggle_priority(TaskPriority::Critical);
        assert!(f.passes(&task("x", TaskStatus::InProgress, TaskPriority::Critical)));
        assert!(!f.passes(&task("x", TaskStatus::InProgress, TaskPriority::Low)));
        assert!(!f.passes(&task("x", TaskStatus::Blocked, TaskPriority::High)));

        f.toggle_priority(TaskPriority::High);
        f.toggle_priority(TaskPriority::Critical);
        assert!(f.passes(&task("x", TaskStatus::InProgress, TaskPriority::Low)));
    }
}
