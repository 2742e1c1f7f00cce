use std::collections::HashSet;

use chrono::NaiveDate;
use egui::Color32;
use serde::{Deserialize, Serialize};

use super::assignment::{
    Assignment, AssignmentId, Baseline, Dependency, DependencyKind, TaskPriority, TaskStatus,
};
use super::project::{Project, Resource};
use super::timeline::add_days;

/// The snapshot the engine operates on: everything the persistence
/// collaborator loads and saves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Dataset {
    pub fn assignment(&self, id: &AssignmentId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| &a.id == id)
    }

    pub fn assignment_mut(&mut self, id: &AssignmentId) -> Option<&mut Assignment> {
        self.assignments.iter_mut().find(|a| &a.id == id)
    }

    pub fn contains(&self, id: &AssignmentId) -> bool {
        self.assignments.iter().any(|a| &a.id == id)
    }

    /// Every dependency edge whose endpoints both exist, deduplicated by
    /// `(from, to)`. Edges may be recorded on either endpoint.
    pub fn edges(&self) -> Vec<Dependency> {
        let ids: HashSet<&AssignmentId> = self.assignments.iter().map(|a| &a.id).collect();
        let mut seen: HashSet<(&AssignmentId, &AssignmentId)> = HashSet::new();
        let mut edges = Vec::new();
        for dep in self.assignments.iter().flat_map(|a| a.dependencies.iter()) {
            if !ids.contains(&dep.from) || !ids.contains(&dep.to) {
                continue;
            }
            if seen.insert((&dep.from, &dep.to)) {
                edges.push(dep.clone());
            }
        }
        edges
    }

    /// Repair date and progress invariants on freshly loaded data.
    pub fn normalize(&mut self) {
        for a in &mut self.assignments {
            a.normalize();
        }
    }

    /// A small demonstration plan anchored on `today`.
    pub fn sample(today: NaiveDate) -> Self {
        let resources = vec![
            Resource::new("r-mari", "Mari", Color32::from_rgb(66, 133, 244)),
            Resource::new("r-jaan", "Jaan", Color32::from_rgb(52, 168, 83)),
            Resource::new("r-kadri", "Kadri", Color32::from_rgb(171, 71, 188)),
        ];
        let projects = vec![
            Project::new("p-web", "Website relaunch", Color32::from_rgb(251, 140, 0)),
            Project::new("p-app", "Mobile app", Color32::from_rgb(3, 169, 244)),
        ];

        let day = |n: i64| add_days(today, n);
        let task = |id: &str, res: &str, proj: &str, start: i64, end: i64, note: &str| {
            Assignment::new(res.into(), proj.into(), day(start), day(end))
                .with_id(id)
                .with_note(note)
        };

        let mut kickoff = task("a-kickoff", "r-mari", "p-web", -5, -2, "Project kickoff");
        kickoff.progress = 100;
        kickoff.status = TaskStatus::Completed;

        let mut reqs = task("a-reqs", "r-mari", "p-web", -1, 5, "Requirements gathering");
        reqs.progress = 60;
        reqs.status = TaskStatus::InProgress;
        reqs.priority = TaskPriority::High;
        reqs.baseline = Some(Baseline {
            start: day(-3),
            end: day(3),
        });
        reqs.dependencies
            .push(Dependency::finish_to_start("a-kickoff".into(), "a-reqs".into()));

        let mut design = task("a-design", "r-kadri", "p-web", 6, 16, "UI design");
        design
            .dependencies
            .push(Dependency::finish_to_start("a-reqs".into(), "a-design".into()));

        let mut backend = task("a-backend", "r-jaan", "p-web", 6, 24, "Backend development");
        backend.priority = TaskPriority::Critical;
        backend.dependencies.push(Dependency {
            from: "a-reqs".into(),
            to: "a-backend".into(),
            kind: DependencyKind::StartToStart,
            lag: 2,
        });

        let mut qa = task("a-qa", "r-kadri", "p-web", 20, 28, "Testing & QA");
        qa.dependencies
            .push(Dependency::finish_to_start("a-backend".into(), "a-qa".into()));
        qa.dependencies
            .push(Dependency::finish_to_start("a-design".into(), "a-qa".into()));

        let mut launch = Assignment::new_milestone("r-mari".into(), "p-web".into(), day(30))
            .with_id("a-launch")
            .with_note("Launch");
        launch
            .dependencies
            .push(Dependency::finish_to_start("a-qa".into(), "a-launch".into()));

        let mut spike = task("a-spike", "r-jaan", "p-app", 0, 8, "Offline sync spike");
        spike.status = TaskStatus::Blocked;
        let review = task("a-review", "r-jaan", "p-app", 3, 4, "Architecture review");
        let mut store = task("a-store", "r-kadri", "p-app", 10, 14, "Store listing");
        store.status = TaskStatus::OnHold;
        store.priority = TaskPriority::Low;

        Self {
            resources,
            projects,
            assignments: vec![kickoff, reqs, design, backend, qa, launch, spike, review, store],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_edges_skip_missing_references_and_duplicates() {
        let mut a = Assignment::new("r".into(), "p".into(), d(2025, 1, 1), d(2025, 1, 2))
            .with_id("a");
        let mut b = Assignment::new("r".into(), "p".into(), d(2025, 1, 3), d(2025, 1, 4))
            .with_id("b");
        a.dependencies
            .push(Dependency::finish_to_start("a".into(), "b".into()));
        b.dependencies
            .push(Dependency::finish_to_start("a".into(), "b".into()));
        b.dependencies
            .push(Dependency::finish_to_start("ghost".into(), "b".into()));
        let ds = Dataset {
            assignments: vec![a, b],
            ..Dataset::default()
        };

        let edges = ds.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from.as_str(), "a");
    }

    #[test]
    fn test_normalize_repairs_inverted_ranges() {
        let mut a = Assignment::new("r".into(), "p".into(), d(2025, 1, 1), d(2025, 1, 2));
        a.end = d(2024, 12, 1);
        a.progress = 140;
        let mut ds = Dataset {
            assignments: vec![a],
            ..Dataset::default()
        };
        ds.normalize();
        assert_eq!(ds.assignments[0].end, ds.assignments[0].start);
        assert_eq!(ds.assignments[0].progress, 100);
    }

    #[test]
    fn test_sample_is_consistent() {
        let ds = Dataset::sample(d(2025, 6, 2));
        assert!(ds.assignments.iter().all(|a| a.end >= a.start));
        assert_eq!(ds.edges().len(), 6);
        let launch = ds.assignment(&"a-launch".into()).unwrap();
        assert!(launch.milestone);
    }
}
