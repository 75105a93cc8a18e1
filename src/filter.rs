//! Task filter engine.
//!
//! Stateless: every call takes the full normalized list and the current
//! selection. Status filtering runs first, then the free-text search, and
//! the relative order of tasks is preserved.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;
use crate::task::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Complete,
    Incomplete,
}

impl StatusFilter {
    pub fn matches(&self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Complete => status == TaskStatus::Complete,
            StatusFilter::Incomplete => status == TaskStatus::Incomplete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Complete => "complete",
            StatusFilter::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "complete" => Ok(StatusFilter::Complete),
            "incomplete" => Ok(StatusFilter::Incomplete),
            _ => Err(Error::InvalidArgument(format!(
                "invalid status filter '{}': must be all, complete, or incomplete",
                s
            ))),
        }
    }
}

/// Per-status totals over an unfiltered task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub all: usize,
    pub complete: usize,
    pub incomplete: usize,
}

impl TaskCounts {
    /// Option label as shown next to the status selector, e.g. "Complete (1)"
    pub fn label(&self, filter: StatusFilter) -> String {
        match filter {
            StatusFilter::All => format!("All Tasks ({})", self.all),
            StatusFilter::Complete => format!("Complete ({})", self.complete),
            StatusFilter::Incomplete => format!("Incomplete ({})", self.incomplete),
        }
    }
}

/// Keep tasks matching `status`, then those whose title or description
/// contains the trimmed `search` text (case-insensitive).
pub fn filter<'a>(tasks: &'a [Task], status: StatusFilter, search: &str) -> Vec<&'a Task> {
    let needle = search.trim().to_lowercase();
    tasks
        .iter()
        .filter(|task| status.matches(task.status))
        .filter(|task| needle.is_empty() || matches_search(task, &needle))
        .collect()
}

fn matches_search(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle) || task.description.to_lowercase().contains(needle)
}

pub fn counts(tasks: &[Task]) -> TaskCounts {
    tasks.iter().fold(
        TaskCounts {
            all: tasks.len(),
            ..TaskCounts::default()
        },
        |mut acc, task| {
            match task.status {
                TaskStatus::Complete => acc.complete += 1,
                TaskStatus::Incomplete => acc.incomplete += 1,
            }
            acc
        },
    )
}

/// Filtered rows plus the numbers the filter panel displays
#[derive(Debug, Clone, Serialize)]
pub struct FilterView<'a> {
    pub status: StatusFilter,
    pub search: String,
    pub counts: TaskCounts,
    pub total: usize,
    pub tasks: Vec<&'a Task>,
}

impl<'a> FilterView<'a> {
    pub fn new(tasks: &'a [Task], status: StatusFilter, search: &str) -> Self {
        Self {
            status,
            search: search.trim().to_string(),
            counts: counts(tasks),
            total: tasks.len(),
            tasks: filter(tasks, status, search),
        }
    }

    pub fn showing(&self) -> usize {
        self.tasks.len()
    }

    /// "Showing X of Y tasks"
    pub fn summary(&self) -> String {
        format!("Showing {} of {} tasks", self.showing(), self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::normalize;
    use serde_json::json;

    fn sample() -> Vec<Task> {
        normalize(&json!([
            { "_id": "1", "title": "Write REPORT", "description": "quarterly numbers", "status": "complete" },
            { "_id": "2", "title": "Call bob", "description": "About the report", "status": "incomplete" },
            { "_id": "3", "title": "Groceries", "status": "incomplete" },
        ]))
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|task| task.id.clone()).collect()
    }

    #[test]
    fn status_filter_parses_case_insensitively() {
        assert_eq!("ALL".parse::<StatusFilter>().expect("parse"), StatusFilter::All);
        assert_eq!(
            " Complete ".parse::<StatusFilter>().expect("parse"),
            StatusFilter::Complete
        );
        assert!("done".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn search_matches_title_or_description() {
        let tasks = sample();
        let found = filter(&tasks, StatusFilter::All, "report");
        assert_eq!(ids(&found), vec!["1", "2"]);
    }

    #[test]
    fn whitespace_search_is_noop() {
        let tasks = sample();
        let found = filter(&tasks, StatusFilter::Incomplete, "   ");
        assert_eq!(ids(&found), vec!["2", "3"]);
    }

    #[test]
    fn search_term_is_trimmed() {
        let tasks = sample();
        let found = filter(&tasks, StatusFilter::All, "  groceries ");
        assert_eq!(ids(&found), vec!["3"]);
    }

    #[test]
    fn filters_compose() {
        let tasks = sample();
        let found = filter(&tasks, StatusFilter::Complete, "bob");
        assert!(found.is_empty());
    }

    #[test]
    fn labels_and_summary() {
        let tasks = sample();
        let view = FilterView::new(&tasks, StatusFilter::Incomplete, "");
        assert_eq!(view.summary(), "Showing 2 of 3 tasks");
        assert_eq!(view.counts.label(StatusFilter::All), "All Tasks (3)");
        assert_eq!(view.counts.label(StatusFilter::Complete), "Complete (1)");
        assert_eq!(view.counts.label(StatusFilter::Incomplete), "Incomplete (2)");
    }

    #[test]
    fn empty_list() {
        let view = FilterView::new(&[], StatusFilter::All, "x");
        assert_eq!(view.counts, TaskCounts::default());
        assert_eq!(view.summary(), "Showing 0 of 0 tasks");
    }
}
