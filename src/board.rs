//! Kanban board view of the task list.
//!
//! Columns are derived from `progress` only, independent of `status`.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::config::BoardConfig;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::ToDo, Column::InProgress, Column::Completed];

    pub fn title(&self) -> &'static str {
        match self {
            Column::ToDo => "To Do",
            Column::InProgress => "In Progress",
            Column::Completed => "Completed",
        }
    }

    /// Column for a progress value; missing progress counts as 0
    pub fn for_progress(progress: Option<f64>, config: &BoardConfig) -> Self {
        let progress = progress.unwrap_or(0.0);
        if progress <= config.todo_max {
            Column::ToDo
        } else if progress <= config.in_progress_max {
            Column::InProgress
        } else {
            Column::Completed
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Board<'a> {
    #[serde(rename = "To Do")]
    pub todo: Vec<&'a Task>,
    #[serde(rename = "In Progress")]
    pub in_progress: Vec<&'a Task>,
    #[serde(rename = "Completed")]
    pub completed: Vec<&'a Task>,
}

/// Task counts per column, in board order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl<'a> Board<'a> {
    /// Split tasks into columns, keeping input order within each column
    pub fn categorize<I>(tasks: I, config: &BoardConfig) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut board = Board::default();
        for task in tasks {
            match Column::for_progress(task.progress(), config) {
                Column::ToDo => board.todo.push(task),
                Column::InProgress => board.in_progress.push(task),
                Column::Completed => board.completed.push(task),
            }
        }
        board
    }

    pub fn column(&self, column: Column) -> &[&'a Task] {
        match column {
            Column::ToDo => &self.todo,
            Column::InProgress => &self.in_progress,
            Column::Completed => &self.completed,
        }
    }

    pub fn column_counts(&self) -> ColumnCounts {
        ColumnCounts {
            todo: self.todo.len(),
            in_progress: self.in_progress.len(),
            completed: self.completed.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueKind {
    DueToday,
    DueTomorrow,
}

#[derive(Debug, Clone, Serialize)]
pub struct DueAlert<'a> {
    pub kind: DueKind,
    pub task: &'a Task,
}

impl DueAlert<'_> {
    pub fn message(&self) -> String {
        match self.kind {
            DueKind::DueToday => format!("Task Due Today: \"{}\"", self.task.title),
            DueKind::DueTomorrow => format!("Task Due Tomorrow: \"{}\"", self.task.title),
        }
    }
}

/// Tasks whose `deadline` is `today` or the day after
pub fn due_alerts(tasks: &[Task], today: NaiveDate) -> Vec<DueAlert<'_>> {
    let today_str = today.format("%Y-%m-%d").to_string();
    let tomorrow_str = today
        .checked_add_days(Days::new(1))
        .map(|day| day.format("%Y-%m-%d").to_string());

    tasks
        .iter()
        .filter_map(|task| {
            let deadline = task.deadline()?;
            if deadline == today_str {
                Some(DueAlert {
                    kind: DueKind::DueToday,
                    task,
                })
            } else if tomorrow_str.as_deref() == Some(deadline) {
                Some(DueAlert {
                    kind: DueKind::DueTomorrow,
                    task,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::normalize;
    use serde_json::json;

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|task| task.title.clone()).collect()
    }

    #[test]
    fn thresholds_are_inclusive() {
        let config = BoardConfig::default();
        assert_eq!(Column::for_progress(None, &config), Column::ToDo);
        assert_eq!(Column::for_progress(Some(40.0), &config), Column::ToDo);
        assert_eq!(Column::for_progress(Some(40.5), &config), Column::InProgress);
        assert_eq!(Column::for_progress(Some(80.0), &config), Column::InProgress);
        assert_eq!(Column::for_progress(Some(81.0), &config), Column::Completed);
    }

    #[test]
    fn categorize_keeps_order() {
        let tasks = normalize(&json!([
            { "title": "a", "progress": 90 },
            { "title": "b" },
            { "title": "c", "progress": 50 },
            { "title": "d", "progress": "80" },
            { "title": "e", "progress": 100 },
        ]));
        let board = Board::categorize(&tasks, &BoardConfig::default());
        assert_eq!(titles(board.column(Column::ToDo)), vec!["b"]);
        assert_eq!(titles(board.column(Column::InProgress)), vec!["c", "d"]);
        assert_eq!(titles(board.column(Column::Completed)), vec!["a", "e"]);
        assert_eq!(
            board.column_counts(),
            ColumnCounts {
                todo: 1,
                in_progress: 2,
                completed: 2
            }
        );
    }

    #[test]
    fn due_alerts_today_and_tomorrow() {
        let tasks = normalize(&json!([
            { "title": "today", "deadline": "2026-12-31" },
            { "title": "tomorrow", "deadline": "2027-01-01" },
            { "title": "later", "deadline": "2027-01-02" },
            { "title": "none" },
        ]));
        let today = NaiveDate::from_ymd_opt(2026, 12, 31).expect("date");
        let alerts = due_alerts(&tasks, today);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, DueKind::DueToday);
        assert_eq!(alerts[0].message(), "Task Due Today: \"today\"");
        assert_eq!(alerts[1].kind, DueKind::DueTomorrow);
        assert_eq!(alerts[1].task.title, "tomorrow");
    }
}
