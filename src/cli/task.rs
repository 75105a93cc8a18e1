//! taskdeck task command implementations

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::board::{self, Board, Column, ColumnCounts};
use crate::error::Result;
use crate::filter::{FilterView, StatusFilter, TaskCounts};
use crate::output::{emit_success, format_table, HumanOutput, OutputOptions};
use crate::task::{self, NewTask, Task, TaskStatus};

use super::deck::Deck;

/// Options for `taskdeck task add`
pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub progress: Option<f64>,
    pub deadline: Option<String>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `taskdeck task list`
pub struct ListOptions {
    pub status: String,
    pub search: String,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for read-only views (`counts`, `board`)
pub struct ViewOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `taskdeck task due`
pub struct DueOptions {
    pub today: Option<NaiveDate>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for `taskdeck task normalize`
pub struct NormalizeOptions {
    pub write: bool,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct BoardOutput<'a> {
    columns: Board<'a>,
    counts: ColumnCounts,
}

#[derive(Serialize)]
struct DueOutput<'a> {
    today: NaiveDate,
    alerts: Vec<board::DueAlert<'a>>,
}

#[derive(Serialize)]
struct NormalizeOutput<'a> {
    written: bool,
    total: usize,
    tasks: &'a [Task],
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let status = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    let description = Some(options.description).filter(|text| !text.is_empty());

    let task = task::add_task(
        &deck.store,
        NewTask {
            title: options.title,
            description,
            status,
            priority: options.priority,
            progress: options.progress,
            deadline: options.deadline,
        },
    )?;

    let mut human = HumanOutput::new(format!("taskdeck task add: {}", task.title));
    human.push_summary("id", task.id.clone());
    human.push_summary("status", task.status.to_string());
    if let Some(progress) = task.progress() {
        human.push_summary("progress", format!("{progress}%"));
    }
    if let Some(deadline) = task.deadline() {
        human.push_summary("deadline", deadline);
    }
    human.push_next_step("taskdeck task list");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task add",
        &task,
        &human,
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let status: StatusFilter = options.status.parse()?;
    let deck = Deck::open(options.root)?;
    let tasks = task::load_tasks(&deck.store);
    let view = FilterView::new(&tasks, status, &options.search);

    let mut human = HumanOutput::new(view.summary());
    human.push_summary("status", view.counts.label(status));
    if !view.search.is_empty() {
        human.push_summary("search", view.search.clone());
    }
    let rows: Vec<Vec<String>> = view
        .tasks
        .iter()
        .map(|task| {
            vec![
                task.status.to_string(),
                task.title.clone(),
                task.description.clone(),
            ]
        })
        .collect();
    if !rows.is_empty() {
        for line in format_table(&["STATUS", "TITLE", "DESCRIPTION"], &rows) {
            human.push_detail(line);
        }
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task list",
        &view,
        &human,
    )
}

pub fn run_counts(options: ViewOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let tasks = task::load_tasks(&deck.store);
    let counts: TaskCounts = crate::filter::counts(&tasks);

    let mut human = HumanOutput::new("taskdeck task counts");
    for filter in [
        StatusFilter::All,
        StatusFilter::Complete,
        StatusFilter::Incomplete,
    ] {
        human.push_summary(counts.label(filter), "");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task counts",
        &counts,
        &human,
    )
}

pub fn run_board(options: ViewOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let tasks = task::load_tasks(&deck.store);
    let columns = Board::categorize(&tasks, &deck.config.board);
    let counts = columns.column_counts();

    let mut human = HumanOutput::new("taskdeck task board");
    for column in Column::ALL {
        let members = columns.column(column);
        human.push_summary(column.title(), members.len().to_string());
        for task in members {
            let progress = task.progress().unwrap_or(0.0);
            human.push_detail(format!("[{}] {} ({progress}%)", column.title(), task.title));
        }
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task board",
        &BoardOutput { columns, counts },
        &human,
    )
}

pub fn run_due(options: DueOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let tasks = task::load_tasks(&deck.store);
    let today = options.today.unwrap_or_else(|| Local::now().date_naive());
    let alerts = board::due_alerts(&tasks, today);

    let header = if alerts.is_empty() {
        "taskdeck task due: nothing due today or tomorrow".to_string()
    } else {
        format!("taskdeck task due: {} task(s)", alerts.len())
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("today", today.to_string());
    for alert in &alerts {
        human.push_detail(alert.message());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task due",
        &DueOutput { today, alerts },
        &human,
    )
}

pub fn run_normalize(options: NormalizeOptions) -> Result<()> {
    let deck = Deck::open(options.root)?;
    let tasks = task::load_tasks(&deck.store);
    if options.write {
        task::save_tasks(&deck.store, &tasks)?;
    }

    let mut human = HumanOutput::new(format!("taskdeck task normalize: {} task(s)", tasks.len()));
    human.push_summary("written", options.write.to_string());
    for task in &tasks {
        human.push_detail(format!("{} [{}] {}", task.id, task.status, task.title));
    }
    if !options.write {
        human.push_next_step("taskdeck task normalize --write");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task normalize",
        &NormalizeOutput {
            written: options.write,
            total: tasks.len(),
            tasks: &tasks,
        },
        &human,
    )
}
