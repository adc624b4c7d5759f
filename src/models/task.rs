use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::member::round_hours;
use crate::error::AppError;

pub const DEFAULT_ESTIMATED_HOURS: f64 = 8.0;
pub const DEFAULT_COMPLEXITY: u8 = 5;
pub const MIN_COMPLEXITY: u8 = 1;
pub const MAX_COMPLEXITY: u8 = 10;

fn default_estimated_hours() -> f64 {
    DEFAULT_ESTIMATED_HOURS
}

fn default_complexity() -> u8 {
    DEFAULT_COMPLEXITY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Open tasks count towards their assignee's workload.
    pub fn is_open(self) -> bool {
        !matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Development,
    Design,
    Testing,
    Documentation,
    Research,
    Devops,
    Management,
    #[default]
    Other,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Development => "development",
            TaskType::Design => "design",
            TaskType::Testing => "testing",
            TaskType::Documentation => "documentation",
            TaskType::Research => "research",
            TaskType::Devops => "devops",
            TaskType::Management => "management",
            TaskType::Other => "other",
        }
    }

    /// Lowercase skill names a task of this type implicitly calls for.
    pub fn implied_skills(self) -> &'static [&'static str] {
        match self {
            TaskType::Development => &[
                "js", "javascript", "typescript", "react", "node", "node.js", "express",
                "rust", "python", "java", "go", "c++", "backend", "frontend", "html", "css",
                "mongodb", "sql",
            ],
            TaskType::Design => &["ui", "ux", "figma", "sketch", "css", "illustration", "prototyping"],
            TaskType::Testing => &["qa", "testing", "jest", "cypress", "selenium", "automation"],
            TaskType::Documentation => &["writing", "documentation", "markdown", "technical writing"],
            TaskType::Research => &["research", "analysis", "data analysis", "statistics"],
            TaskType::Devops => &["docker", "kubernetes", "aws", "ci/cd", "linux", "terraform"],
            TaskType::Management => &["management", "planning", "scrum", "communication", "leadership"],
            TaskType::Other => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_estimated_hours")]
    pub estimated_hours: f64,
    #[serde(default = "default_complexity")]
    pub complexity: u8,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Explicit skill names; when empty the task type's implied skills apply.
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub auto_assigned: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped on every write.
    #[serde(default)]
    pub version: i64,
}

impl Task {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_hours(self.estimated_hours)?;
        validate_complexity(self.complexity)
    }

    /// Hours this task currently contributes to its assignee's workload.
    pub fn open_hours(&self) -> f64 {
        if self.assigned_to.is_some() && self.status.is_open() {
            self.estimated_hours
        } else {
            0.0
        }
    }
}

pub fn validate_hours(hours: f64) -> Result<(), AppError> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(AppError::Validation(
            "estimatedHours must be a positive number".into(),
        ));
    }
    Ok(())
}

pub fn validate_complexity(complexity: u8) -> Result<(), AppError> {
    if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&complexity) {
        return Err(AppError::Validation(format!(
            "complexity must be between {} and {}",
            MIN_COMPLEXITY, MAX_COMPLEXITY
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    pub priority: Option<Priority>,
    pub estimated_hours: Option<f64>,
    pub complexity: Option<u8>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_assign: bool,
}

impl CreateTaskRequest {
    pub fn into_task(self, project_id: String, created_by: String) -> Result<Task, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Task title is required".into()));
        }
        let dependencies = self
            .dependencies
            .iter()
            .map(|d| super::parse_id(d, "dependency"))
            .collect::<Result<Vec<_>, _>>()?;
        let now = Utc::now();
        let task = Task {
            id: super::new_id(),
            project_id,
            title,
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            task_type: self.task_type.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            estimated_hours: round_hours(
                self.estimated_hours.unwrap_or(DEFAULT_ESTIMATED_HOURS),
            ),
            complexity: self.complexity.unwrap_or(DEFAULT_COMPLEXITY),
            dependencies,
            required_skills: normalise_skills(self.required_skills),
            assigned_to: None,
            auto_assigned: false,
            due_date: self.due_date,
            created_by,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        task.validate()?;
        Ok(task)
    }
}

/// Partial update. `assigned_to` performs a manual (re)assignment.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub task_type: Option<TaskType>,
    pub priority: Option<Priority>,
    pub estimated_hours: Option<f64>,
    pub complexity: Option<u8>,
    pub required_skills: Option<Vec<String>>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.task_type.is_none()
            && self.priority.is_none()
            && self.estimated_hours.is_none()
            && self.complexity.is_none()
            && self.required_skills.is_none()
            && self.due_date.is_none()
            && self.assigned_to.is_none()
    }
}

/// Lowercases, trims, drops blanks and dedups skill names.
pub fn normalise_skills(skills: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = skills
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}
