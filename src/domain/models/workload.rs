use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use super::{user::PublicUser, UnknownVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    Development,
    BugFix,
    Review,
    Meeting,
    Documentation,
    Other,
}

impl TaskType {
    pub const ALL: [TaskType; 6] = [
        TaskType::Development,
        TaskType::BugFix,
        TaskType::Review,
        TaskType::Meeting,
        TaskType::Documentation,
        TaskType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Development => "development",
            TaskType::BugFix => "bug-fix",
            TaskType::Review => "review",
            TaskType::Meeting => "meeting",
            TaskType::Documentation => "documentation",
            TaskType::Other => "other",
        }
    }
}

impl FromStr for TaskType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("task type", s))
    }
}

impl TryFrom<String> for TaskType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    Planned,
    InProgress,
    Completed,
    Blocked,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 4] = [
        EntryStatus::Planned,
        EntryStatus::InProgress,
        EntryStatus::Completed,
        EntryStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Planned => "planned",
            EntryStatus::InProgress => "in-progress",
            EntryStatus::Completed => "completed",
            EntryStatus::Blocked => "blocked",
        }
    }
}

impl FromStr for EntryStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("status", s))
    }
}

impl TryFrom<String> for EntryStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("priority", s))
    }
}

impl TryFrom<String> for Priority {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Accepts a plain calendar date (`2024-03-01`) or an RFC 3339 timestamp,
/// which is truncated to its UTC date.
pub fn parse_entry_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

/// Deduplicates dependency ids, keeping the first occurrence of each.
pub fn dedupe_dependencies(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[derive(Debug, Serialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadEntry {
    pub id: String,
    pub user_id: String,
    pub project: String,
    pub task: String,
    #[sqlx(try_from = "String")]
    pub task_type: TaskType,
    pub hours_spent: f64,
    pub date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: EntryStatus,
    #[sqlx(try_from = "String")]
    pub priority: Priority,
    pub description: Option<String>,
    pub blockers: Option<String>,
    #[sqlx(json)]
    pub tags: Vec<String>,
    #[sqlx(json)]
    pub dependencies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewWorkloadEntry {
    pub user_id: String,
    pub project: String,
    pub task: String,
    pub task_type: TaskType,
    pub hours_spent: f64,
    pub date: NaiveDate,
    pub status: EntryStatus,
    pub priority: Priority,
    pub description: Option<String>,
    pub blockers: Option<String>,
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
}

impl WorkloadEntry {
    pub fn new(params: NewWorkloadEntry) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: params.user_id,
            project: params.project,
            task: params.task,
            task_type: params.task_type,
            hours_spent: params.hours_spent,
            date: params.date,
            status: params.status,
            priority: params.priority,
            description: params.description,
            blockers: params.blockers,
            tags: params.tags,
            dependencies: dedupe_dependencies(params.dependencies),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Partial update merged over an existing entry. The owner never changes.
/// `description` and `blockers` use `Some(None)` to clear the stored text.
#[derive(Debug, Default, Clone)]
pub struct WorkloadChanges {
    pub project: Option<String>,
    pub task: Option<String>,
    pub task_type: Option<TaskType>,
    pub hours_spent: Option<f64>,
    pub date: Option<NaiveDate>,
    pub status: Option<EntryStatus>,
    pub priority: Option<Priority>,
    pub description: Option<Option<String>>,
    pub blockers: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub dependencies: Option<Vec<String>>,
}

impl WorkloadChanges {
    pub fn apply(self, entry: &mut WorkloadEntry) {
        if let Some(v) = self.project { entry.project = v; }
        if let Some(v) = self.task { entry.task = v; }
        if let Some(v) = self.task_type { entry.task_type = v; }
        if let Some(v) = self.hours_spent { entry.hours_spent = v; }
        if let Some(v) = self.date { entry.date = v; }
        if let Some(v) = self.status { entry.status = v; }
        if let Some(v) = self.priority { entry.priority = v; }
        if let Some(v) = self.description { entry.description = v; }
        if let Some(v) = self.blockers { entry.blockers = v; }
        if let Some(v) = self.tags { entry.tags = v; }
        if let Some(v) = self.dependencies { entry.dependencies = dedupe_dependencies(v); }
        entry.updated_at = Utc::now();
    }
}

/// An entry as returned to clients, with the owner expanded.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadView {
    #[serde(flatten)]
    pub entry: WorkloadEntry,
    pub user: Option<PublicUser>,
}

#[derive(Debug, Default, Clone)]
pub struct WorkloadFilter {
    pub user_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub project: Option<String>,
    pub status: Option<EntryStatus>,
    pub task_type: Option<TaskType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.limit)
    }

    pub fn page_count(&self, total: i64) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        let limit = i64::from(self.limit);
        (total + limit - 1) / limit
    }
}
