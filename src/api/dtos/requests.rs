use crate::domain::models::{
    user::{Role, UserChanges},
    workload::{parse_entry_date, EntryStatus, NewWorkloadEntry, Priority, TaskType, WorkloadChanges, WorkloadFilter},
};
use crate::error::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn violation(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::from(message));
    err
}

fn one_of<T: FromStr>(value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    match value.parse::<T>() {
        Ok(_) => Ok(()),
        Err(_) => Err(violation("enum", format!("must be one of: {}", allowed.join(", ")))),
    }
}

fn validate_role(value: &str) -> Result<(), ValidationError> {
    one_of::<Role>(value, &Role::ALL.map(|r| r.as_str()))
}

fn validate_task_type(value: &str) -> Result<(), ValidationError> {
    one_of::<TaskType>(value, &TaskType::ALL.map(|t| t.as_str()))
}

fn validate_status(value: &str) -> Result<(), ValidationError> {
    one_of::<EntryStatus>(value, &EntryStatus::ALL.map(|s| s.as_str()))
}

fn validate_priority(value: &str) -> Result<(), ValidationError> {
    one_of::<Priority>(value, &Priority::ALL.map(|p| p.as_str()))
}

fn validate_date(value: &str) -> Result<(), ValidationError> {
    match parse_entry_date(value) {
        Some(_) => Ok(()),
        None => Err(violation("date", "must be a date (YYYY-MM-DD) or RFC 3339 timestamp".into())),
    }
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.trim().is_empty()) {
        return Err(violation("tags", "tags must not be empty strings".into()));
    }
    Ok(())
}

fn validate_dependencies(ids: &[String]) -> Result<(), ValidationError> {
    if ids.iter().any(|id| Uuid::parse_str(id).is_err()) {
        return Err(violation("dependencies", "dependencies must be entry ids".into()));
    }
    Ok(())
}

fn validate_date_order(start: Option<&String>, end: Option<&String>) -> Result<(), ValidationError> {
    let start = start.and_then(|s| parse_entry_date(s));
    let end = end.and_then(|e| parse_entry_date(e));
    match (start, end) {
        (Some(s), Some(e)) if s > e => Err(violation("date_range", "startDate must not be after endDate".into())),
        _ => Ok(()),
    }
}

/// Parses a field that already passed validation; a failure here is still
/// reported as a violation rather than trusted.
fn parse_field<T: FromStr>(field: &str, raw: &str) -> Result<T, AppError> {
    raw.parse::<T>().map_err(|_| AppError::invalid_field(field, "has an invalid value"))
}

fn parse_date_field(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    parse_entry_date(raw).ok_or_else(|| AppError::invalid_field(field, "must be a date"))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::invalid_field(field, "is required"))
}

// --- Auth ---

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "is required"),
        length(min = 3, max = 50, message = "must be between 3 and 50 characters")
    )]
    pub username: Option<String>,
    #[validate(required(message = "is required"), email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(required(message = "is required"), length(min = 6, message = "must be at least 6 characters"))]
    pub password: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required(message = "is required"), email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(required(message = "is required"), length(min = 1, message = "is required"))]
    pub password: Option<String>,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(required(message = "is required"), length(min = 1, message = "is required"))]
    pub current_password: Option<String>,
    #[validate(required(message = "is required"), length(min = 6, message = "must be at least 6 characters"))]
    pub new_password: Option<String>,
}

// --- Users ---

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    /// Builds the change set. Role and active flag are dropped unless the
    /// requester is an admin. Dropping only applies to values that passed
    /// validation; an unknown role is rejected for every requester.
    pub fn into_changes(self, requester_is_admin: bool) -> Result<UserChanges, AppError> {
        let (role, is_active) = if requester_is_admin {
            let role = self.role.as_deref().map(|r| parse_field::<Role>("role", r)).transpose()?;
            (role, self.is_active)
        } else {
            (None, None)
        };

        Ok(UserChanges {
            username: self.username,
            email: self.email,
            role,
            is_active,
        })
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl ListUsersQuery {
    pub fn role(&self) -> Result<Option<Role>, AppError> {
        self.role.as_deref().map(|r| parse_field::<Role>("role", r)).transpose()
    }
}

// --- Workload ---

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkloadRequest {
    #[validate(required(message = "is required"), length(min = 1, message = "must not be empty"))]
    pub project: Option<String>,
    #[validate(required(message = "is required"), length(min = 1, message = "must not be empty"))]
    pub task: Option<String>,
    #[validate(required(message = "is required"), custom(function = "validate_task_type"))]
    pub task_type: Option<String>,
    #[validate(required(message = "is required"), range(min = 0.0, message = "must be at least 0"))]
    pub hours_spent: Option<f64>,
    #[validate(required(message = "is required"), custom(function = "validate_date"))]
    pub date: Option<String>,
    #[validate(required(message = "is required"), custom(function = "validate_status"))]
    pub status: Option<String>,
    #[validate(required(message = "is required"), custom(function = "validate_priority"))]
    pub priority: Option<String>,
    pub description: Option<String>,
    pub blockers: Option<String>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = "validate_dependencies"))]
    pub dependencies: Option<Vec<String>>,
}

impl CreateWorkloadRequest {
    pub fn into_new_entry(self, user_id: String) -> Result<NewWorkloadEntry, AppError> {
        Ok(NewWorkloadEntry {
            user_id,
            project: required("project", self.project)?,
            task: required("task", self.task)?,
            task_type: parse_field("taskType", &required("taskType", self.task_type)?)?,
            hours_spent: required("hoursSpent", self.hours_spent)?,
            date: parse_date_field("date", &required("date", self.date)?)?,
            status: parse_field("status", &required("status", self.status)?)?,
            priority: parse_field("priority", &required("priority", self.priority)?)?,
            description: self.description,
            blockers: self.blockers,
            tags: self.tags.unwrap_or_default(),
            dependencies: self.dependencies.unwrap_or_default(),
        })
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkloadRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub project: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub task: Option<String>,
    #[validate(custom(function = "validate_task_type"))]
    pub task_type: Option<String>,
    #[validate(range(min = 0.0, message = "must be at least 0"))]
    pub hours_spent: Option<f64>,
    #[validate(custom(function = "validate_date"))]
    pub date: Option<String>,
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
    #[validate(custom(function = "validate_priority"))]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub blockers: Option<Option<String>>,
    #[validate(custom(function = "validate_tags"))]
    pub tags: Option<Vec<String>>,
    #[validate(custom(function = "validate_dependencies"))]
    pub dependencies: Option<Vec<String>>,
}

impl UpdateWorkloadRequest {
    pub fn into_changes(self) -> Result<WorkloadChanges, AppError> {
        Ok(WorkloadChanges {
            project: self.project,
            task: self.task,
            task_type: self.task_type.as_deref().map(|v| parse_field("taskType", v)).transpose()?,
            hours_spent: self.hours_spent,
            date: self.date.as_deref().map(|v| parse_date_field("date", v)).transpose()?,
            status: self.status.as_deref().map(|v| parse_field("status", v)).transpose()?,
            priority: self.priority.as_deref().map(|v| parse_field("priority", v)).transpose()?,
            description: self.description,
            blockers: self.blockers,
            tags: self.tags,
            dependencies: self.dependencies,
        })
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "list_query_date_order"))]
pub struct ListWorkloadQuery {
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "must be between 1 and 100"))]
    pub limit: Option<u32>,
    #[validate(custom(function = "validate_date"))]
    pub start_date: Option<String>,
    #[validate(custom(function = "validate_date"))]
    pub end_date: Option<String>,
    pub project: Option<String>,
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
    #[validate(custom(function = "validate_task_type"))]
    pub task_type: Option<String>,
    pub user_id: Option<String>,
}

fn list_query_date_order(q: &ListWorkloadQuery) -> Result<(), ValidationError> {
    validate_date_order(q.start_date.as_ref(), q.end_date.as_ref())
}

impl ListWorkloadQuery {
    /// Filter without any ownership restriction; the handler applies that.
    pub fn to_filter(&self) -> Result<WorkloadFilter, AppError> {
        Ok(WorkloadFilter {
            user_id: self.user_id.clone(),
            start_date: self.start_date.as_deref().map(|v| parse_date_field("startDate", v)).transpose()?,
            end_date: self.end_date.as_deref().map(|v| parse_date_field("endDate", v)).transpose()?,
            project: self.project.clone(),
            status: self.status.as_deref().map(|v| parse_field("status", v)).transpose()?,
            task_type: self.task_type.as_deref().map(|v| parse_field("taskType", v)).transpose()?,
        })
    }
}

/// Date range for the statistics endpoints. `userId` is only read by the
/// workload statistics endpoint.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "stats_query_date_order"))]
pub struct StatsQuery {
    #[validate(required(message = "is required"), custom(function = "validate_date"))]
    pub start_date: Option<String>,
    #[validate(required(message = "is required"), custom(function = "validate_date"))]
    pub end_date: Option<String>,
    pub user_id: Option<String>,
}

fn stats_query_date_order(q: &StatsQuery) -> Result<(), ValidationError> {
    validate_date_order(q.start_date.as_ref(), q.end_date.as_ref())
}

impl StatsQuery {
    pub fn range(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        let start = parse_date_field("startDate", required("startDate", self.start_date.as_deref())?)?;
        let end = parse_date_field("endDate", required("endDate", self.end_date.as_deref())?)?;
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violations(err: validator::ValidationErrors) -> Vec<String> {
        let mut fields: Vec<String> = err.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        fields
    }

    #[test]
    fn create_request_collects_all_violations() {
        let req: CreateWorkloadRequest = serde_json::from_value(json!({
            "project": "",
            "taskType": "coding",
            "hoursSpent": -1.0,
            "date": "yesterday",
            "status": "planned",
            "priority": "urgent"
        }))
        .unwrap();

        let fields = violations(req.validate().unwrap_err());
        assert_eq!(fields, vec!["date", "hours_spent", "priority", "project", "task", "task_type"]);
    }

    #[test]
    fn create_request_converts_when_valid() {
        let req: CreateWorkloadRequest = serde_json::from_value(json!({
            "project": "P",
            "task": "Implement login",
            "taskType": "bug-fix",
            "hoursSpent": 0.0,
            "date": "2024-02-29",
            "status": "in-progress",
            "priority": "high",
            "tags": ["z", "a"]
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let entry = req.into_new_entry("owner".into()).unwrap();
        assert_eq!(entry.task_type, TaskType::BugFix);
        assert_eq!(entry.status, EntryStatus::InProgress);
        assert_eq!(entry.priority, Priority::High);
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(entry.tags, vec!["z".to_string(), "a".to_string()]);
        assert!(entry.dependencies.is_empty());
    }

    #[test]
    fn dependencies_must_be_ids() {
        let req: UpdateWorkloadRequest = serde_json::from_value(json!({
            "dependencies": ["not-an-id"]
        }))
        .unwrap();
        assert_eq!(violations(req.validate().unwrap_err()), vec!["dependencies"]);
    }

    #[test]
    fn update_request_tells_null_from_absent() {
        let req: UpdateWorkloadRequest = serde_json::from_value(json!({
            "description": null,
            "blockers": "waiting on review"
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let changes = req.into_changes().unwrap();
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.blockers, Some(Some("waiting on review".to_string())));

        let untouched: UpdateWorkloadRequest = serde_json::from_value(json!({ "status": "blocked" })).unwrap();
        let changes = untouched.into_changes().unwrap();
        assert!(changes.description.is_none());
        assert!(changes.blockers.is_none());
    }

    #[test]
    fn unknown_role_is_rejected_even_when_it_would_be_dropped() {
        let req: UpdateUserRequest = serde_json::from_value(json!({
            "username": "renamed",
            "role": "superuser"
        }))
        .unwrap();
        assert_eq!(violations(req.validate().unwrap_err()), vec!["role"]);
    }

    #[test]
    fn non_admin_update_drops_privileged_fields() {
        let req: UpdateUserRequest = serde_json::from_value(json!({
            "username": "renamed",
            "role": "admin",
            "isActive": false
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let changes = req.into_changes(false).unwrap();
        assert_eq!(changes.username.as_deref(), Some("renamed"));
        assert!(changes.role.is_none());
        assert!(changes.is_active.is_none());
    }

    #[test]
    fn admin_update_keeps_privileged_fields() {
        let req: UpdateUserRequest = serde_json::from_value(json!({
            "role": "manager",
            "isActive": false
        }))
        .unwrap();

        let changes = req.into_changes(true).unwrap();
        assert_eq!(changes.role, Some(Role::Manager));
        assert_eq!(changes.is_active, Some(false));
    }

    #[test]
    fn stats_query_requires_ordered_range() {
        let missing = StatsQuery { start_date: None, end_date: None, user_id: None };
        assert_eq!(violations(missing.validate().unwrap_err()), vec!["end_date", "start_date"]);

        let reversed = StatsQuery {
            start_date: Some("2024-03-02".into()),
            end_date: Some("2024-03-01".into()),
            user_id: None,
        };
        assert!(reversed.validate().is_err());

        let ok = StatsQuery {
            start_date: Some("2024-03-01".into()),
            end_date: Some("2024-03-01".into()),
            user_id: None,
        };
        assert!(ok.validate().is_ok());
        let (s, e) = ok.range().unwrap();
        assert_eq!(s, e);
    }
}
