//! Aggregations behind the dashboard statistics endpoints.
//!
//! Entries are pulled from the repository by date range and grouped here;
//! the grouping keys and derived fields are the response contract.

use std::collections::{BTreeMap, HashMap};
use serde::Serialize;
use crate::domain::models::{
    user::{PublicUser, Role, RoleCount, User},
    workload::{EntryStatus, TaskType, WorkloadEntry},
};

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleBreakdown {
    pub role: Role,
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub by_role: Vec<RoleBreakdown>,
}

pub fn user_stats(counts: &[RoleCount]) -> UserStats {
    let mut by_role: Vec<RoleBreakdown> = counts
        .iter()
        .map(|c| RoleBreakdown {
            role: c.role,
            total: c.total,
            active: c.active,
            inactive: c.total - c.active,
        })
        .collect();
    by_role.sort_by_key(|b| Role::ALL.iter().position(|r| *r == b.role));

    let total_users = by_role.iter().map(|b| b.total).sum();
    let active_users = by_role.iter().map(|b| b.active).sum();

    UserStats {
        total_users,
        active_users,
        inactive_users: total_users - active_users,
        by_role,
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskTypeTotals {
    pub task_type: TaskType,
    pub total_hours: f64,
    pub task_count: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperWorkload {
    pub user: PublicUser,
    pub breakdown: Vec<TaskTypeTotals>,
    pub total_hours: f64,
    pub total_tasks: i64,
}

/// Groups by (owner, task type), then by owner. Owners missing from `owners`
/// are dropped. Sorted by total hours descending.
pub fn workload_by_developer(entries: &[WorkloadEntry], owners: &[User]) -> Vec<DeveloperWorkload> {
    let mut grouped: HashMap<&str, BTreeMap<TaskType, (f64, i64)>> = HashMap::new();
    for entry in entries {
        let slot = grouped
            .entry(entry.user_id.as_str())
            .or_default()
            .entry(entry.task_type)
            .or_insert((0.0, 0));
        slot.0 += entry.hours_spent;
        slot.1 += 1;
    }

    let owners: HashMap<&str, &User> = owners.iter().map(|u| (u.id.as_str(), u)).collect();

    let mut result: Vec<DeveloperWorkload> = grouped
        .into_iter()
        .filter_map(|(user_id, per_type)| {
            let owner = owners.get(user_id)?;
            let breakdown: Vec<TaskTypeTotals> = per_type
                .into_iter()
                .map(|(task_type, (total_hours, task_count))| TaskTypeTotals { task_type, total_hours, task_count })
                .collect();
            Some(DeveloperWorkload {
                user: owner.public(),
                total_hours: breakdown.iter().map(|b| b.total_hours).sum(),
                total_tasks: breakdown.iter().map(|b| b.task_count).sum(),
                breakdown,
            })
        })
        .collect();

    result.sort_by(|a, b| {
        b.total_hours
            .total_cmp(&a.total_hours)
            .then_with(|| a.user.username.cmp(&b.user.username))
    });
    result
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project: String,
    pub total_hours: f64,
    pub task_count: i64,
    pub completed_tasks: i64,
    pub blocked_tasks: i64,
    pub completion_rate: f64,
}

/// Groups by project. A group only exists with at least one entry, so the
/// completion rate never divides by zero.
pub fn project_summary(entries: &[WorkloadEntry]) -> Vec<ProjectSummary> {
    let mut grouped: HashMap<&str, ProjectSummary> = HashMap::new();
    for entry in entries {
        let summary = grouped.entry(entry.project.as_str()).or_insert_with(|| ProjectSummary {
            project: entry.project.clone(),
            total_hours: 0.0,
            task_count: 0,
            completed_tasks: 0,
            blocked_tasks: 0,
            completion_rate: 0.0,
        });
        summary.total_hours += entry.hours_spent;
        summary.task_count += 1;
        match entry.status {
            EntryStatus::Completed => summary.completed_tasks += 1,
            EntryStatus::Blocked => summary.blocked_tasks += 1,
            EntryStatus::Planned | EntryStatus::InProgress => {}
        }
    }

    let mut result: Vec<ProjectSummary> = grouped
        .into_values()
        .map(|mut s| {
            s.completion_rate = s.completed_tasks as f64 / s.task_count as f64 * 100.0;
            s
        })
        .collect();

    result.sort_by(|a, b| {
        b.total_hours
            .total_cmp(&a.total_hours)
            .then_with(|| a.project.cmp(&b.project))
    });
    result
}
