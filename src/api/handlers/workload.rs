use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::dtos::requests::{CreateWorkloadRequest, ListWorkloadQuery, StatsQuery, UpdateWorkloadRequest};
use crate::api::dtos::responses::{MessageResponse, WorkloadPage, WorkloadStatsResponse};
use crate::api::extractors::{auth::AuthUser, validated::{ValidatedJson, ValidatedQuery}};
use crate::domain::models::user::User;
use crate::domain::models::workload::{PageRequest, WorkloadEntry, WorkloadView};
use crate::domain::services::access::require_owner_or_admin;
use crate::domain::services::statistics::{project_summary, workload_by_developer};
use crate::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Attaches each entry's owner, loaded in one query.
async fn expand_owners(state: &AppState, entries: Vec<WorkloadEntry>) -> Result<Vec<WorkloadView>, AppError> {
    let owners = load_owners(state, &entries).await?;
    let by_id: HashMap<&str, &User> = owners.iter().map(|u| (u.id.as_str(), u)).collect();

    Ok(entries
        .into_iter()
        .map(|entry| {
            let user = by_id.get(entry.user_id.as_str()).map(|u| u.public());
            WorkloadView { entry, user }
        })
        .collect())
}

async fn load_owners(state: &AppState, entries: &[WorkloadEntry]) -> Result<Vec<User>, AppError> {
    let mut ids: Vec<String> = entries.iter().map(|e| e.user_id.clone()).collect();
    ids.sort();
    ids.dedup();
    state.user_repo.find_by_ids(&ids).await
}

async fn load_for_owner_or_admin(state: &AppState, auth: &AuthUser, id: &str) -> Result<WorkloadEntry, AppError> {
    let entry = state.workload_repo.find_by_id(id).await?
        .ok_or(AppError::NotFound("Workload entry not found".into()))?;
    require_owner_or_admin(&auth.user, &entry.user_id)?;
    Ok(entry)
}

/// Resolves whose data a request may read: admins may name anyone (or no one),
/// everyone else is pinned to themselves.
fn scoped_user_id(auth: &AuthUser, requested: Option<&str>) -> Result<Option<String>, AppError> {
    if auth.user.is_admin() {
        return Ok(requested.map(str::to_string));
    }
    match requested {
        Some(id) if id != auth.user.id => Err(AppError::Forbidden("You can only access your own workload".into())),
        _ => Ok(Some(auth.user.id.clone())),
    }
}

pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateWorkloadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entry = WorkloadEntry::new(payload.into_new_entry(auth.user.id.clone())?);
    let created = state.workload_repo.create(&entry).await?;

    info!("Created workload entry {} for user {}", created.id, auth.user.id);

    let view = WorkloadView { entry: created, user: Some(auth.user.public()) };
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListWorkloadQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut filter = query.to_filter()?;
    filter.user_id = scoped_user_id(&auth, query.user_id.as_deref())?;

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        limit: query.limit.unwrap_or(defaults.limit),
    };

    let (entries, total) = state.workload_repo.list(&filter, page).await?;
    let data = expand_owners(&state, entries).await?;

    Ok(Json(WorkloadPage {
        data,
        total,
        page: page.page,
        limit: page.limit,
        pages: page.page_count(total),
    }))
}

pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = load_for_owner_or_admin(&state, &auth, &id).await?;
    let mut views = expand_owners(&state, vec![entry]).await?;
    views.pop()
        .map(Json)
        .ok_or(AppError::NotFound("Workload entry not found".into()))
}

pub async fn update_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateWorkloadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut entry = load_for_owner_or_admin(&state, &auth, &id).await?;

    payload.into_changes()?.apply(&mut entry);
    let updated = state.workload_repo.update(&entry).await?;

    info!("Workload entry {} updated by {}", updated.id, auth.user.id);

    let mut views = expand_owners(&state, vec![updated]).await?;
    views.pop()
        .map(Json)
        .ok_or(AppError::NotFound("Workload entry not found".into()))
}

pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = load_for_owner_or_admin(&state, &auth, &id).await?;
    state.workload_repo.delete(&entry.id).await?;

    info!("Workload entry {} deleted by {}", entry.id, auth.user.id);

    Ok(Json(MessageResponse::new("Workload entry deleted successfully")))
}

pub async fn workload_stats(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = query.range()?;
    let user_id = scoped_user_id(&auth, query.user_id.as_deref())?;

    let entries = state.workload_repo.list_in_range(start, end, user_id.as_deref()).await?;
    let owners = load_owners(&state, &entries).await?;

    Ok(Json(WorkloadStatsResponse {
        start_date: start,
        end_date: end,
        users: workload_by_developer(&entries, &owners),
    }))
}

pub async fn project_summary_report(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = query.range()?;
    let entries = state.workload_repo.list_in_range(start, end, None).await?;
    Ok(Json(project_summary(&entries)))
}
