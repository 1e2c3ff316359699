use crate::domain::{
    models::workload::{PageRequest, WorkloadEntry, WorkloadFilter},
    ports::WorkloadRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{types::Json, QueryBuilder, Postgres, PgPool};

const ENTRY_COLUMNS: &str = "id, user_id, project, task, task_type, hours_spent, date, status, priority, description, blockers, tags, dependencies, created_at, updated_at";

pub struct PostgresWorkloadRepo {
    pool: PgPool,
}

impl PostgresWorkloadRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a WorkloadFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(user_id) = &filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(start) = filter.start_date {
        qb.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND date <= ").push_bind(end);
    }
    if let Some(project) = &filter.project {
        qb.push(" AND project = ").push_bind(project);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(task_type) = filter.task_type {
        qb.push(" AND task_type = ").push_bind(task_type.as_str());
    }
}

#[async_trait]
impl WorkloadRepository for PostgresWorkloadRepo {
    async fn create(&self, entry: &WorkloadEntry) -> Result<WorkloadEntry, AppError> {
        sqlx::query_as::<_, WorkloadEntry>(&format!(
            "INSERT INTO workload_entries ({ENTRY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) RETURNING {ENTRY_COLUMNS}"
        ))
            .bind(&entry.id)
            .bind(&entry.user_id)
            .bind(&entry.project)
            .bind(&entry.task)
            .bind(entry.task_type.as_str())
            .bind(entry.hours_spent)
            .bind(entry.date)
            .bind(entry.status.as_str())
            .bind(entry.priority.as_str())
            .bind(&entry.description)
            .bind(&entry.blockers)
            .bind(Json(&entry.tags))
            .bind(Json(&entry.dependencies))
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<WorkloadEntry>, AppError> {
        sqlx::query_as::<_, WorkloadEntry>(&format!("SELECT {ENTRY_COLUMNS} FROM workload_entries WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, filter: &WorkloadFilter, page: PageRequest) -> Result<(Vec<WorkloadEntry>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM workload_entries");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {ENTRY_COLUMNS} FROM workload_entries"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY date DESC, created_at DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let entries = qb
            .build_query_as::<WorkloadEntry>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok((entries, total))
    }

    async fn list_in_range(&self, start: NaiveDate, end: NaiveDate, user_id: Option<&str>) -> Result<Vec<WorkloadEntry>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {ENTRY_COLUMNS} FROM workload_entries WHERE date >= "));
        qb.push_bind(start).push(" AND date <= ").push_bind(end);
        if let Some(user_id) = user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        qb.push(" ORDER BY date ASC");

        qb.build_query_as::<WorkloadEntry>()
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, entry: &WorkloadEntry) -> Result<WorkloadEntry, AppError> {
        sqlx::query_as::<_, WorkloadEntry>(&format!(
            "UPDATE workload_entries SET project = $1, task = $2, task_type = $3, hours_spent = $4, date = $5, status = $6, priority = $7, description = $8, blockers = $9, tags = $10, dependencies = $11, updated_at = $12 WHERE id = $13 RETURNING {ENTRY_COLUMNS}"
        ))
            .bind(&entry.project)
            .bind(&entry.task)
            .bind(entry.task_type.as_str())
            .bind(entry.hours_spent)
            .bind(entry.date)
            .bind(entry.status.as_str())
            .bind(entry.priority.as_str())
            .bind(&entry.description)
            .bind(&entry.blockers)
            .bind(Json(&entry.tags))
            .bind(Json(&entry.dependencies))
            .bind(entry.updated_at)
            .bind(&entry.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Workload entry not found".into()))
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM workload_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Workload entry not found".into()));
        }
        Ok(())
    }
}
