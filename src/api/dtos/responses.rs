use serde::Serialize;
use chrono::NaiveDate;
use crate::domain::models::workload::WorkloadView;
use crate::domain::services::statistics::DeveloperWorkload;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Serialize)]
pub struct WorkloadPage {
    pub data: Vec<WorkloadView>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadStatsResponse {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub users: Vec<DeveloperWorkload>,
}
