use crate::{error::AppResult, models::ReportStatus, storage::SharedStorage};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReportStats {
    pub pending: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub total: u64,
}

impl ReportStats {
    /// Fold grouped counts; missing statuses stay zero and `total` is
    /// the sum of the groups.
    pub fn from_counts(counts: impl IntoIterator<Item = (ReportStatus, u64)>) -> Self {
        let mut stats = Self::default();
        for (status, count) in counts {
            match status {
                ReportStatus::Pending => stats.pending += count,
                ReportStatus::InProgress => stats.in_progress += count,
                ReportStatus::Resolved => stats.resolved += count,
            }
        }
        stats.total = stats.pending + stats.in_progress + stats.resolved;
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryCount {
    pub category_id: Option<String>,
    pub category: String,
    pub count: u64,
}

pub struct AnalyticsService {
    storage: SharedStorage,
}

impl AnalyticsService {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn stats(&self) -> AppResult<ReportStats> {
        let counts = self.storage.count_reports_by_status().await?;
        Ok(ReportStats::from_counts(counts))
    }

    /// One row per distinct category id on a report, largest first.
    pub async fn reports_by_category(&self) -> AppResult<Vec<CategoryCount>> {
        let counts = self.storage.count_reports_by_category().await?;
        let names: HashMap<String, String> = self
            .storage
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut rows: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category_id, count)| {
                let category = category_id
                    .as_ref()
                    .and_then(|id| names.get(id))
                    .cloned()
                    .unwrap_or_else(|| UNCATEGORIZED.to_string());
                CategoryCount {
                    category_id,
                    category,
                    count,
                }
            })
            .collect();

        rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        Ok(rows)
    }
}
