use crate::domain::narration::content_key;
use crate::infrastructure::repositories::{
    NarrationRepository, RecordSummary, RepositoryError, StoreStats,
};
use async_trait::async_trait;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Higher is better: audio counts double, anything but a standalone translation adds one
pub fn retention_score(summary: &RecordSummary) -> u8 {
    let audio = if summary.audio_present { 2 } else { 0 };
    let complete = if summary.is_standalone_translation() { 0 } else { 1 };
    audio + complete
}

/// Orders records best first: score, then newest, then id
pub fn compare_for_retention(a: &RecordSummary, b: &RecordSummary) -> Ordering {
    retention_score(b)
        .cmp(&retention_score(a))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupReport {
    /// Content keys with more than one record
    pub groups: usize,
    pub kept: Vec<Uuid>,
    pub removed: Vec<Uuid>,
    pub dry_run: bool,
}

pub struct CleanupService {
    store: Arc<dyn NarrationRepository>,
}

impl CleanupService {
    pub fn new(store: Arc<dyn NarrationRepository>) -> Self {
        Self { store }
    }
}

#[async_trait]
pub trait CleanupServiceApi: Send + Sync {
    /// Recompute content keys that are missing or stale. Returns how many changed.
    async fn backfill_content_keys(&self) -> Result<usize, RepositoryError>;

    /// Keep the best record of every content key and delete the rest.
    /// With `dry_run` nothing is deleted but the report is the same.
    async fn cleanup_duplicates(&self, dry_run: bool) -> Result<CleanupReport, RepositoryError>;

    async fn analyze(&self) -> Result<StoreStats, RepositoryError>;
}

#[async_trait]
impl CleanupServiceApi for CleanupService {
    async fn backfill_content_keys(&self) -> Result<usize, RepositoryError> {
        let summaries = self.store.list_summaries().await?;
        let mut updated = 0;

        for summary in summaries {
            let expected = content_key(&summary.original_text, summary.translated_text.as_deref());
            if summary.content_key == expected {
                continue;
            }
            self.store.set_content_key(summary.id, &expected).await?;
            updated += 1;
        }

        tracing::info!(updated = updated, "Content keys backfilled");
        Ok(updated)
    }

    async fn cleanup_duplicates(&self, dry_run: bool) -> Result<CleanupReport, RepositoryError> {
        let summaries = self.store.list_summaries().await?;
        let scanned = summaries.len();
        let plan = plan_cleanup(summaries);

        let mut report = CleanupReport {
            groups: plan.len(),
            dry_run,
            ..CleanupReport::default()
        };

        for (keep, remove) in plan {
            tracing::info!(
                kept = %keep,
                duplicates = remove.len(),
                dry_run = dry_run,
                "Duplicate group"
            );
            report.kept.push(keep);

            for id in remove {
                if !dry_run && !self.store.delete(id).await? {
                    tracing::warn!(record_id = %id, "Duplicate already gone");
                    continue;
                }
                report.removed.push(id);
            }
        }

        tracing::info!(
            scanned = scanned,
            groups = report.groups,
            removed = report.removed.len(),
            dry_run = dry_run,
            "Duplicate cleanup finished"
        );

        Ok(report)
    }

    async fn analyze(&self) -> Result<StoreStats, RepositoryError> {
        self.store.stats().await
    }
}

/// For every content key with duplicates: the id to keep and the ids to delete
fn plan_cleanup(summaries: Vec<RecordSummary>) -> Vec<(Uuid, Vec<Uuid>)> {
    let mut groups: BTreeMap<String, Vec<RecordSummary>> = BTreeMap::new();
    for summary in summaries {
        let key = content_key(&summary.original_text, summary.translated_text.as_deref());
        groups.entry(key).or_default().push(summary);
    }

    groups
        .into_values()
        .filter(|group| group.len() > 1)
        .map(|mut group| {
            group.sort_by(compare_for_retention);
            let keep = group[0].id;
            let remove = group[1..].iter().map(|s| s.id).collect();
            (keep, remove)
        })
        .collect()
}
