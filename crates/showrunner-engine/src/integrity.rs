//! Integrity validator — reconciles dispatch jobs against intents.
//!
//! A job is orphaned when it carries no intent reference, when the project
//! has no intents at all, or when its referenced intent no longer exists.
//! Orphans left behind by interrupted runs make the project look permanently
//! busy, so every state reload runs this first. Nothing else deletes jobs.

use std::collections::HashSet;

use serde::Serialize;
use showrunner_core::error::StoreError;
use showrunner_core::job::JobKind;
use showrunner_core::store::{DispatchJobStore, SceneIntentQueue};
use tracing::{info, warn};
use uuid::Uuid;

/// Result of an orphan sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrphanCleanup {
    /// Whether any orphaned job was found.
    pub had_orphans: bool,
    /// How many orphaned jobs were deleted.
    pub cleaned_count: usize,
}

/// Deletes every orphaned scene-write job for the project.
///
/// # Errors
///
/// Returns [`StoreError`] if intents or jobs cannot be listed. Individual
/// delete failures are logged and skipped.
pub async fn cleanup_orphans(
    intents: &dyn SceneIntentQueue,
    jobs: &dyn DispatchJobStore,
    project_id: Uuid,
) -> Result<OrphanCleanup, StoreError> {
    let valid_ids: HashSet<Uuid> = intents
        .list_by_project(project_id)
        .await?
        .into_iter()
        .map(|intent| intent.id)
        .collect();

    let mut found = 0usize;
    let mut cleaned = 0usize;
    for job in jobs.list_for_project(project_id, JobKind::SceneWrite).await? {
        let orphaned = match job.intent_id {
            None => true,
            Some(_) if valid_ids.is_empty() => true,
            Some(intent_id) => !valid_ids.contains(&intent_id),
        };
        if !orphaned {
            continue;
        }
        found += 1;
        match jobs.delete(job.id).await {
            Ok(()) => cleaned += 1,
            Err(error) => {
                warn!(%project_id, job_id = %job.id, %error, "failed to delete orphaned job");
            }
        }
    }

    if found > 0 {
        info!(%project_id, found, cleaned, "removed orphaned dispatch jobs");
    }

    Ok(OrphanCleanup {
        had_orphans: found > 0,
        cleaned_count: cleaned,
    })
}
