//! One-shot upload of the guest snapshot into a signed-in user's collection.

use crate::cloud::CloudStore;
use closet_common::{ClothingItem, ItemId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub item_id: ItemId,
    pub reason: String,
}

/// Per-item outcome of a batch upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub uploaded: Vec<ItemId>,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Create every item concurrently. One failure never stops the others.
pub async fn upload_all(
    cloud: Arc<dyn CloudStore>,
    uid: &str,
    items: Vec<ClothingItem>,
) -> SyncReport {
    let total = items.len();
    let mut tasks = JoinSet::new();
    // Items whose task has not reported back yet
    let mut pending: HashMap<ItemId, usize> = HashMap::new();

    for item in items {
        *pending.entry(item.id.clone()).or_default() += 1;
        let cloud = Arc::clone(&cloud);
        let uid = uid.to_string();
        tasks.spawn(async move {
            let result = cloud.create_item(&uid, &item).await;
            (item.id, result)
        });
    }

    let mut report = SyncReport::default();
    while let Some(joined) = tasks.join_next().await {
        let (id, result) = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Sync task aborted: {}", e);
                continue;
            }
        };

        if let Some(count) = pending.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                pending.remove(&id);
            }
        }

        match result {
            Ok(()) => report.uploaded.push(id),
            Err(e) => {
                warn!("Failed to sync item {}: {}", id, e);
                report.failed.push(SyncFailure {
                    item_id: id,
                    reason: e.to_string(),
                });
            }
        }
    }

    // A task that panicked never reported its item
    for (id, count) in pending {
        for _ in 0..count {
            report.failed.push(SyncFailure {
                item_id: id.clone(),
                reason: "upload task aborted".to_string(),
            });
        }
    }

    report.uploaded.sort();
    report.failed.sort_by(|a, b| a.item_id.cmp(&b.item_id));

    info!(
        "Synced {}/{} guest items for {}",
        report.uploaded.len(),
        total,
        uid
    );
    report
}
