//! Feed/metadata reconciliation and the upcoming-schedule refresh.

pub mod classifier;
pub mod reconciler;
pub mod schedule;

pub use classifier::{BroadcastState, ResolvedVideo, classify_broadcast, resolve_metadata};
pub use reconciler::{ReconcileOutcome, Reconciler, merge_announcements, partition_videos};
pub use schedule::{ArchiveReason, RefreshOutcome, UpcomingRefresher, plan_refresh};

use tracing::warn;

use crate::Result;
use crate::youtube::{MAX_METADATA_BATCH, MetadataSource};

/// Metadata lookup result for a set of ids.
#[derive(Debug, Default)]
pub struct Resolution {
    pub resolved: Vec<ResolvedVideo>,
    /// Ids the source returned but that could not be classified.
    pub rejected: Vec<String>,
}

/// Look up and classify `source_ids` in chunks of [`MAX_METADATA_BATCH`].
///
/// Lookup failures abort; classification failures skip the item.
pub async fn resolve_all(
    metadata: &dyn MetadataSource,
    source_ids: &[String],
) -> Result<Resolution> {
    let mut resolution = Resolution::default();
    for chunk in source_ids.chunks(MAX_METADATA_BATCH) {
        for item in metadata.fetch_metadata(chunk).await? {
            match resolve_metadata(&item) {
                Ok(resolved) => resolution.resolved.push(resolved),
                Err(e) => {
                    warn!(source_id = %item.source_id, "Skipping video metadata: {}", e);
                    resolution.rejected.push(item.source_id);
                }
            }
        }
    }
    Ok(resolution)
}
