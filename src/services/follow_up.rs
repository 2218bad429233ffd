//! Best-effort secondary writes.
//!
//! A primary write (chapter insert, chapter delete, chapter read) is already
//! committed when its follow-ups run. Follow-ups never fail the request: a
//! miss or an error is logged with `warn!`, counted in
//! `secondary_writes_total{kind,outcome}` and reported back as a
//! [`FollowUpOutcome`] so callers and tests can see what happened.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryWrite {
    /// `chapters_count += delta` on the parent story, refreshing `updated_at`.
    AdjustChapterCount { story_id: Uuid, delta: i64 },
    /// `view_count += 1` on the parent story.
    RecordStoryView { story_id: Uuid },
}

impl SecondaryWrite {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AdjustChapterCount { .. } => "adjust_chapter_count",
            Self::RecordStoryView { .. } => "record_story_view",
        }
    }

    #[must_use]
    pub const fn story_id(&self) -> Uuid {
        match self {
            Self::AdjustChapterCount { story_id, .. } | Self::RecordStoryView { story_id } => {
                *story_id
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpOutcome {
    Applied,
    /// The target row no longer exists.
    Missed,
    Failed,
}

impl FollowUpOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Missed => "missed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Clone)]
pub struct FollowUps {
    store: Store,
}

impl FollowUps {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn apply(&self, write: SecondaryWrite) -> FollowUpOutcome {
        let result = match write {
            SecondaryWrite::AdjustChapterCount { story_id, delta } => {
                self.store.adjust_story_chapter_count(story_id, delta).await
            }
            SecondaryWrite::RecordStoryView { story_id } => {
                self.store.increment_story_views(story_id).await
            }
        };

        let outcome = match result {
            Ok(0) => {
                warn!(
                    kind = write.kind(),
                    story_id = %write.story_id(),
                    "Secondary write matched no story"
                );
                FollowUpOutcome::Missed
            }
            Ok(_) => {
                debug!(kind = write.kind(), story_id = %write.story_id(), "Secondary write applied");
                FollowUpOutcome::Applied
            }
            Err(e) => {
                warn!(
                    kind = write.kind(),
                    story_id = %write.story_id(),
                    error = %e,
                    "Secondary write failed"
                );
                FollowUpOutcome::Failed
            }
        };

        metrics::counter!(
            "secondary_writes_total",
            "kind" => write.kind(),
            "outcome" => outcome.as_str()
        )
        .increment(1);

        outcome
    }
}
