use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::SegmentError;
use crate::parsing::segment;
use crate::storage::RecordStore;
use crate::types::storyboard::{derive_title, Scene, Storyboard, StoredRecord};

/// What a successful segmentation writes to the store.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// The flat scene list is replaced; stored storyboards are kept.
    #[default]
    Scenes,
    /// A storyboard built from the scenes is prepended to the collection.
    Storyboards,
}

/// Flat collection: one record per scene.
pub fn scene_records(scenes: &[Scene]) -> Vec<StoredRecord> {
    scenes.iter().cloned().map(StoredRecord::from).collect()
}

/// Replaces the flat scenes in `records` with `scenes`.
///
/// Storyboards are kept after the new scenes, so the scene list stays the
/// head of the collection and is what a restart restores.
pub fn with_scenes(records: Vec<StoredRecord>, scenes: &[Scene]) -> Vec<StoredRecord> {
    let mut updated = scene_records(scenes);
    updated.extend(
        records
            .into_iter()
            .filter(|record| matches!(record, StoredRecord::Storyboard(_))),
    );
    updated
}

/// Puts `board` at the head of `records`.
///
/// An older copy of the same storyboard is dropped first, so a draft that is
/// saved repeatedly occupies a single slot.
pub fn with_storyboard(mut records: Vec<StoredRecord>, board: Storyboard) -> Vec<StoredRecord> {
    records.retain(|record| record.as_storyboard().map_or(true, |b| b.id != board.id));
    records.insert(0, board.into());
    records
}

/// Writes segmentation results to a store according to a [`PersistMode`].
///
/// In storyboard mode the persister remembers the storyboard it last wrote so
/// later saves in the same session revise it instead of stacking new ones.
/// Revising keeps the ids, files and notes of scenes that are still there.
#[derive(Debug, Clone, Default)]
pub struct ScenePersister {
    mode: PersistMode,
    title: Option<String>,
    draft: Option<Uuid>,
}

impl ScenePersister {
    pub fn new(mode: PersistMode) -> Self {
        Self {
            mode,
            title: None,
            draft: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn mode(&self) -> PersistMode {
        self.mode
    }

    /// Continue editing a storyboard that is already stored.
    pub fn resume_draft(&mut self, id: Uuid) {
        self.draft = Some(id);
    }

    /// Id of the storyboard written by the last successful save, if any.
    pub fn draft_id(&self) -> Option<Uuid> {
        self.draft
    }

    /// Best-effort write. A failure is logged and reported as `false`.
    pub fn persist(
        &mut self,
        store: &dyn RecordStore,
        scenes: &[Scene],
        now: DateTime<Utc>,
    ) -> bool {
        let saved = match self.mode {
            PersistMode::Scenes => store.save(&with_scenes(store.load(), scenes)),
            PersistMode::Storyboards => {
                let records = store.load();
                let stored = self.draft.and_then(|id| {
                    records
                        .iter()
                        .filter_map(StoredRecord::as_storyboard)
                        .find(|board| board.id == id)
                });
                let board = match stored {
                    Some(stored) => stored.revise(self.title.clone(), scenes, now),
                    None => {
                        let title = self.title.clone().unwrap_or_else(|| derive_title(scenes));
                        let mut board = Storyboard::from_scenes(title, scenes, now);
                        if let Some(id) = self.draft {
                            board.id = id;
                        }
                        board
                    }
                };
                let board_id = board.id;
                let saved = store.save(&with_storyboard(records, board));
                if saved {
                    self.draft = Some(board_id);
                }
                saved
            }
        };

        if saved {
            info!(mode = ?self.mode, scenes = scenes.len(), "scenes persisted");
        } else {
            warn!(mode = ?self.mode, "could not persist scenes, continuing without saving");
        }
        saved
    }
}

/// Segments `text` and, on success, persists the scenes.
///
/// Persistence is best effort: a failed save is logged and the scenes are
/// still returned.
pub fn segment_and_persist<'a>(
    text: impl Into<Option<&'a str>>,
    store: &dyn RecordStore,
    persister: &mut ScenePersister,
) -> Result<Vec<Scene>, SegmentError> {
    let scenes = segment(text)?;
    persister.persist(store, &scenes, Utc::now());
    Ok(scenes)
}
