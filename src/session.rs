//! Window-independent state and event handlers of the authoring shell.
//!
//! The desktop front end owns a [`Session`] and forwards user events to it;
//! nothing here touches egui, so the whole flow is testable headless.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::debounce::Debouncer;
use crate::error::ActionError;
use crate::export::{DirectoryExporter, ExportBlob, ExportSink};
use crate::parsing::{join_scenes, segment, DELIMITER};
use crate::persistence::{PersistMode, ScenePersister};
use crate::storage::{JsonFileStore, RecordStore};
use crate::types::storyboard::{Scene, StoredRecord};

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter your script before converting.";
pub const AUTOSAVED_MESSAGE: &str = "Scenes auto-saved";
pub const LOADED_SCENES_MESSAGE: &str = "Loaded saved scenes";
pub const ERROR_PREFIX: &str = "❌ Error: ";

/// The single status line under the editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Success(String),
    Error(String),
}

impl Status {
    pub fn message(&self) -> &str {
        match self {
            Status::Idle => "",
            Status::Success(msg) | Status::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

pub struct Session {
    input: String,
    status: Status,
    scenes: Vec<Scene>,
    autosave: Debouncer<String>,
    store: Box<dyn RecordStore>,
    exporter: Box<dyn ExportSink>,
    persister: ScenePersister,
    export_filename: String,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            Box::new(JsonFileStore::new(&config.storage_dir)),
            Box::new(DirectoryExporter::new(&config.export_dir)),
            ScenePersister::new(config.persist_mode),
            config.export_filename.clone(),
            config.autosave_quiet(),
        )
    }

    pub fn with_parts(
        store: Box<dyn RecordStore>,
        exporter: Box<dyn ExportSink>,
        persister: ScenePersister,
        export_filename: String,
        autosave_quiet: Duration,
    ) -> Self {
        Self {
            input: String::new(),
            status: Status::Idle,
            scenes: Vec::new(),
            autosave: Debouncer::new(autosave_quiet),
            store,
            exporter,
            persister,
            export_filename,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Direct access for the text widget; follow edits with
    /// [`on_input_changed`](Self::on_input_changed).
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Scenes produced by the last successful segmentation.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Restores the editor from whatever the store holds.
    pub fn on_start(&mut self) {
        let records = self.store.load();

        if let Some(board) = records.first().and_then(StoredRecord::as_storyboard) {
            self.input = join_scenes(&board.scripts());
            if self.persister.mode() == PersistMode::Storyboards {
                self.persister.resume_draft(board.id);
            }
            self.status = Status::Success(format!("Loaded saved storyboard '{}'", board.title));
            info!(id = %board.id, scenes = board.scenes.len(), "restored storyboard");
            return;
        }

        let saved_scenes: Vec<&str> = records
            .iter()
            .filter_map(|record| match record {
                StoredRecord::Scene(text) => Some(text.as_str()),
                StoredRecord::Storyboard(_) => None,
            })
            .collect();
        if !saved_scenes.is_empty() {
            self.input = join_scenes(&saved_scenes);
            self.status = Status::Success(LOADED_SCENES_MESSAGE.to_string());
            info!(scenes = saved_scenes.len(), "restored saved scenes");
        }
    }

    /// Clears the status line and restarts the auto-save quiet period.
    pub fn on_input_changed(&mut self, now: Instant) {
        self.status = Status::Idle;
        self.autosave.schedule(self.input.clone(), now);
    }

    /// How long until the pending auto-save is due, if one is pending.
    pub fn next_tick_in(&self, now: Instant) -> Option<Duration> {
        self.autosave.time_remaining(now)
    }

    /// Runs a due auto-save. Returns true when one fired.
    ///
    /// Only text containing the scene delimiter is saved, and failures never
    /// reach the status line.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        let Some(text) = self.autosave.poll(now) else {
            return false;
        };
        if !text.contains(DELIMITER) {
            debug!("auto-save skipped, no scene break yet");
            return true;
        }

        match segment(text.as_str()) {
            Ok(scenes) => {
                if self.persister.persist(&*self.store, &scenes, Utc::now()) {
                    self.status = Status::Success(AUTOSAVED_MESSAGE.to_string());
                }
                self.scenes = scenes;
            }
            Err(e) => warn!("Auto-save error: {}", e),
        }
        true
    }

    /// Segments the input, persists it and exports the scene table.
    pub fn on_convert(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            self.status = Status::Error(EMPTY_INPUT_MESSAGE.to_string());
            return;
        }
        // the conversion saves the same state a pending auto-save would
        self.autosave.cancel();

        self.status = match self.convert(&text) {
            Ok(saved_to) => Status::Success(format!(
                "Converted! Saved to {}",
                saved_to.display()
            )),
            Err(e) => {
                warn!("Conversion error: {}", e);
                Status::Error(format!("{ERROR_PREFIX}{e}"))
            }
        };
    }

    fn convert(&mut self, text: &str) -> Result<std::path::PathBuf, ActionError> {
        let scenes = segment(text)?;
        self.persister.persist(&*self.store, &scenes, Utc::now());

        let blob = ExportBlob::csv(&scenes);
        let path = self.exporter.trigger_download(&blob, &self.export_filename)?;
        info!(scenes = scenes.len(), path = %path.display(), "script converted");
        self.scenes = scenes;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::export::csv::BOM;
    use crate::storage::MemoryStore;
    use crate::types::storyboard::Storyboard;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    const QUIET: Duration = Duration::from_millis(1000);

    /// Records every export instead of writing files.
    #[derive(Clone, Default)]
    struct RecordingSink {
        saved: Rc<RefCell<Vec<(String, String)>>>,
        fail: bool,
    }

    impl ExportSink for RecordingSink {
        fn trigger_download(&self, blob: &ExportBlob, filename: &str) -> Result<PathBuf, ExportError> {
            if self.fail {
                return Err(ExportError::EmptyFilename);
            }
            self.saved
                .borrow_mut()
                .push((filename.to_string(), blob.content.clone()));
            Ok(PathBuf::from("/exports").join(filename))
        }
    }

    struct SharedStore(Rc<MemoryStore>);

    impl RecordStore for SharedStore {
        fn load(&self) -> Vec<StoredRecord> {
            self.0.load()
        }
        fn save(&self, records: &[StoredRecord]) -> bool {
            self.0.save(records)
        }
    }

    fn session_with(
        store: Rc<MemoryStore>,
        sink: RecordingSink,
        mode: PersistMode,
    ) -> Session {
        Session::with_parts(
            Box::new(SharedStore(store)),
            Box::new(sink),
            ScenePersister::new(mode),
            "script_breakdown.csv".to_string(),
            QUIET,
        )
    }

    fn type_text(session: &mut Session, text: &str, now: Instant) {
        *session.input_mut() = text.to_string();
        session.on_input_changed(now);
    }

    #[test]
    fn convert_exports_table_and_saves_scenes() {
        let store = Rc::new(MemoryStore::new());
        let sink = RecordingSink::default();
        let mut session = session_with(store.clone(), sink.clone(), PersistMode::Scenes);

        type_text(&mut session, "  first, scene।second  ", Instant::now());
        session.on_convert();

        assert_eq!(
            session.status(),
            &Status::Success("Converted! Saved to /exports/script_breakdown.csv".to_string())
        );
        let saved = sink.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "script_breakdown.csv");
        assert_eq!(
            saved[0].1,
            format!("{BOM}Scene Number,VO/Script,Files,Notes\n1,\"first, scene\",,\n2,second,,")
        );
        assert_eq!(
            store.snapshot(),
            vec![
                StoredRecord::Scene("first, scene".to_string()),
                StoredRecord::Scene("second".to_string())
            ]
        );
        assert_eq!(session.scenes().len(), 2);
    }

    #[test]
    fn convert_with_blank_input_asks_for_script() {
        let sink = RecordingSink::default();
        let mut session = session_with(Rc::new(MemoryStore::new()), sink.clone(), PersistMode::Scenes);

        type_text(&mut session, " \n\t ", Instant::now());
        session.on_convert();

        assert_eq!(session.status(), &Status::Error(EMPTY_INPUT_MESSAGE.to_string()));
        assert!(sink.saved.borrow().is_empty());
    }

    #[test]
    fn convert_with_only_delimiters_reports_no_scenes() {
        let mut session = session_with(
            Rc::new(MemoryStore::new()),
            RecordingSink::default(),
            PersistMode::Scenes,
        );
        type_text(&mut session, "। । ।", Instant::now());
        session.on_convert();

        assert!(session.status().is_error());
        assert_eq!(
            session.status().message(),
            "❌ Error: No valid scenes found in the input text"
        );
    }

    #[test]
    fn export_failure_is_shown_but_scenes_are_still_saved() {
        let store = Rc::new(MemoryStore::new());
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let mut session = session_with(store.clone(), sink, PersistMode::Scenes);

        type_text(&mut session, "a।b", Instant::now());
        session.on_convert();

        assert!(session.status().message().starts_with(ERROR_PREFIX));
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn storage_failure_does_not_block_conversion() {
        let sink = RecordingSink::default();
        let mut session = session_with(Rc::new(MemoryStore::failing()), sink.clone(), PersistMode::Scenes);

        type_text(&mut session, "a।b", Instant::now());
        session.on_convert();

        assert!(!session.status().is_error());
        assert_eq!(sink.saved.borrow().len(), 1);
    }

    #[test]
    fn autosave_waits_for_quiet_and_keeps_last_input() {
        let store = Rc::new(MemoryStore::new());
        let mut session = session_with(store.clone(), RecordingSink::default(), PersistMode::Scenes);
        let start = Instant::now();

        type_text(&mut session, "one।", start);
        type_text(&mut session, "one।two", start + Duration::from_millis(500));

        assert!(!session.on_tick(start + Duration::from_millis(1200)));
        assert!(store.snapshot().is_empty());
        assert_eq!(
            session.next_tick_in(start + Duration::from_millis(1200)),
            Some(Duration::from_millis(300))
        );

        assert!(session.on_tick(start + Duration::from_millis(1500)));
        assert_eq!(session.status(), &Status::Success(AUTOSAVED_MESSAGE.to_string()));
        assert_eq!(
            store.snapshot(),
            vec![
                StoredRecord::Scene("one".to_string()),
                StoredRecord::Scene("two".to_string())
            ]
        );
        assert_eq!(session.next_tick_in(start + Duration::from_millis(1500)), None);
    }

    #[test]
    fn autosave_ignores_text_without_scene_break() {
        let store = Rc::new(MemoryStore::new());
        let mut session = session_with(store.clone(), RecordingSink::default(), PersistMode::Scenes);
        let start = Instant::now();

        type_text(&mut session, "no break yet", start);
        assert!(session.on_tick(start + QUIET));

        assert!(store.snapshot().is_empty());
        assert_eq!(session.status(), &Status::Idle);
    }

    #[test]
    fn autosave_errors_stay_out_of_status() {
        let store = Rc::new(MemoryStore::new());
        let mut session = session_with(store.clone(), RecordingSink::default(), PersistMode::Scenes);
        let start = Instant::now();

        type_text(&mut session, " ।  । ", start);
        assert!(session.on_tick(start + QUIET));

        assert_eq!(session.status(), &Status::Idle);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn typing_clears_previous_status() {
        let mut session = session_with(
            Rc::new(MemoryStore::new()),
            RecordingSink::default(),
            PersistMode::Scenes,
        );
        session.on_convert();
        assert!(session.status().is_error());

        type_text(&mut session, "x", Instant::now());
        assert_eq!(session.status(), &Status::Idle);
        assert_eq!(session.status().message(), "");
    }

    #[test]
    fn start_restores_saved_scenes() {
        let store = Rc::new(MemoryStore::with_records(vec![
            StoredRecord::Scene("one".to_string()),
            StoredRecord::Scene("two".to_string()),
        ]));
        let mut session = session_with(store, RecordingSink::default(), PersistMode::Scenes);

        session.on_start();

        assert_eq!(session.input(), "one।\ntwo");
        assert_eq!(session.status(), &Status::Success(LOADED_SCENES_MESSAGE.to_string()));
    }

    #[test]
    fn start_with_empty_store_leaves_editor_blank() {
        let mut session = session_with(
            Rc::new(MemoryStore::new()),
            RecordingSink::default(),
            PersistMode::Scenes,
        );
        session.on_start();
        assert_eq!(session.input(), "");
        assert_eq!(session.status(), &Status::Idle);
    }

    #[test]
    fn start_resumes_latest_storyboard_as_draft() {
        let board = Storyboard::from_scenes("Pilot", &segment("a।b").unwrap(), Utc::now());
        let board_id = board.id;
        let store = Rc::new(MemoryStore::with_records(vec![board.into()]));
        let mut session = session_with(store.clone(), RecordingSink::default(), PersistMode::Storyboards);

        session.on_start();
        assert_eq!(session.input(), "a।\nb");
        assert_eq!(
            session.status().message(),
            "Loaded saved storyboard 'Pilot'"
        );

        *session.input_mut() = "a।b।c".to_string();
        session.on_convert();

        let records = store.snapshot();
        assert_eq!(records.len(), 1);
        let head = records[0].as_storyboard().unwrap();
        assert_eq!(head.id, board_id);
        assert_eq!(head.scripts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn scenes_mode_autosave_leaves_storyboards_alone() {
        let board = Storyboard::from_scenes("Pilot", &segment("a।b").unwrap(), Utc::now());
        let store = Rc::new(MemoryStore::with_records(vec![board.clone().into()]));
        let mut session = session_with(store.clone(), RecordingSink::default(), PersistMode::Scenes);
        session.on_start();

        let t0 = Instant::now();
        type_text(&mut session, "x।y", t0);
        assert!(session.on_tick(t0 + QUIET));

        assert_eq!(
            store.snapshot(),
            vec![
                StoredRecord::Scene("x".to_string()),
                StoredRecord::Scene("y".to_string()),
                board.into()
            ]
        );
    }
}
