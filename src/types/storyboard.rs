use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const UNTITLED: &str = "Untitled storyboard";
const MAX_TITLE_CHARS: usize = 60;

/// One trimmed, non-empty fragment of a script.
///
/// Only the segmenter builds these, so a `Scene` is never blank and never
/// contains the scene delimiter.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Scene(String);

impl Scene {
    pub(crate) fn from_fragment(fragment: &str) -> Self {
        Self(fragment.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for Scene {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SceneRecord {
    pub id: Uuid,
    /// 1-based position within the storyboard.
    pub number: usize,
    pub script: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Storyboard {
    pub id: Uuid,
    pub title: String,
    pub scenes: Vec<SceneRecord>,
    pub last_edited: DateTime<Utc>,
}

impl Storyboard {
    /// Builds a fully populated storyboard, one record per scene.
    pub fn from_scenes(title: impl Into<String>, scenes: &[Scene], now: DateTime<Utc>) -> Self {
        let scenes = scenes
            .iter()
            .enumerate()
            .map(|(index, scene)| SceneRecord {
                id: Uuid::new_v4(),
                number: index + 1,
                script: scene.as_str().to_string(),
                files: Vec::new(),
                notes: String::new(),
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            scenes,
            last_edited: now,
        }
    }

    pub fn scripts(&self) -> Vec<&str> {
        self.scenes.iter().map(|s| s.script.as_str()).collect()
    }

    /// Rebuilds this storyboard from an edited scene sequence.
    ///
    /// Scene records are carried over so their ids, files and notes survive:
    /// first by identical script text, then by position for scenes whose text
    /// changed. Scenes with no counterpart get fresh records. A title that no
    /// longer matches the one derived from the old scenes was set by hand and
    /// is kept unless `title` overrides it.
    pub fn revise(&self, title: Option<String>, scenes: &[Scene], now: DateTime<Utc>) -> Self {
        let mut claimed = vec![false; self.scenes.len()];
        let mut matches: Vec<Option<usize>> = scenes
            .iter()
            .map(|scene| {
                let found = self
                    .scenes
                    .iter()
                    .enumerate()
                    .position(|(i, old)| !claimed[i] && old.script == scene.as_str());
                if let Some(i) = found {
                    claimed[i] = true;
                }
                found
            })
            .collect();
        for (index, slot) in matches.iter_mut().enumerate() {
            if slot.is_none() && index < claimed.len() && !claimed[index] {
                claimed[index] = true;
                *slot = Some(index);
            }
        }

        let records = scenes
            .iter()
            .zip(matches)
            .enumerate()
            .map(|(index, (scene, old))| match old.map(|i| &self.scenes[i]) {
                Some(old) => SceneRecord {
                    number: index + 1,
                    script: scene.as_str().to_string(),
                    ..old.clone()
                },
                None => SceneRecord {
                    id: Uuid::new_v4(),
                    number: index + 1,
                    script: scene.as_str().to_string(),
                    files: Vec::new(),
                    notes: String::new(),
                },
            })
            .collect();

        let derived_before = derive_title_from(self.scenes.first().map(|s| s.script.as_str()));
        let title = match title {
            Some(title) => title,
            None if self.title != derived_before => self.title.clone(),
            None => derive_title(scenes),
        };

        Self {
            id: self.id,
            title,
            scenes: records,
            last_edited: now,
        }
    }
}

/// One element of the persisted collection.
///
/// The collection holds either plain scene strings or storyboards; a JSON
/// string reads as a scene and an object as a storyboard.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StoredRecord {
    Scene(String),
    Storyboard(Storyboard),
}

impl StoredRecord {
    pub fn as_storyboard(&self) -> Option<&Storyboard> {
        match self {
            StoredRecord::Storyboard(board) => Some(board),
            StoredRecord::Scene(_) => None,
        }
    }
}

impl From<Scene> for StoredRecord {
    fn from(scene: Scene) -> Self {
        StoredRecord::Scene(scene.into_inner())
    }
}

impl From<Storyboard> for StoredRecord {
    fn from(board: Storyboard) -> Self {
        StoredRecord::Storyboard(board)
    }
}

fn title_noise() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // leading punctuation, or any whitespace run
    RE.get_or_init(|| Regex::new(r"^[\p{P}\s]+|\s+").expect("title pattern is valid"))
}

/// Derives a storyboard title from its first scene.
pub fn derive_title(scenes: &[Scene]) -> String {
    derive_title_from(scenes.first().map(Scene::as_str))
}

fn derive_title_from(first: Option<&str>) -> String {
    let Some(first) = first else {
        return UNTITLED.to_string();
    };

    let collapsed = title_noise().replace_all(first, |caps: &regex::Captures| {
        if caps.get(0).is_some_and(|m| m.start() == 0) {
            String::new()
        } else {
            " ".to_string()
        }
    });
    let collapsed = collapsed.trim();
    if collapsed.is_empty() {
        return UNTITLED.to_string();
    }

    let mut title: String = collapsed.chars().take(MAX_TITLE_CHARS).collect();
    if collapsed.chars().count() > MAX_TITLE_CHARS {
        title = title.trim_end().to_string();
        title.push('…');
    }
    title
}
