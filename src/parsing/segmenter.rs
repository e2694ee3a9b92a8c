use crate::error::SegmentError;
use crate::types::storyboard::Scene;

/// Scene boundary in the source script (U+0964 DEVANAGARI DANDA).
pub const DELIMITER: char = '।';

/// Separator used when stored scenes are turned back into editable text.
pub const JOIN_SEPARATOR: &str = "।\n";

/// Splits a script into scenes on [`DELIMITER`].
///
/// Fragments are trimmed and empty ones dropped, so the result never holds a
/// blank scene and never contains the delimiter. Order follows the source text.
pub fn segment<'a>(text: impl Into<Option<&'a str>>) -> Result<Vec<Scene>, SegmentError> {
    let text = match text.into() {
        Some(t) if !t.is_empty() => t,
        _ => return Err(SegmentError::InvalidInput),
    };

    let scenes: Vec<Scene> = text
        .split(DELIMITER)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(Scene::from_fragment)
        .collect();

    if scenes.is_empty() {
        return Err(SegmentError::NoScenesFound);
    }
    Ok(scenes)
}

/// Rebuilds editable script text from stored scene strings.
pub fn join_scenes<S: AsRef<str>>(scenes: &[S]) -> String {
    scenes
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR)
}
