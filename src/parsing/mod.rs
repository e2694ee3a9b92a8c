pub mod segmenter;

// Re-export the main parsing function for convenience
pub use segmenter::{join_scenes, segment, DELIMITER};
