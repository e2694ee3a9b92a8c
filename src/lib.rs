//! Script-to-scene breakdown: split a script on the danda (।) into scenes,
//! export them as a CSV table or keep them as storyboard records.

pub mod config;
pub mod error;
pub mod types {
    pub mod storyboard;
}
pub mod parsing;
pub mod export;
pub mod storage;
pub mod persistence;
pub mod debounce;
pub mod session;

pub use error::SegmentError;
pub use export::csv::serialize;
pub use parsing::segment;
pub use types::storyboard::{Scene, Storyboard, StoredRecord};
