pub mod activity;
pub mod ffmpeg;
pub mod files;
pub mod monitor;
pub mod pipeline;
pub mod storage;

pub use activity::SessionKey;
pub use pipeline::{StreamConfig, StreamStore};
