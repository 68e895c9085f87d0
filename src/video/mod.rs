pub mod info_loader;
pub mod merge;
pub mod probe;
pub mod runner;
pub mod thumbnail;

pub use info_loader::*;
pub use merge::MergeJob;
pub use probe::{probe_video, VideoInfo, FALLBACK_FPS};
pub use runner::JobRunner;
pub use thumbnail::*;
