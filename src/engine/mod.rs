pub mod caps;
pub mod locator;
pub mod volume;

pub use caps::FilterCaps;
pub use locator::{Engine, EngineSource, FFMPEG_ENV_VAR};
pub use volume::{scale_filter, VolumeError};
