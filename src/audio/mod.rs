pub mod player;

pub use player::MusicPreview;
