#[cfg(test)]
mod tests {

    use crate::core::Selection;
    use crate::engine::{Engine, EngineSource};
    use crate::gui::app::merge_enabled;
    use std::path::PathBuf;

    fn test_engine() -> Engine {
        Engine {
            ffmpeg: PathBuf::from("/usr/bin/ffmpeg"),
            ffprobe: Some(PathBuf::from("/usr/bin/ffprobe")),
            source: EngineSource::System,
        }
    }

    fn full_selection() -> Selection {
        Selection {
            video_path: Some(PathBuf::from("/clips/holiday.mp4")),
            music_path: Some(PathBuf::from("/music/track.mp3")),
            output_path: None,
        }
    }

    #[test]
    fn test_merge_enabled_with_everything_ready() {
        let engine = test_engine();
        assert!(merge_enabled(&full_selection(), Some(&engine), false));
    }

    #[test]
    fn test_merge_disabled_without_engine() {
        // No engine means the trigger never becomes live, regardless of
        // how many files are picked.
        assert!(!merge_enabled(&full_selection(), None, false));
    }

    #[test]
    fn test_merge_disabled_while_job_active() {
        let engine = test_engine();
        assert!(!merge_enabled(&full_selection(), Some(&engine), true));
    }

    #[test]
    fn test_merge_disabled_with_partial_selection() {
        let engine = test_engine();

        let mut selection = full_selection();
        selection.music_path = None;
        assert!(!merge_enabled(&selection, Some(&engine), false));

        let mut selection = full_selection();
        selection.video_path = None;
        assert!(!merge_enabled(&selection, Some(&engine), false));
    }
}
