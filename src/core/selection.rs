use std::path::{Path, PathBuf};

/// The user's current file choices. Paths stay unset until picked in the
/// GUI; the output path is only filled in once an export location has been
/// confirmed.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub video_path: Option<PathBuf>,
    pub music_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

impl Selection {
    /// Both inputs picked, so a merge could be started.
    pub fn ready(&self) -> bool {
        self.video_path.is_some() && self.music_path.is_some()
    }

    /// Default export name: "<video stem>_with_music.mp4" next to the video.
    pub fn suggested_output(&self) -> Option<PathBuf> {
        let video = self.video_path.as_deref()?;
        let stem = video.file_stem().and_then(|s| s.to_str()).unwrap_or("merged");
        let name = format!("{}_with_music.mp4", stem);
        Some(match video.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        })
    }
}

/// Exports are always .mp4; append the extension if the user typed a name
/// without it.
pub fn ensure_mp4_extension(path: &Path) -> PathBuf {
    let is_mp4 = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false);

    if is_mp4 {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".mp4");
        PathBuf::from(name)
    }
}
