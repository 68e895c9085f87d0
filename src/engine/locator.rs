use std::path::{Path, PathBuf};

/// Environment variable exported with the resolved ffmpeg path so child
/// tooling spawned by this process picks up the same binary.
pub const FFMPEG_ENV_VAR: &str = "SOUNDBED_FFMPEG";

/// Where the engine binary came from. Decided once at startup and never
/// re-probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSource {
    System,
    Bundled,
}

impl EngineSource {
    pub fn label(&self) -> &'static str {
        match self {
            EngineSource::System => "system-ffmpeg",
            EngineSource::Bundled => "bundled-ffmpeg",
        }
    }
}

/// Resolved media engine. `ffprobe` is optional: merging still needs it,
/// but a missing probe binary is reported at job time rather than treated
/// as "no engine at all".
#[derive(Debug, Clone)]
pub struct Engine {
    pub ffmpeg: PathBuf,
    pub ffprobe: Option<PathBuf>,
    pub source: EngineSource,
}

impl Engine {
    /// One-time probe, in order: a system install found on PATH, then a
    /// bundled sidecar copy next to our own executable. `None` means the
    /// app runs in degraded mode with merging disabled.
    pub fn locate() -> Option<Engine> {
        if let Some(ffmpeg) = find_on_path("ffmpeg") {
            log::info!("Using system ffmpeg at {}", ffmpeg.display());
            let ffprobe = find_on_path("ffprobe").or_else(|| sibling(&ffmpeg, "ffprobe"));
            return Some(Engine {
                ffmpeg,
                ffprobe,
                source: EngineSource::System,
            });
        }

        if let Some(ffmpeg) = bundled_candidate("ffmpeg") {
            log::info!("Using bundled ffmpeg at {}", ffmpeg.display());
            let ffprobe = bundled_candidate("ffprobe");
            return Some(Engine {
                ffmpeg,
                ffprobe,
                source: EngineSource::Bundled,
            });
        }

        log::warn!("No ffmpeg executable found; merging will be disabled");
        None
    }

    /// Publish the resolved path for child processes.
    pub fn export_env(&self) {
        std::env::set_var(FFMPEG_ENV_VAR, &self.ffmpeg);
    }
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_os = std::env::var_os("PATH")?;
    search_dirs(std::env::split_paths(&path_os), name)
}

/// PATH-style lookup over an explicit list of directories.
pub(crate) fn search_dirs(dirs: impl IntoIterator<Item = PathBuf>, name: &str) -> Option<PathBuf> {
    let file_name = executable_name(name);
    for dir in dirs {
        let candidate = dir.join(&file_name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// A copy shipped alongside our own executable (the "bundled" fallback).
fn bundled_candidate(name: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?;
    let candidate = dir.join(executable_name(name));
    candidate.is_file().then_some(candidate)
}

fn sibling(binary: &Path, name: &str) -> Option<PathBuf> {
    let candidate = binary.parent()?.join(executable_name(name));
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_labels() {
        assert_eq!(EngineSource::System.label(), "system-ffmpeg");
        assert_eq!(EngineSource::Bundled.label(), "bundled-ffmpeg");
    }

    #[test]
    fn test_search_dirs_finds_existing_file() {
        let dir = std::env::temp_dir().join("soundbed-locator-test");
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join(if cfg!(windows) { "fakebin.exe" } else { "fakebin" });
        std::fs::write(&target, b"").unwrap();

        let found = search_dirs([dir.clone()], "fakebin");
        assert_eq!(found, Some(target.clone()));

        let _ = std::fs::remove_file(&target);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn test_search_dirs_misses_absent_file() {
        let dir = std::env::temp_dir().join("soundbed-locator-empty");
        std::fs::create_dir_all(&dir).unwrap();

        assert!(search_dirs([dir.clone()], "definitely-not-here").is_none());

        let _ = std::fs::remove_dir(&dir);
    }
}
