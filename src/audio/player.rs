use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Plays the selected music file through the default output device so the
/// user can audition it before merging. One track at a time; toggling the
/// same file stops it, picking a new one replaces it.
pub struct MusicPreview {
    // The stream must stay alive for as long as the sink plays.
    _stream: Option<OutputStream>,
    sink: Option<Sink>,
    current: Option<PathBuf>,
}

impl MusicPreview {
    pub fn new() -> Self {
        Self {
            _stream: None,
            sink: None,
            current: None,
        }
    }

    pub fn toggle(&mut self, path: &Path) -> anyhow::Result<()> {
        if self.is_playing() && self.current.as_deref() == Some(path) {
            self.stop();
            Ok(())
        } else {
            self.play(path)
        }
    }

    pub fn play(&mut self, path: &Path) -> anyhow::Result<()> {
        self.stop();

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| anyhow::anyhow!("No audio output device: {}", e))?;
        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| anyhow::anyhow!("Could not open audio sink: {}", e))?;

        let file = BufReader::new(File::open(path)
            .map_err(|e| anyhow::anyhow!("Could not open {}: {}", path.display(), e))?);
        let source = Decoder::new(file)
            .map_err(|e| anyhow::anyhow!("Could not decode {}: {}", path.display(), e))?;

        sink.append(source);
        sink.play();
        log::debug!("Previewing {}", path.display());

        self._stream = Some(stream);
        self.sink = Some(sink);
        self.current = Some(path.to_path_buf());
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self._stream = None;
        self.current = None;
    }

    pub fn is_playing(&self) -> bool {
        self.sink
            .as_ref()
            .map(|sink| !sink.empty() && !sink.is_paused())
            .unwrap_or(false)
    }
}

impl Drop for MusicPreview {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_preview_is_idle() {
        let preview = MusicPreview::new();
        assert!(!preview.is_playing());
    }

    #[test]
    fn test_play_missing_file_fails_cleanly() {
        let mut preview = MusicPreview::new();
        // Either no audio device (headless) or no such file; both must be
        // plain errors, never a panic, and leave the player idle.
        let result = preview.play(Path::new("/no/such/file.mp3"));
        assert!(result.is_err());
        assert!(!preview.is_playing());
    }

    #[test]
    fn test_stop_when_idle_is_harmless() {
        let mut preview = MusicPreview::new();
        preview.stop();
        assert!(!preview.is_playing());
    }
}
