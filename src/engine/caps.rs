use std::collections::HashSet;
use std::path::Path;
use std::process::Command;

/// The set of audio/video filters the resolved ffmpeg build advertises.
/// Probed once per process from `ffmpeg -filters`; a failed probe yields an
/// empty set so every capability check simply answers "unsupported".
#[derive(Debug, Clone, Default)]
pub struct FilterCaps {
    names: HashSet<String>,
}

impl FilterCaps {
    pub fn probe(ffmpeg: &Path) -> FilterCaps {
        let output = Command::new(ffmpeg)
            .arg("-hide_banner")
            .arg("-filters")
            .output();

        match output {
            Ok(out) if out.status.success() => {
                let listing = String::from_utf8_lossy(&out.stdout);
                let caps = Self::parse(&listing);
                log::info!("ffmpeg advertises {} filters", caps.names.len());
                caps
            }
            Ok(out) => {
                log::warn!(
                    "ffmpeg -filters exited with {}; assuming no filter support",
                    out.status
                );
                FilterCaps::default()
            }
            Err(e) => {
                log::warn!("Could not run ffmpeg -filters: {}; assuming no filter support", e);
                FilterCaps::default()
            }
        }
    }

    /// Listing lines look like ` ..C volume  A->A  Change input volume.`;
    /// the third column always contains the `->` io spec, which separates
    /// real entries from the legend above them.
    pub fn parse(listing: &str) -> FilterCaps {
        let mut names = HashSet::new();
        for line in listing.lines() {
            let mut tokens = line.split_whitespace();
            let (Some(_flags), Some(name), Some(io)) = (tokens.next(), tokens.next(), tokens.next())
            else {
                continue;
            };
            if io.contains("->") {
                names.insert(name.to_string());
            }
        }
        FilterCaps { names }
    }

    pub fn from_names<I, S>(names: I) -> FilterCaps
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterCaps {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn supports(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}
