//! The closed set of downloadable sample videos.

use std::path::{Path, PathBuf};

/// One of the remote sample videos the tool can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SampleVideo {
    London,
    NewYork,
}

impl SampleVideo {
    pub const ALL: [SampleVideo; 2] = [SampleVideo::London, SampleVideo::NewYork];

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleVideo::London => "london",
            SampleVideo::NewYork => "new-york",
        }
    }

    /// Remote source locator.
    pub fn url(&self) -> &'static str {
        match self {
            SampleVideo::London => {
                "https://videos.pexels.com/video-files/13986779/13986779-uhd_2160_3840_60fps.mp4"
            }
            SampleVideo::NewYork => {
                "https://videos.pexels.com/video-files/5796436/5796436-uhd_3840_2160_30fps.mp4"
            }
        }
    }

    /// Approximate payload size, used for the progress denominator when the
    /// server sends no content length.
    pub fn size_mb(&self) -> u64 {
        match self {
            SampleVideo::London => 97,
            SampleVideo::NewYork => 193,
        }
    }

    /// Cache filename, derived from the remote locator's last path component.
    pub fn file_name(&self) -> &'static str {
        self.url()
            .rsplit('/')
            .next()
            .expect("sample video URLs always have a path")
    }

    /// Deterministic cache path under the download cache directory.
    pub fn cache_path(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(self.file_name())
    }
}

impl std::fmt::Display for SampleVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_come_from_the_url() {
        assert_eq!(
            SampleVideo::London.file_name(),
            "13986779-uhd_2160_3840_60fps.mp4"
        );
        assert_eq!(
            SampleVideo::NewYork.file_name(),
            "5796436-uhd_3840_2160_30fps.mp4"
        );
    }

    #[test]
    fn cache_paths_are_deterministic() {
        let dir = Path::new("/cache");
        assert_eq!(
            SampleVideo::London.cache_path(dir),
            Path::new("/cache/13986779-uhd_2160_3840_60fps.mp4")
        );
    }

    #[test]
    fn kinds_have_distinct_cache_files() {
        assert_ne!(
            SampleVideo::London.file_name(),
            SampleVideo::NewYork.file_name()
        );
    }
}
