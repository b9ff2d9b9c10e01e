//! Temporary file naming.
//!
//! Every file lives directly in one shared directory. Inputs are named
//! `{user_id}_{file_id}{ext}`, outputs `{prefix}{stem}.{ext}` where `stem` is
//! the input file name up to its first dot.

use std::io;
use std::path::{Path, PathBuf};

/// Prefix marking what produced an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPrefix {
    Converted,
    Audio,
    Compressed,
}

impl OutputPrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputPrefix::Converted => "converted_",
            OutputPrefix::Audio => "audio_",
            OutputPrefix::Compressed => "compressed_",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TempPaths {
    dir: PathBuf,
}

impl TempPaths {
    /// Use `dir` as the shared temp directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Path for a downloaded upload. `ext` includes the leading dot (or is empty).
    pub fn input_path(&self, user_id: u64, file_id: &str, ext: &str) -> PathBuf {
        self.path(&format!("{}_{}{}", user_id, sanitize(file_id), ext))
    }

    /// Path for a conversion result derived from `input`.
    pub fn output_path(&self, prefix: OutputPrefix, input: &Path, ext: &str) -> PathBuf {
        self.path(&format!("{}{}.{}", prefix.as_str(), stem(input), ext))
    }
}

/// File name up to the first dot, so `1_abc.tar.gz` gives `1_abc`.
pub fn stem(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .filter(|s| !s.is_empty())
        .unwrap_or("file")
        .to_string()
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_directory() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("nested").join("temp_files");
        let paths = TempPaths::new(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(paths.dir(), dir.as_path());
    }

    #[test]
    fn test_input_path_naming() {
        let root = TempDir::new().unwrap();
        let paths = TempPaths::new(root.path()).unwrap();
        let input = paths.input_path(42, "BAADAgAD", ".mp4");
        assert_eq!(input, root.path().join("42_BAADAgAD.mp4"));
    }

    #[test]
    fn test_input_path_strips_separators() {
        let root = TempDir::new().unwrap();
        let paths = TempPaths::new(root.path()).unwrap();
        let input = paths.input_path(7, "../etc/passwd", "");
        assert_eq!(input.parent(), Some(root.path()));
        assert_eq!(input.file_name().unwrap(), "7____etc_passwd");
    }

    #[test]
    fn test_output_path_uses_prefix_and_stem() {
        let root = TempDir::new().unwrap();
        let paths = TempPaths::new(root.path()).unwrap();
        let input = root.path().join("42_abc.mp4");

        assert_eq!(
            paths.output_path(OutputPrefix::Converted, &input, "mkv"),
            root.path().join("converted_42_abc.mkv")
        );
        assert_eq!(
            paths.output_path(OutputPrefix::Audio, &input, "mp3"),
            root.path().join("audio_42_abc.mp3")
        );
        assert_eq!(
            paths.output_path(OutputPrefix::Compressed, &input, "mp4"),
            root.path().join("compressed_42_abc.mp4")
        );
    }

    #[test]
    fn test_stem_stops_at_first_dot() {
        assert_eq!(stem(Path::new("/x/1_abc.tar.gz")), "1_abc");
        assert_eq!(stem(Path::new("/x/.hidden")), "file");
    }
}
