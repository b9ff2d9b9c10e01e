//! External command-line tool invocation (ffmpeg, ffprobe).

use mediaconv_core::ConvertError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Validate that a path doesn't contain shell metacharacters or newlines
pub fn validate_path(path: &Path) -> Result<(), ConvertError> {
    let dangerous_chars = [';', '|', '&', '$', '`', '<', '>', '\n', '\r'];
    let path_str = path.to_string_lossy();
    if path_str.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(ConvertError::tool(
            "path",
            format!("Path contains dangerous characters: {}", path_str),
        ));
    }
    Ok(())
}

/// Run `program` to completion and return its stdout.
///
/// The child is killed if the returned future is dropped, so a timeout around
/// this call also stops the process.
pub async fn run(program: &str, args: Vec<OsString>) -> Result<Vec<u8>, ConvertError> {
    let output = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            ConvertError::tool(program, format!("Failed to execute: {}", e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::tool(program, last_lines(&stderr, 5)));
    }

    Ok(output.stdout)
}

/// Whether `program` can be started at all.
pub async fn is_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// ffmpeg prints its banner first; the useful part of stderr is at the end.
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path(Path::new("/tmp/1_abc.mp4")).is_ok());
        assert!(validate_path(Path::new("/tmp/a;rm -rf.mp4")).is_err());
        assert!(validate_path(Path::new("/tmp/$(whoami).mp4")).is_err());
    }

    #[test]
    fn test_last_lines() {
        let stderr = "banner\nconfig\n\nline a\nline b\n";
        assert_eq!(last_lines(stderr, 2), "line a\nline b");
        assert_eq!(last_lines("", 3), "");
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let missing = "definitely-not-a-real-tool-xyz";
        let err = run(missing, vec![]).await.unwrap_err();
        assert!(matches!(err, ConvertError::Tool { ref tool, .. } if tool == missing));
    }

    #[tokio::test]
    async fn test_is_available_missing_program() {
        assert!(!is_available("definitely-not-a-real-tool-xyz").await);
    }
}
