use std::path::Path;

use serde::Deserialize;

/// Failure while reading media metadata with `ffprobe`.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("ffprobe binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    Parse(String),
}

/// The subset of `ffprobe -print_format json -show_format` we read.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Extract `format.duration` in seconds. Missing or `N/A` durations give `None`.
pub fn parse_duration(stdout: &str) -> Result<Option<f64>, ProbeError> {
    let output: FfprobeOutput =
        serde_json::from_str(stdout).map_err(|e| ProbeError::Parse(format!("{e}: {stdout}")))?;
    Ok(output
        .format
        .duration
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0))
}

/// Run `ffprobe` on a media file and return its duration in seconds.
pub async fn probe_duration(ffprobe_bin: &str, path: &Path) -> Result<Option<f64>, ProbeError> {
    let output = tokio::process::Command::new(ffprobe_bin)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(ProbeError::NotFound)?;

    if !output.status.success() {
        return Err(ProbeError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
}
