use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};
use tune_core::{Acquisition, VideoAcquirer};
use tune_types::Video;

use crate::images::frame_path;

const TIDAL_NAME_SEPARATOR: &str = "|||";
const TIDAL_FIELD_SEPARATOR: &str = "||";
const TIDAL_LOGIN_MESSAGE: &str =
    "Tidal is not logged in. Run 'tidal-dl-ng login' on the server and retry.";
const MAX_VIDEO_SECONDS: u32 = 30 * 60;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Unsupported video url '{0}'")]
    UnsupportedUrl(String),
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("No video was downloaded into {0}")]
    NoVideo(PathBuf),
    #[error("Could not read the video duration from '{0}'")]
    BadDuration(String),
    #[error("Could not read performer and title from '{0}'")]
    MissingMetadata(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    YouTube,
    Tidal,
}

impl Provider {
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.to_lowercase();
        if url.contains("youtube.com") || url.contains("youtu.be") {
            Some(Provider::YouTube)
        } else if url.contains("tidal.com") {
            Some(Provider::Tidal)
        } else {
            None
        }
    }
}

/// Downloads videos with `yt-dlp` or `tidal-dl-ng` and cuts frames with `ffprobe`/`ffmpeg`.
///
/// Layout under the base path:
/// - `vid/tmp/{category}/{date}/` a downloaded video waiting for curation
/// - `tmp/` candidate frames
/// - `img/` published frames
/// - `vid/{category}/{date}.mp4` archived videos
pub struct ToolchainAcquirer {
    base_path: PathBuf,
    login_timeout: Duration,
}

impl ToolchainAcquirer {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            login_timeout: Duration::from_secs(5),
        }
    }

    fn download_dir(&self, category: &str, date: NaiveDate) -> PathBuf {
        self.base_path
            .join("vid")
            .join("tmp")
            .join(category)
            .join(date.format("%Y-%m-%d").to_string())
    }

    fn candidate_dir(&self) -> PathBuf {
        self.base_path.join("tmp")
    }

    fn gallery_dir(&self) -> PathBuf {
        self.base_path.join("img")
    }

    pub fn video_path(&self, category: &str, date: NaiveDate) -> PathBuf {
        self.base_path
            .join("vid")
            .join(category)
            .join(format!("{}.mp4", date.format("%Y-%m-%d")))
    }

    async fn download_youtube(
        &self,
        url: &str,
        dir: &Path,
        date: NaiveDate,
    ) -> Result<(String, String)> {
        let template = dir.join(format!("{}.%(ext)s", date.format("%Y-%m-%d")));
        let template = template.to_string_lossy().into_owned();
        let filter = format!("duration <= {}", MAX_VIDEO_SECONDS);
        let stdout = run_tool(
            "yt-dlp",
            [
                "--no-simulate",
                "--print",
                "%(channel)s",
                "--print",
                "%(title)s",
                "--match-filter",
                filter.as_str(),
                "-f",
                "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]",
                "--merge-output-format",
                "mp4",
                "-o",
                template.as_str(),
                url,
            ],
        )
        .await?;

        parse_printed_metadata(&stdout)
            .ok_or_else(|| MediaError::MissingMetadata(stdout.trim().to_string()).into())
    }

    /// `None` when the Tidal client is waiting for an interactive login.
    async fn download_tidal(
        &self,
        url: &str,
        dir: &Path,
        date: NaiveDate,
    ) -> Result<Option<(String, String)>> {
        let dir_arg = dir.to_string_lossy().into_owned();
        run_tool("tidal-dl-ng", ["cfg", "download_base_path", dir_arg.as_str()]).await?;
        let format = format!(
            "{}{}{{artist_name}}{}{{track_title}}",
            date.format("%Y-%m-%d"),
            TIDAL_NAME_SEPARATOR,
            TIDAL_FIELD_SEPARATOR
        );
        run_tool("tidal-dl-ng", ["cfg", "format_video", format.as_str()]).await?;

        if !self.tidal_logged_in().await? {
            return Ok(None);
        }

        run_tool("tidal-dl-ng", ["dl", url]).await?;
        let video = find_video(dir)
            .await?
            .ok_or_else(|| MediaError::NoVideo(dir.to_path_buf()))?;
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        parse_tidal_file_name(&stem)
            .map(Some)
            .ok_or_else(|| MediaError::MissingMetadata(stem).into())
    }

    /// A logged-in client answers `login` right away; otherwise it blocks on a prompt.
    async fn tidal_logged_in(&self) -> Result<bool> {
        let login_check = Command::new("tidal-dl-ng")
            .arg("login")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.login_timeout, login_check).await {
            Ok(output) => {
                let output = output.context("Failed to start tidal-dl-ng")?;
                Ok(output.status.success())
            }
            Err(_) => {
                warn!("tidal-dl-ng login did not finish within {:?}", self.login_timeout);
                Ok(false)
            }
        }
    }

    async fn clear_candidates(&self, category: &str, date: NaiveDate) -> Result<()> {
        let prefix = format!("{}-{}-", category, date.format("%Y-%m-%d"));
        let dir = self.candidate_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e).with_context(|| format!("Failed to list {}", dir.display())),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }

    async fn extract_frames(
        &self,
        video: &Path,
        category: &str,
        date: NaiveDate,
        frame_count: u32,
    ) -> Result<u32> {
        let duration = video_duration(video).await?;
        let dir = self.candidate_dir();
        tokio::fs::create_dir_all(&dir).await?;
        self.clear_candidates(category, date).await?;

        let video_arg = video.to_string_lossy().into_owned();
        let mut extracted = 0;
        for (index, position) in frame_positions(duration, frame_count).into_iter().enumerate() {
            let target = frame_path(&dir, category, date, index as u32);
            let target = target.to_string_lossy().into_owned();
            let position = format!("{:.3}", position);
            run_tool(
                "ffmpeg",
                [
                    "-y",
                    "-loglevel",
                    "error",
                    "-ss",
                    position.as_str(),
                    "-i",
                    video_arg.as_str(),
                    "-frames:v",
                    "1",
                    target.as_str(),
                ],
            )
            .await?;
            extracted += 1;
        }
        Ok(extracted)
    }
}

#[async_trait]
impl VideoAcquirer for ToolchainAcquirer {
    async fn fetch_and_extract_frames(
        &self,
        url: &str,
        date: NaiveDate,
        category: &str,
        frame_count: u32,
    ) -> Result<Acquisition> {
        let provider =
            Provider::from_url(url).ok_or_else(|| MediaError::UnsupportedUrl(url.to_string()))?;

        let dir = self.download_dir(category, date);
        reset_dir(&dir).await?;

        let (performer, title) = match provider {
            Provider::YouTube => self.download_youtube(url, &dir, date).await?,
            Provider::Tidal => match self.download_tidal(url, &dir, date).await? {
                Some(metadata) => metadata,
                None => {
                    return Ok(Acquisition::NeedsAuthorization(
                        TIDAL_LOGIN_MESSAGE.to_string(),
                    ));
                }
            },
        };

        let video = find_video(&dir)
            .await?
            .ok_or_else(|| MediaError::NoVideo(dir.clone()))?;
        let extracted = self
            .extract_frames(&video, category, date, frame_count)
            .await?;
        info!("Extracted {} frames from {}", extracted, video.display());

        Ok(Acquisition::Fetched(Video {
            url: url.to_string(),
            image_ids: Vec::new(),
            performer,
            title,
            date,
            error: None,
        }))
    }

    async fn promote_frames_and_video(
        &self,
        category: &str,
        date: NaiveDate,
        selected: &[u32],
    ) -> Result<Option<String>> {
        let candidates = self.candidate_dir();
        let gallery = self.gallery_dir();
        tokio::fs::create_dir_all(&gallery).await?;

        for (target, &source) in selected.iter().enumerate() {
            let from = frame_path(&candidates, category, date, source);
            let to = frame_path(&gallery, category, date, target as u32);
            tokio::fs::copy(&from, &to).await.with_context(|| {
                format!("Failed to copy {} to {}", from.display(), to.display())
            })?;
        }
        self.clear_candidates(category, date).await?;

        let download_dir = self.download_dir(category, date);
        let Some(video) = find_video(&download_dir).await? else {
            debug!("No downloaded video to archive for {} in '{}'", date, category);
            return Ok(None);
        };
        let target = self.video_path(category, date);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&video, &target).await.with_context(|| {
            format!("Failed to move {} to {}", video.display(), target.display())
        })?;
        if let Err(e) = tokio::fs::remove_dir_all(&download_dir).await {
            warn!("Could not clean {}: {}", download_dir.display(), e);
        }

        Ok(Some(target.to_string_lossy().into_owned()))
    }
}

async fn run_tool<I, S>(program: &str, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    debug!("Running {}", program);
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to start {}", program))?;

    if !output.status.success() {
        return Err(MediaError::ToolFailed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn reset_dir(dir: &Path) -> Result<()> {
    if tokio::fs::try_exists(dir).await? {
        tokio::fs::remove_dir_all(dir).await?;
    }
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))
}

/// First `.mp4` in `dir` by name, `None` if there is none or the directory is missing.
async fn find_video(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to list {}", dir.display())),
    };

    let mut videos = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_mp4 = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"));
        if is_mp4 && entry.file_type().await?.is_file() {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos.into_iter().next())
}

async fn video_duration(video: &Path) -> Result<f64> {
    let video_arg = video.to_string_lossy().into_owned();
    let stdout = run_tool(
        "ffprobe",
        [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
            video_arg.as_str(),
        ],
    )
    .await?;
    let raw = stdout.trim();
    raw.parse::<f64>()
        .map_err(|_| MediaError::BadDuration(raw.to_string()).into())
}

/// Timestamps (seconds) of `count` frames spread evenly over the video, each in
/// the middle of its slice so neither the first nor the last frame is used.
pub fn frame_positions(duration: f64, count: u32) -> Vec<f64> {
    if count == 0 || !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }
    let step = duration / f64::from(count);
    (0..count)
        .map(|i| step * (f64::from(i) + 0.5))
        .collect()
}

/// Channel and title as printed by `yt-dlp --print`.
pub fn parse_printed_metadata(stdout: &str) -> Option<(String, String)> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    let performer = lines.next()?;
    let title = lines.next()?;
    Some((performer.to_string(), title.to_string()))
}

/// `{date}|||{artist}||{title}` as configured through `format_video`.
pub fn parse_tidal_file_name(stem: &str) -> Option<(String, String)> {
    let (_, rest) = stem.split_once(TIDAL_NAME_SEPARATOR)?;
    let (performer, title) = rest.split_once(TIDAL_FIELD_SEPARATOR)?;
    let (performer, title) = (performer.trim(), title.trim());
    if performer.is_empty() || title.is_empty() {
        return None;
    }
    Some((performer.to_string(), title.to_string()))
}
