use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::NaiveDate;
use tune_core::ImageProvider;

/// Published frames live in `{base}/img`, candidates waiting for curation in `{base}/tmp`.
pub struct FsImageProvider {
    base_path: PathBuf,
}

impl FsImageProvider {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn published_path(&self, category: &str, date: NaiveDate, index: u32) -> PathBuf {
        frame_path(&self.base_path.join("img"), category, date, index)
    }

    pub fn candidate_path(&self, category: &str, date: NaiveDate, index: u32) -> PathBuf {
        frame_path(&self.base_path.join("tmp"), category, date, index)
    }
}

pub fn frame_file_name(category: &str, date: NaiveDate, index: u32) -> String {
    format!("{}-{}-{}.png", category, date.format("%Y-%m-%d"), index)
}

pub(crate) fn frame_path(dir: &Path, category: &str, date: NaiveDate, index: u32) -> PathBuf {
    dir.join(frame_file_name(category, date, index))
}

async fn read_encoded(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read frame {}", path.display()))?;
    Ok(STANDARD.encode(bytes))
}

#[async_trait]
impl ImageProvider for FsImageProvider {
    async fn encoded_frame(&self, category: &str, date: NaiveDate, index: u32) -> Result<String> {
        read_encoded(&self.published_path(category, date, index)).await
    }

    async fn candidate_frames(
        &self,
        category: &str,
        date: NaiveDate,
        count: u32,
    ) -> Result<BTreeMap<u32, String>> {
        let mut frames = BTreeMap::new();
        for index in 0..count {
            let path = self.candidate_path(category, date, index);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tracing::debug!("Candidate frame {} missing, skipping", path.display());
                continue;
            }
            frames.insert(index, read_encoded(&path).await?);
        }
        Ok(frames)
    }
}
