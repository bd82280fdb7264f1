use std::io::SeekFrom;
use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use warp::http::{Response, StatusCode, header};
use warp::hyper::Body;
use warp::hyper::body::Bytes;

const CHUNK_SIZE: usize = 64 * 1024;

/// Inclusive byte range of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RangeRequest {
    Full,
    Partial(ByteRange),
    Unsatisfiable,
}

/// Reads a single `bytes=` range (`a-b`, `a-` or `-n`) against a file of `len` bytes.
/// Anything that is not a single byte range is answered with the full file.
pub fn parse_range(header: Option<&str>, len: u64) -> RangeRequest {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeRequest::Full;
    };
    if spec.contains(',') {
        return RangeRequest::Full;
    }
    let Some((start, end)) = spec.split_once('-') else {
        return RangeRequest::Full;
    };
    let (start, end) = (start.trim(), end.trim());

    let range = match (start.is_empty(), end.is_empty()) {
        (true, true) => return RangeRequest::Full,
        (true, false) => match end.parse::<u64>() {
            Ok(0) => return RangeRequest::Unsatisfiable,
            Ok(suffix) => ByteRange {
                start: len.saturating_sub(suffix),
                end: len.saturating_sub(1),
            },
            Err(_) => return RangeRequest::Full,
        },
        (false, _) => {
            let Ok(first) = start.parse::<u64>() else {
                return RangeRequest::Full;
            };
            let last = if end.is_empty() {
                len.saturating_sub(1)
            } else {
                match end.parse::<u64>() {
                    Ok(last) => last.min(len.saturating_sub(1)),
                    Err(_) => return RangeRequest::Full,
                }
            };
            ByteRange {
                start: first,
                end: last,
            }
        }
    };

    if len == 0 || range.start >= len || range.start > range.end {
        RangeRequest::Unsatisfiable
    } else {
        RangeRequest::Partial(range)
    }
}

/// An mp4 reply for `path`, honouring a `Range` header. The body is streamed in chunks.
pub async fn video_response(path: &Path, range_header: Option<&str>) -> Result<Response<Body>> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open video {}", path.display()))?;
    let len = file.metadata().await?.len();

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(header::ACCEPT_RANGES, "bytes");

    let (builder, range) = match parse_range(range_header, len) {
        RangeRequest::Unsatisfiable => {
            let response = builder
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", len))
                .body(Body::empty())?;
            return Ok(response);
        }
        RangeRequest::Full => (builder.status(StatusCode::OK), None),
        RangeRequest::Partial(range) => (
            builder.status(StatusCode::PARTIAL_CONTENT).header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", range.start, range.end, len),
            ),
            Some(range),
        ),
    };

    let (start, length) = match range {
        Some(range) => (range.start, range.len()),
        None => (0, len),
    };
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }

    let (mut sender, body) = Body::channel();
    let path = path.to_path_buf();
    tokio::spawn(async move {
        let mut remaining = length;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        while remaining > 0 {
            let want = remaining.min(CHUNK_SIZE as u64) as usize;
            match file.read(&mut buffer[..want]).await {
                Ok(0) => break,
                Ok(read) => {
                    if sender
                        .send_data(Bytes::copy_from_slice(&buffer[..read]))
                        .await
                        .is_err()
                    {
                        // Client went away
                        break;
                    }
                    remaining -= read as u64;
                }
                Err(e) => {
                    tracing::warn!("Reading {} failed: {}", path.display(), e);
                    sender.abort();
                    break;
                }
            }
        }
    });

    Ok(builder
        .header(header::CONTENT_LENGTH, length)
        .body(body)?)
}
