//! Serves the tile archive with single-range byte reads. Tile clients issue
//! many short reads; every request opens the file, reads its slice and
//! closes it again, leaving no state behind.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use slog_scope::error;
use warp::http::header::{ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use warp::http::{Response, StatusCode};
use warp::hyper::Body;
use warp::{Filter, Rejection, Reply};

use crate::error::json_error;
use crate::routes::with_context;
use crate::Context;

lazy_static! {
    static ref RANGE_RE: Regex = Regex::new(r"bytes=(\d+)-(\d*)").unwrap();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Parse a `bytes=<start>-<end?>` header against a file of `size` bytes. An
/// omitted end means end-of-file; an end past the file is clamped. Anything
/// unparsable (or unsatisfiable) yields `None`, which callers treat as "no
/// range requested".
pub fn parse_range(header: &str, size: u64) -> Option<ByteRange> {
    if size == 0 {
        return None;
    }
    let caps = RANGE_RE.captures(header)?;
    let start: u64 = caps[1].parse().ok()?;
    let end = match caps.get(2).map(|m| m.as_str()) {
        Some("") | None => size - 1,
        Some(s) => s.parse::<u64>().ok()?.min(size - 1),
    };
    if start > end {
        return None;
    }
    Some(ByteRange { start, end })
}

fn read_slice(path: &Path, range: ByteRange) -> std::io::Result<Vec<u8>> {
    let mut file = fs::File::open(path)?;
    file.seek(SeekFrom::Start(range.start))?;
    let mut buf = vec![0u8; range.len() as usize];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn route(ctx: Context) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::get()
        .and(warp::path!("api" / "pmtiles"))
        .and(warp::header::optional::<String>("range"))
        .and(with_context(ctx))
        .and_then(handler)
}

async fn handler(range: Option<String>, ctx: Context) -> Result<Response<Body>, Rejection> {
    let path = ctx.archive_path();
    let cache = format!("public, max-age={}", ctx.settings.archive_cache_secs);
    let response = tokio::task::spawn_blocking(move || serve(&path, range.as_deref(), &cache))
        .await
        .unwrap_or_else(|e| {
            error!("archive task panicked: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serve PMTiles")
        });
    Ok(response)
}

fn serve(path: &Path, range: Option<&str>, cache: &str) -> Response<Body> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => {
            return json_error(
                StatusCode::NOT_FOUND,
                "PMTiles file not found. Run the data pipeline and ensure the \
                 processed data directory contains it.",
            );
        }
    };

    let parsed = range.and_then(|header| parse_range(header, size));
    if let Some(slice) = parsed {
        return match read_slice(path, slice) {
            Ok(bytes) => partial_content(bytes, slice, size, cache),
            Err(e) => {
                error!("failed to read archive slice {:?}: {}", slice, e);
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serve PMTiles")
            }
        };
    }

    // No range header, or one that did not parse: the whole file.
    match fs::read(path) {
        Ok(bytes) => full_content(bytes, cache),
        Err(e) => {
            error!("failed to read archive {:?}: {}", path, e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serve PMTiles")
        }
    }
}

fn partial_content(bytes: Vec<u8>, range: ByteRange, size: u64, cache: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(
            CONTENT_RANGE,
            format!("bytes {}-{}/{}", range.start, range.end, size),
        )
        .header(ACCEPT_RANGES, "bytes")
        .header(CONTENT_LENGTH, range.len())
        .header(CACHE_CONTROL, cache)
        .body(Body::from(bytes))
        .expect("static partial response")
}

fn full_content(bytes: Vec<u8>, cache: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/octet-stream")
        .header(ACCEPT_RANGES, "bytes")
        .header(CONTENT_LENGTH, bytes.len())
        .header(CACHE_CONTROL, cache)
        .body(Body::from(bytes))
        .expect("static full response")
}
