use crate::config::APP_NAME;
use anyhow::Result;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Reasons a headers archive is treated as unavailable.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid zip archive: {0}")]
    Archive(#[from] ZipError),
    #[error("could not write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

pub fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

fn progress_bar(total_size: u64, label: &str) -> ProgressBar {
    let pb = if total_size > 0 {
        let pb = ProgressBar::new(total_size);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_message(format!("Downloading {}", label));
    pb
}

/// GET `url` and return the whole body. Any non-2xx status is an error.
pub async fn download_archive(
    client: &reqwest::Client,
    url: &str,
    label: &str,
) -> Result<Vec<u8>, FetchError> {
    tracing::debug!("Fetching {}", url);

    let transport = |source: reqwest::Error| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = progress_bar(total_size, label);

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                pb.abandon();
                return Err(transport(e));
            }
        };
        body.extend_from_slice(&chunk);
        pb.set_position(body.len() as u64);
    }

    pb.finish_and_clear();
    tracing::debug!("Downloaded {} bytes from {}", body.len(), url);
    Ok(body)
}

/// Unpack a zip held in memory under `extract_dir`, keeping the archive's
/// directory structure. Existing files are overwritten. Returns the number of
/// files written.
pub fn extract_zip(bytes: Vec<u8>, extract_dir: &Path) -> Result<usize, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let outpath = match file.enclosed_name() {
            Some(relative) => extract_dir.join(relative),
            None => {
                tracing::warn!("Skipping unsafe path in zip: {}", file.name());
                continue;
            }
        };

        if file.is_dir() {
            create_dir(&outpath)?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            create_dir(parent)?;
        }
        let write_error = |source: io::Error| ExtractError::Io {
            path: outpath.clone(),
            source,
        };
        let mut outfile = fs::File::create(&outpath).map_err(write_error)?;

        // Read errors mean a corrupt archive, write errors are fatal
        let mut buf = [0u8; COPY_BUFFER_SIZE];
        loop {
            let n = file.read(&mut buf).map_err(ZipError::from)?;
            if n == 0 {
                break;
            }
            outfile.write_all(&buf[..n]).map_err(write_error)?;
        }
        written += 1;
    }

    Ok(written)
}

fn create_dir(path: &Path) -> Result<(), ExtractError> {
    fs::create_dir_all(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })
}
