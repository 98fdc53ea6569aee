//! Remote narration fetch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{WorkerError, WorkerResult};

/// Default timeout for the whole download.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Download `url` to `dest`, replacing any existing file. Returns bytes written.
///
/// The body is streamed into `<dest>.part` and renamed on success, so a failed
/// download never leaves a truncated file at `dest`.
pub async fn download_audio(client: &reqwest::Client, url: &str, dest: &Path) -> WorkerResult<u64> {
    info!(url = %url, dest = %dest.display(), "Downloading narration audio");

    let response = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|e| WorkerError::download(format!("{}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(WorkerError::download(format!(
            "HTTP {}: {}",
            response.status(),
            url
        )));
    }

    vshorts_media::fs_utils::ensure_parent_dir(dest).await?;
    let part = part_path(dest);
    let mut file = tokio::fs::File::create(&part).await?;
    let mut written: u64 = 0;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                drop(file);
                let _ = tokio::fs::remove_file(&part).await;
                return Err(WorkerError::download(format!("{}: {}", url, e)));
            }
        };
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    if written == 0 {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(WorkerError::download(format!("empty response body: {}", url)));
    }

    tokio::fs::rename(&part, dest).await?;
    debug!(bytes = written, "Narration audio downloaded");
    Ok(written)
}

/// Staging path next to `dest`: `new_love.mp3` becomes `new_love.mp3.part`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
