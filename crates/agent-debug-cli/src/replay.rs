use std::path::Path;

use agent_debug_stream::StreamSession;
use anyhow::Context as _;
use tokio::io::AsyncReadExt as _;

/// Reads `file` in pieces of at most `chunk_size` bytes.
fn file_chunks(
    file: tokio::fs::File,
    chunk_size: usize,
) -> impl futures::Stream<Item = std::io::Result<Vec<u8>>> + Send + 'static {
    let chunk_size = chunk_size.max(1);
    futures::stream::try_unfold(file, move |mut file| async move {
        let mut chunk = vec![0u8; chunk_size];
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        chunk.truncate(n);
        Ok(Some((chunk, file)))
    })
}

/// Opens a captured stream file as a decode session.
pub async fn open_replay(path: &Path, chunk_size: usize) -> anyhow::Result<StreamSession> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    tracing::debug!(path = %path.display(), chunk_size, "replaying captured stream");
    Ok(StreamSession::from_stream(file_chunks(file, chunk_size)))
}
