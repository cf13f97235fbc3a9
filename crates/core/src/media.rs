use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;

/// Locally-owned playable copy of the fetched media bytes, backed by a named
/// temporary file. The store holds the only handle; dropping it deletes the
/// file, which is the single release point. The path must not be read after
/// the handle is gone.
pub struct MediaHandle {
    file: NamedTempFile,
}

impl MediaHandle {
    /// Materialize raw media bytes into a temporary file. `suffix` keeps the
    /// original container extension so players can sniff the format.
    pub async fn from_bytes(bytes: &[u8], suffix: &str) -> Result<Self> {
        let suffixed = format!(".{}", suffix.trim_start_matches('.'));
        let mut builder = tempfile::Builder::new();
        builder.prefix("reelmark-media-");
        if suffixed.len() > 1 {
            builder.suffix(&suffixed);
        }
        let file = builder.tempfile()?;
        tokio::fs::write(file.path(), bytes).await?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl std::fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaHandle")
            .field("path", &self.file.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::MediaHandle;

    #[tokio::test]
    async fn drop_releases_the_backing_file() {
        let handle = MediaHandle::from_bytes(b"mp4-bytes", "mp4")
            .await
            .expect("tempfile");
        let path = handle.path().to_path_buf();
        assert!(path.exists());
        assert!(path.extension().is_some_and(|ext| ext == "mp4"));
        drop(handle);
        assert!(!path.exists());
    }
}
