use crate::errors::{AssemblyFailure, Result};
use crate::store::objects::{list_under_prefix, ObjectStore};
use std::io::{Cursor, Write};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// A ZIP container being assembled in memory.
pub struct Archive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    files: usize,
}

impl Archive {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            files: 0,
        }
    }

    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        self.writer
            .start_file(name, options)
            .map_err(|e| AssemblyFailure(format!("failed to create file {name} in zip: {e}")))?;

        self.writer.write_all(data).map_err(|e| {
            AssemblyFailure(format!("failed to copy object content of {name} to zip: {e}"))
        })?;

        self.files += 1;
        Ok(())
    }

    /// Writes the central directory. Until this succeeds the buffer is not a valid
    /// archive.
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| AssemblyFailure(format!("failed to close zip writer: {e}")))?;
        Ok(cursor.into_inner())
    }

    pub fn len(&self) -> usize {
        self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files == 0
    }
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

/// Zips every file under `prefix` in `bucket`, one entry per object, named with the
/// prefix stripped. Stops at the first failed fetch or write.
pub async fn build_zip(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    max_keys: i32,
) -> Result<Vec<u8>> {
    let names = list_under_prefix(store, bucket, prefix, max_keys).await?;

    let mut archive = Archive::new();
    for name in &names {
        let data = store.get_object(bucket, &format!("{prefix}{name}")).await?;
        archive.add_file(name, &data)?;
    }

    if archive.is_empty() {
        tracing::warn!(bucket, prefix, "Nothing to archive, serving an empty zip");
    }
    tracing::debug!(bucket, prefix, files = archive.len(), "Assembled archive");

    archive.finish()
}
