use crate::error::Result;
use crate::layout;
use std::path::{Path, PathBuf};
use visamatch_core::{FaceEmbed, ImageRecord};

/// An image whose embedding could not be extracted.
#[derive(Debug, Clone)]
pub struct Unprocessable {
    pub filename: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Result of scanning one directory.
#[derive(Debug, Default)]
pub struct LoadedSet {
    pub records: Vec<ImageRecord>,
    pub unprocessable: Vec<Unprocessable>,
}

/// Embed every `.jpg` in `dir`. Failures are collected, not fatal.
pub fn load_records<E: FaceEmbed + ?Sized>(dir: &Path, embedder: &mut E) -> Result<LoadedSet> {
    let mut set = LoadedSet::default();

    for path in layout::scan_jpgs(dir)? {
        let filename = layout::file_name(&path);
        match embedder.embed(&path) {
            Ok(embedding) => set.records.push(ImageRecord {
                filename,
                path,
                embedding,
            }),
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "embedding failed");
                set.unprocessable.push(Unprocessable {
                    filename,
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        dir = %dir.display(),
        loaded = set.records.len(),
        failed = set.unprocessable.len(),
        "embeddings loaded"
    );
    Ok(set)
}
