//! Role directories, `.jpg` scanning and collision-safe relocation.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which half of a pair a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Personal,
    Visa,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Personal => "personal",
            Side::Visa => "visa",
        })
    }
}

/// How files are placed into their destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relocation {
    #[default]
    Move,
    /// Leave the source in place (files end up in two role directories).
    Copy,
}

/// Absolute locations of every role directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub source: PathBuf,
    pub visa: PathBuf,
    pub personal: PathBuf,
    pub people: PathBuf,
    pub unmatched: PathBuf,
    pub unprocessable: PathBuf,
}

impl Layout {
    /// Conventional layout under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            source: root.join("passports"),
            visa: root.join("visa"),
            personal: root.join("personal"),
            people: root.join("people"),
            unmatched: root.join("unmatched"),
            unprocessable: root.join("unprocessable"),
        }
    }

    /// Where classified-but-unpaired files of `side` wait for matching.
    pub fn classified(&self, side: Side) -> &Path {
        match side {
            Side::Personal => &self.personal,
            Side::Visa => &self.visa,
        }
    }

    pub fn unmatched(&self, side: Side) -> PathBuf {
        self.unmatched.join(side.to_string())
    }

    pub fn unprocessable(&self, side: Side) -> PathBuf {
        self.unprocessable.join(side.to_string())
    }

    pub fn group(&self, id: u32) -> PathBuf {
        self.people.join(id.to_string())
    }

    /// Create every role directory that does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        let dirs = [
            self.source.clone(),
            self.visa.clone(),
            self.personal.clone(),
            self.people.clone(),
            self.unmatched(Side::Personal),
            self.unmatched(Side::Visa),
            self.unprocessable(Side::Personal),
            self.unprocessable(Side::Visa),
        ];
        for dir in dirs {
            fs::create_dir_all(&dir).map_err(PipelineError::io("create", &dir))?;
        }
        Ok(())
    }
}

/// Case-insensitive `.jpg` check.
pub fn is_jpg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg"))
}

/// Regular `.jpg` files directly inside `dir`, sorted by file name.
pub fn scan_jpgs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() && is_jpg(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `dir/filename`, or `dir/stem_N.ext` with the smallest N ≥ 1 that is free.
pub fn unique_destination(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(filename);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let ext = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u32..)
        .map(|i| dir.join(format!("{stem}_{i}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Place `src` into `dest_dir` under `filename` (renamed if taken), returning
/// the final path. Errors propagate; nothing already placed is undone.
pub fn relocate(src: &Path, dest_dir: &Path, filename: &str, mode: Relocation) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir).map_err(PipelineError::io("create", dest_dir))?;
    let dest = unique_destination(dest_dir, filename);

    match mode {
        Relocation::Move => {
            if fs::rename(src, &dest).is_err() {
                // rename cannot cross filesystems
                fs::copy(src, &dest).map_err(PipelineError::io("copy", src))?;
                fs::remove_file(src).map_err(PipelineError::io("remove", src))?;
            }
        }
        Relocation::Copy => {
            fs::copy(src, &dest).map_err(PipelineError::io("copy", src))?;
        }
    }

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_jpg_case_insensitive() {
        assert!(is_jpg(Path::new("a.jpg")));
        assert!(is_jpg(Path::new("a.JPG")));
        assert!(is_jpg(Path::new("a.Jpg")));
        assert!(!is_jpg(Path::new("a.jpeg")));
        assert!(!is_jpg(Path::new("a.png")));
        assert!(!is_jpg(Path::new("jpg")));
    }

    #[test]
    fn test_scan_jpgs_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["c.jpg", "a.JPG", "b.png", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();
        fs::write(dir.path().join("nested.jpg").join("deep.jpg"), b"x").unwrap();

        let names: Vec<String> = scan_jpgs(dir.path()).unwrap().iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["a.JPG", "c.jpg"]);
    }

    #[test]
    fn test_scan_missing_dir_fails() {
        assert!(scan_jpgs(Path::new("/nonexistent/visamatch")).is_err());
    }

    #[test]
    fn test_unique_destination_free_name() {
        let dir = tempdir().unwrap();
        assert_eq!(unique_destination(dir.path(), "foo.jpg"), dir.path().join("foo.jpg"));
    }

    #[test]
    fn test_unique_destination_appends_suffix() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("foo.jpg"), b"x").unwrap();
        assert_eq!(unique_destination(dir.path(), "foo.jpg"), dir.path().join("foo_1.jpg"));

        fs::write(dir.path().join("foo_1.jpg"), b"x").unwrap();
        fs::write(dir.path().join("foo_2.jpg"), b"x").unwrap();
        assert_eq!(unique_destination(dir.path(), "foo.jpg"), dir.path().join("foo_3.jpg"));
    }

    #[test]
    fn test_unique_destination_without_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("scan"), b"x").unwrap();
        assert_eq!(unique_destination(dir.path(), "scan"), dir.path().join("scan_1"));
    }

    #[test]
    fn test_relocate_move_never_overwrites() {
        let dir = tempdir().unwrap();
        let dest_dir = dir.path().join("unmatched").join("personal");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(dest_dir.join("foo.jpg"), b"old").unwrap();

        let src = dir.path().join("foo.jpg");
        fs::write(&src, b"new").unwrap();

        let placed = relocate(&src, &dest_dir, "foo.jpg", Relocation::Move).unwrap();
        assert_eq!(placed, dest_dir.join("foo_1.jpg"));
        assert!(!src.exists());
        assert_eq!(fs::read(dest_dir.join("foo.jpg")).unwrap(), b"old");
        assert_eq!(fs::read(&placed).unwrap(), b"new");
    }

    #[test]
    fn test_relocate_copy_keeps_source() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("v.jpg");
        fs::write(&src, b"data").unwrap();

        let placed = relocate(&src, &dir.path().join("people").join("1"), "v.jpg", Relocation::Copy).unwrap();
        assert!(src.exists());
        assert_eq!(fs::read(placed).unwrap(), b"data");
    }

    #[test]
    fn test_relocate_missing_source_propagates() {
        let dir = tempdir().unwrap();
        let err = relocate(&dir.path().join("gone.jpg"), dir.path(), "gone_copy.jpg", Relocation::Move);
        assert!(matches!(err, Err(PipelineError::Io { .. })));
    }

    #[test]
    fn test_ensure_creates_all_roles() {
        let dir = tempdir().unwrap();
        let layout = Layout::under(dir.path());
        layout.ensure().unwrap();
        for d in [
            dir.path().join("passports"),
            dir.path().join("visa"),
            dir.path().join("personal"),
            dir.path().join("people"),
            dir.path().join("unmatched/personal"),
            dir.path().join("unmatched/visa"),
            dir.path().join("unprocessable/personal"),
            dir.path().join("unprocessable/visa"),
        ] {
            assert!(d.is_dir(), "{} missing", d.display());
        }
        // idempotent
        layout.ensure().unwrap();
    }
}
