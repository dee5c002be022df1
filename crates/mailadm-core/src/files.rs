//! Discovery of email message files on disk.

use std::io;
use std::path::{Path, PathBuf};

/// Extensions treated as email messages by default.
const MESSAGE_EXTENSIONS: [&str; 4] = ["eml", "msg", "txt", "mbox"];

/// Find email files under `path`.
///
/// A file path is returned as-is. A directory is searched for the default
/// message extensions plus an optional extra glob `pattern` (e.g.
/// `*.spam`), either at the top level or recursively. Results are sorted
/// and deduplicated.
pub fn find_email_files(
    path: &Path,
    recursive: bool,
    pattern: Option<&str>,
) -> io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No such file or directory: {}", path.display()),
        ));
    }

    let mut globs: Vec<String> = MESSAGE_EXTENSIONS
        .iter()
        .map(|ext| format!("*.{}", ext))
        .collect();
    if let Some(extra) = pattern {
        if extra != "*" && !globs.iter().any(|g| g == extra) {
            globs.push(extra.to_string());
        }
    }

    let mut files = Vec::new();
    for g in &globs {
        let full = if recursive {
            format!("{}/**/{}", path.display(), g)
        } else {
            format!("{}/{}", path.display(), g)
        };
        let paths = glob::glob(&full)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        for entry in paths.flatten() {
            if entry.is_file() {
                files.push(entry);
            }
        }
    }

    files.sort();
    files.dedup();
    log::debug!(
        "[files] {} message file(s) under {}",
        files.len(),
        path.display()
    );
    Ok(files)
}

/// Whether a path carries the mbox extension (its messages need to be
/// split out before training).
pub fn is_mbox(path: &Path) -> bool {
    path.extension().map(|e| e == "mbox").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_single_file_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("one.eml");
        fs::write(&file, "Subject: hi\n\nbody\n").unwrap();
        let found = find_email_files(&file, false, None).unwrap();
        assert_eq!(found, vec![file]);
    }

    #[test]
    fn test_directory_scan() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.eml"), "x").unwrap();
        fs::write(dir.path().join("b.msg"), "x").unwrap();
        fs::write(dir.path().join("c.png"), "x").unwrap();
        let found = find_email_files(dir.path(), false, None).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.eml", "b.msg"]);
    }

    #[test]
    fn test_recursive_scan() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("nested");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("deep.eml"), "x").unwrap();
        fs::write(dir.path().join("top.eml"), "x").unwrap();

        let flat = find_email_files(dir.path(), false, None).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = find_email_files(dir.path(), true, None).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_custom_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x.spam"), "x").unwrap();
        let without = find_email_files(dir.path(), false, None).unwrap();
        assert!(without.is_empty());
        let with = find_email_files(dir.path(), false, Some("*.spam")).unwrap();
        assert_eq!(with.len(), 1);
    }

    #[test]
    fn test_no_duplicates_from_overlapping_pattern() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.eml"), "x").unwrap();
        let found = find_email_files(dir.path(), false, Some("*.eml")).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        assert!(find_email_files(Path::new("/no/such/dir"), false, None).is_err());
    }

    #[test]
    fn test_is_mbox() {
        assert!(is_mbox(Path::new("archive.mbox")));
        assert!(!is_mbox(Path::new("message.eml")));
    }
}
