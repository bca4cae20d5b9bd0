//! Resolves CLI path arguments into a flat list of thalo/markdown files.
//! File-collection and ignore-file handling proper are named in
//! out-of-scope external collaborators; this is the minimal walk needed to
//! drive the core end to end from a command line.

use std::path::{Path, PathBuf};

use thalo_fenced::FileType;

pub struct DiscoveredFile {
    pub path: PathBuf,
    pub file_type: FileType,
}

fn file_type_of(path: &Path) -> Option<FileType> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("thalo") => Some(FileType::Thalo),
        Some("md") | Some("markdown") => Some(FileType::Markdown),
        _ => None,
    }
}

/// Expands `paths` (defaulting to `.` when empty) into every `.thalo`/`.md`
/// file reachable, recursing into directories and skipping anything
/// hidden (dotfiles/dot-directories other than `.` itself).
pub fn discover(paths: &[PathBuf]) -> Vec<DiscoveredFile> {
    let roots: Vec<PathBuf> = if paths.is_empty() { vec![PathBuf::from(".")] } else { paths.to_vec() };
    let mut out = Vec::new();
    for root in roots {
        if root.is_file() {
            if let Some(file_type) = file_type_of(&root) {
                out.push(DiscoveredFile { path: root, file_type });
            }
            continue;
        }
        let walker = walkdir::WalkDir::new(&root).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
        });
        for entry in walker.filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(file_type) = file_type_of(entry.path()) {
                out.push(DiscoveredFile { path: entry.path().to_path_buf(), file_type });
            }
        }
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn recurses_into_directories_and_skips_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.thalo"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();
        std::fs::write(dir.path().join("ignore.txt"), "").unwrap();
        let hidden = dir.path().join(".git");
        std::fs::create_dir_all(&hidden).unwrap();
        std::fs::write(hidden.join("x.thalo"), "").unwrap();

        let found = discover(&[dir.path().to_path_buf()]);
        let names: Vec<_> = found.iter().map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string()).collect();
        assert!(names.contains(&"a.thalo".to_string()));
        assert!(names.contains(&"notes.md".to_string()));
        assert!(!names.contains(&"ignore.txt".to_string()));
        assert!(!names.contains(&"x.thalo".to_string()));
    }

    #[test]
    fn a_single_file_path_is_included_directly() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("one.thalo");
        std::fs::write(&file, "").unwrap();
        let found = discover(&[file.clone()]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, file);
    }
}
