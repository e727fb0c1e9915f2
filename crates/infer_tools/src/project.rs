//! Lookup of tool artifacts inside a job's project directory.

use std::path::{Path, PathBuf};

/// Finds a file named `file_name` in `project_dir` or any subdirectory.
///
/// The project directory itself is searched first, then subdirectories in
/// name order, so a log at the top level wins over a copy further down.
pub fn find_file_in_project(project_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let direct = project_dir.join(file_name);
    if direct.is_file() {
        return Some(direct);
    }

    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(project_dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    subdirs.sort();

    subdirs
        .iter()
        .find_map(|dir| find_file_in_project(dir, file_name))
}
