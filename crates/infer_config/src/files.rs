//! Source file resolution from include/exclude glob patterns.

use crate::error::ConfigError;
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Match options for exclude patterns: `*` may cross `/`, like `fnmatch`.
const EXCLUDE_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Resolves include/exclude patterns to a de-duplicated list of absolute file paths.
///
/// Each include pattern is globbed relative to `base_dir`, in declaration
/// order. Only regular files are kept. A match is dropped when its absolute
/// path matches any exclude pattern; relative exclude patterns are anchored
/// at `base_dir` first. The result keeps first-seen order, so files listed by
/// an earlier pattern are compiled before files of a later one, and a file
/// matched by several patterns appears once.
///
/// An include pattern that matches nothing is not an error.
pub fn resolve_files(
    base_dir: &Path,
    include: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>, ConfigError> {
    let excludes = exclude
        .iter()
        .map(|p| anchored_pattern(base_dir, p))
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in include {
        let full = anchor(base_dir, pattern)?;
        let entries = glob::glob(&full).map_err(|e| ConfigError::PatternError {
            pattern: pattern.clone(),
            message: e.msg.to_string(),
        })?;

        let mut matched = 0usize;
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "skipping unreadable glob match");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let abs = std::fs::canonicalize(&path)?;
            if excludes
                .iter()
                .any(|ex| ex.matches_path_with(&abs, EXCLUDE_MATCH))
            {
                debug!(file = %abs.display(), "excluded by pattern");
                continue;
            }
            matched += 1;
            if seen.insert(abs.clone()) {
                files.push(abs);
            }
        }

        if matched == 0 {
            debug!(pattern = %pattern, "include pattern matched no files");
        }
    }

    Ok(files)
}

/// Compiles an exclude pattern, anchoring relative patterns at `base_dir`.
fn anchored_pattern(base_dir: &Path, pattern: &str) -> Result<Pattern, ConfigError> {
    let full = anchor(base_dir, pattern)?;
    Pattern::new(&full).map_err(|e| ConfigError::PatternError {
        pattern: pattern.to_string(),
        message: e.msg.to_string(),
    })
}

/// Prefixes a relative pattern with the escaped base directory.
fn anchor(base_dir: &Path, pattern: &str) -> Result<String, ConfigError> {
    if Path::new(pattern).is_absolute() {
        return Ok(pattern.to_string());
    }
    let base = base_dir.to_str().ok_or_else(|| ConfigError::PatternError {
        pattern: pattern.to_string(),
        message: format!("base directory {} is not valid UTF-8", base_dir.display()),
    })?;
    let base = Pattern::escape(base.trim_end_matches('/'));
    Ok(format!("{base}/{pattern}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "-- vhdl\n").unwrap();
        fs::canonicalize(path).unwrap()
    }

    fn strings(patterns: &[&str]) -> Vec<String> {
        patterns.iter().map(|s| s.to_string()).collect()
    }

    fn base(tmp: &TempDir) -> PathBuf {
        fs::canonicalize(tmp.path()).unwrap()
    }

    #[test]
    fn exclude_wins_over_include() {
        let tmp = TempDir::new().unwrap();
        let root = base(&tmp);
        let a = touch(&root, "src/a.vhd");
        touch(&root, "src/legacy/b.vhd");

        let files =
            resolve_files(&root, &strings(&["src/**/*.vhd"]), &strings(&["src/legacy/*"]))
                .unwrap();
        assert_eq!(files, vec![a]);
    }

    #[test]
    fn overlapping_includes_are_deduplicated() {
        let tmp = TempDir::new().unwrap();
        let root = base(&tmp);
        let a = touch(&root, "src/a.vhd");
        let b = touch(&root, "src/b.vhd");

        let files = resolve_files(&root, &strings(&["src/a.vhd", "src/*.vhd"]), &[]).unwrap();
        assert_eq!(files, vec![a, b]);
    }

    #[test]
    fn declaration_order_is_kept() {
        let tmp = TempDir::new().unwrap();
        let root = base(&tmp);
        let pkg = touch(&root, "z_pkg/pkg.vhd");
        let top = touch(&root, "a_top/top.vhd");

        let files = resolve_files(&root, &strings(&["z_pkg/*.vhd", "a_top/*.vhd"]), &[]).unwrap();
        assert_eq!(files, vec![pkg, top]);
    }

    #[test]
    fn empty_match_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let root = base(&tmp);
        let files = resolve_files(&root, &strings(&["missing/**/*.vhd"]), &[]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn directories_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = base(&tmp);
        fs::create_dir_all(root.join("src/sub.vhd")).unwrap();
        let a = touch(&root, "src/a.vhd");
        let files = resolve_files(&root, &strings(&["src/*"]), &[]).unwrap();
        assert_eq!(files, vec![a]);
    }

    #[test]
    fn absolute_exclude_pattern() {
        let tmp = TempDir::new().unwrap();
        let root = base(&tmp);
        let keep = touch(&root, "src/keep.vhd");
        touch(&root, "src/drop_tb.vhd");

        let exclude = format!("{}/*_tb.vhd", root.display());
        let files = resolve_files(&root, &strings(&["src/*.vhd"]), &[exclude]).unwrap();
        assert_eq!(files, vec![keep]);
    }

    #[test]
    fn exclude_star_crosses_directories() {
        let tmp = TempDir::new().unwrap();
        let root = base(&tmp);
        let keep = touch(&root, "src/core/fifo.vhd");
        touch(&root, "src/core/sim/fifo_tb.vhd");

        let files =
            resolve_files(&root, &strings(&["src/**/*.vhd"]), &strings(&["*_tb.vhd"])).unwrap();
        assert_eq!(files, vec![keep]);
    }

    #[test]
    fn invalid_include_pattern() {
        let tmp = TempDir::new().unwrap();
        let root = base(&tmp);
        let err = resolve_files(&root, &strings(&["src/[.vhd"]), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::PatternError { .. }));
    }

    #[test]
    fn invalid_exclude_pattern() {
        let tmp = TempDir::new().unwrap();
        let root = base(&tmp);
        let err = resolve_files(&root, &[], &strings(&["***"])).unwrap_err();
        assert!(matches!(err, ConfigError::PatternError { .. }));
    }
}
