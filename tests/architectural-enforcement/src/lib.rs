//! Architectural Enforcement Integration Tests
//!
//! Source-walking helpers shared by the tests in `tests/`. They enforce
//! structural rules that the type system alone does not:
//! - Only the map module mutates a map surface
//! - No sleep() calls in production code outside replay pacing
//! - No blocking I/O inside async functions
//!
//! The helpers are deliberately line based. They skip comments and
//! everything from the first `#[cfg(test)]` of a file onward, which is
//! where this workspace keeps its unit tests.

use std::fs;
use std::path::{Path, PathBuf};

/// One production source line
#[derive(Clone, Debug)]
pub struct SourceLine {
    /// File the line belongs to
    pub path: PathBuf,
    /// 1-based line number
    pub number: usize,
    /// Line text with any `//` comment removed
    pub code: String,
}

impl std::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.number, self.code.trim())
    }
}

/// Workspace root, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Every `.rs` file under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    if !path.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Strip a trailing `//` comment
#[must_use]
pub fn code_part(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Production lines of one file: comments stripped, unit tests dropped
#[must_use]
pub fn production_lines(path: &Path) -> Vec<SourceLine> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| SourceLine {
            path: path.to_path_buf(),
            number: idx + 1,
            code: code_part(line).to_string(),
        })
        .filter(|line| !line.code.trim().is_empty())
        .collect()
}

/// Production lines of every file under `dir`
#[must_use]
pub fn production_lines_in(dir: &str) -> Vec<SourceLine> {
    rust_files(dir)
        .iter()
        .flat_map(|path| production_lines(path))
        .collect()
}

/// Whether the line at `idx` sits inside an `async fn`
///
/// Scans backwards to the nearest function header.
#[must_use]
pub fn is_in_async_function(lines: &[&str], idx: usize) -> bool {
    for i in (0..idx).rev() {
        let line = lines[i].trim();

        if line.contains("async fn ") {
            return true;
        }
        if line.contains("fn ") && !line.contains("async") {
            return false;
        }
        if line.starts_with("mod ") || (line.starts_with("impl") && line.contains('{')) {
            return false;
        }
    }
    false
}

/// Print violations the way every enforcement test reports them, then panic
pub fn fail_with(title: &str, hints: &[&str], violations: &[String]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    if !hints.is_empty() {
        eprintln!();
        for hint in hints {
            eprintln!("  {hint}");
        }
    }
    panic!(
        "\nFound {} violation(s).\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_part_strips_comments() {
        assert_eq!(code_part("let x = 1; // note"), "let x = 1; ");
        assert_eq!(code_part("/// doc"), "");
    }

    #[test]
    fn test_async_detection() {
        let code = vec![
            "    pub async fn open(&self) {",
            "        let body = std::fs::read(path);",
            "    }",
        ];
        assert!(is_in_async_function(&code, 1));

        let code = vec!["fn load() {", "    std::fs::read_to_string(p)", "}"];
        assert!(!is_in_async_function(&code, 1));
    }

    #[test]
    fn test_workspace_root_has_core() {
        assert!(workspace_root().join("scout/core/src/lib.rs").exists());
    }
}
