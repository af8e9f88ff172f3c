//! Architectural Enforcement Integration Tests
//!
//! Source-scanning checks that keep the dispatch path of `gridui-core`
//! honest:
//! - No file, network or process I/O and no sleeping outside configuration
//! - No `unwrap()` / `expect()` / `panic!` in production code
//!
//! The helpers here are shared by the test files under `tests/`.

use std::fs;
use std::path::{Path, PathBuf};

/// Root of the workspace this package lives in
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Every `.rs` file under `dir`, sorted
#[must_use]
pub fn rust_sources(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// A line of production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number
    pub number: usize,
    /// Code with any trailing `//` comment removed
    pub code: String,
}

/// Production lines of a file: comments dropped, and nothing from the first
/// `#[cfg(test)]` onwards
#[must_use]
pub fn production_lines(content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .filter_map(|(idx, line)| {
            let code = line.split("//").next().unwrap_or(line).trim();
            (!code.is_empty()).then(|| SourceLine {
                number: idx + 1,
                code: code.to_string(),
            })
        })
        .collect()
}

/// Scan `files` for any of `patterns`, reporting `path:line - label: code`
#[must_use]
pub fn find_violations(files: &[PathBuf], patterns: &[(&str, &str)]) -> Vec<String> {
    let mut violations = Vec::new();
    for path in files {
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        for line in production_lines(&content) {
            for (pattern, label) in patterns {
                if line.code.contains(pattern) {
                    violations.push(format!(
                        "{}:{} - {label}: {}",
                        path.display(),
                        line.number,
                        line.code
                    ));
                }
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "fn a() {}\n// note\nlet x = 1; // trailing\n#[cfg(test)]\nfn b() { x.unwrap() }\n";
        let lines = production_lines(source);
        assert_eq!(
            lines,
            vec![
                SourceLine {
                    number: 1,
                    code: "fn a() {}".to_string()
                },
                SourceLine {
                    number: 3,
                    code: "let x = 1;".to_string()
                },
            ]
        );
    }
}
