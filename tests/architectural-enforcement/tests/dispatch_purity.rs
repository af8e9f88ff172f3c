//! Integration Test: Dispatch Path Purity
//!
//! **Policy**: Everything the `UiManager` can reach runs inline on the host's
//! event thread. It must never touch the file system, the network or child
//! processes, and must never sleep. Only `config.rs` may read files.

use architectural_enforcement::{find_violations, rust_sources, workspace_root};

const FORBIDDEN: &[(&str, &str)] = &[
    ("std::fs", "File I/O"),
    ("File::open", "File I/O"),
    ("std::net", "Network I/O"),
    ("std::process::Command", "Process I/O"),
    ("thread::sleep", "Sleep"),
    ("std::io::stdin", "Blocking stdin"),
];

#[test]
fn test_no_io_on_dispatch_path() {
    let core = workspace_root().join("gridui").join("core").join("src");
    assert!(core.exists(), "gridui-core sources not found at {}", core.display());

    let files: Vec<_> = rust_sources(&core)
        .into_iter()
        .filter(|path| path.file_name().and_then(|n| n.to_str()) != Some("config.rs"))
        .collect();
    assert!(!files.is_empty());

    let violations = find_violations(&files, FORBIDDEN);
    if !violations.is_empty() {
        eprintln!("\nI/O found on the dispatch path:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        panic!("\nFound {} dispatch-path I/O violation(s)", violations.len());
    }
}
