//! Integration Test: Panic-Free Library Code
//!
//! **Policy**: `gridui-core` reports construction problems as `UiError`
//! values and catches handler failures. Its production code must not
//! introduce panics of its own.

use architectural_enforcement::{find_violations, rust_sources, workspace_root};

const FORBIDDEN: &[(&str, &str)] = &[
    (".unwrap()", "unwrap"),
    (".expect(", "expect"),
    ("panic!(", "panic"),
    ("unreachable!(", "unreachable"),
    ("todo!(", "todo"),
];

#[test]
fn test_no_panics_in_core() {
    let core = workspace_root().join("gridui").join("core").join("src");
    assert!(core.exists(), "gridui-core sources not found at {}", core.display());

    let violations = find_violations(&rust_sources(&core), FORBIDDEN);
    if !violations.is_empty() {
        eprintln!("\nPanicking calls found in gridui-core:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        panic!("\nFound {} panic violation(s)", violations.len());
    }
}
