//! Integration Test: Map Surface Ownership
//!
//! **Policy**: Only the map module may call the mutating `MapSurface`
//! methods. Everything else goes through `MapSync`, which is what keeps
//! markers, camera and highlight consistent with the view state.

use architectural_enforcement::{fail_with, production_lines_in, workspace_root};

/// Calls that change what a surface shows
const MUTATORS: &[&str] = &[
    ".add_marker(",
    ".remove_all_markers(",
    ".fit_bounds(",
    ".fly_to(",
    ".highlight_marker(",
    ".add_control(",
    ".remove_control(",
];

const ALLOWED_DIR: &str = "scout/core/src/map";

#[test]
fn test_only_map_module_mutates_surface() {
    let allowed = workspace_root().join(ALLOWED_DIR);
    let mut violations = Vec::new();

    for dir in ["scout/core/src", "scout/cli/src"] {
        for line in production_lines_in(dir) {
            if line.path.starts_with(&allowed) {
                continue;
            }
            if let Some(call) = MUTATORS.iter().find(|m| line.code.contains(*m)) {
                violations.push(format!("{line} (calls {call})"));
            }
        }
    }

    fail_with(
        "Map surface mutated outside the map module!",
        &[
            "✅ Route the change through MapSync::sync, reset_view or a MapControl",
            "❌ Never drive a MapSurface directly from session, gallery or CLI code",
        ],
        &violations,
    );
}

#[test]
fn test_map_module_exists() {
    let lines = production_lines_in(ALLOWED_DIR);
    assert!(
        lines.iter().any(|l| l.code.contains(".remove_all_markers(")),
        "map module should rebuild markers through the surface"
    );
}
