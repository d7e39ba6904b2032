// crates/depotgate-core/tests/proptest_sanitize.rs
// ============================================================================
// Module: Sanitizer Property-Based Tests
// Description: Property tests for path containment and component sanitization.
// Purpose: Detect escapes and panics across wide untrusted-input ranges.
// ============================================================================

//! Property-based tests for [`depotgate_core::sanitize`] invariants: a
//! sanitized component never introduces a path separator, and
//! `resolve_under_base` never returns a path outside its base.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;

use depotgate_core::sanitize::resolve_under_base;
use depotgate_core::sanitize::sanitize_component;
use proptest::prelude::*;

proptest! {
    #[test]
    fn sanitize_component_never_contains_path_separators(raw in ".{0,300}") {
        let sanitized = sanitize_component(&raw);
        prop_assert!(!sanitized.contains('/'));
        prop_assert!(!sanitized.contains('\\'));
        prop_assert!(!sanitized.is_empty());
        prop_assert!(sanitized.chars().count() <= 200);
    }

    #[test]
    fn resolve_under_base_never_escapes_base(rel in "([a-zA-Z0-9_./]|\\.\\.){0,60}") {
        let base = Path::new("/tmp/depotgate-proptest-base");
        if let Ok(resolved) = resolve_under_base(base, &rel) {
            prop_assert!(resolved.starts_with(base));
        }
    }

    #[test]
    fn resolve_under_base_always_rejects_absolute_input(rel in "/[a-zA-Z0-9_./]{0,60}") {
        let base = Path::new("/tmp/depotgate-proptest-base");
        prop_assert!(resolve_under_base(base, &rel).is_err());
    }
}
