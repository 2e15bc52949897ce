//! Structural patches applied to the concatenated module text.
//!
//! Each [`StructuralPatch`] is a regex anchor plus a replacement. A patch
//! whose anchor is absent leaves the text untouched and reports
//! [`PatchStatus::AnchorMissing`]; it never fails the build.
//!
//! The default list carries two compatibility shims for the edge platform:
//!
//! - `guard-serve`: wraps the framework's own `serve({ ... fetch: _fetch })`
//!   call in a check of the edge platform flag, since the platform dispatches
//!   requests itself
//! - `remove-error-trap`: drops `trapUnhandledErrors();` statements that
//!   stand alone on their line. They crash against the platform's frozen
//!   process global. The definition and chained calls are left alone.

use edgelink_core::{Error, Result};
use regex::Regex;
use serde::Serialize;

/// Global flag the bundle sets to `true` when running on the edge platform.
pub const EDGE_PLATFORM_FLAG: &str = "__EDGE_PLATFORM__";

const SERVE_ANCHOR: &str = r"(?s)(const nitroApp = useNitroApp\(\);.*?let _fetch = nitroApp\.fetch;.*?)(serve\(\{.*?fetch: _fetch.*?\}\);)";
const ERROR_TRAP_ANCHOR: &str = r"(?m)^[ \t]*trapUnhandledErrors\(\)[ \t]*;?[ \t]*(?:\r?\n|\z)";

/// Result of one patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchStatus {
    /// Anchor matched and was replaced
    Applied {
        /// Number of replacements
        count: usize,
    },
    /// The text already carries the patch's marker
    AlreadyApplied,
    /// Anchor not found; text unchanged
    AnchorMissing,
}

/// Named result of one patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOutcome {
    /// Patch name
    pub name: String,
    /// What happened
    #[serde(flatten)]
    pub status: PatchStatus,
}

impl PatchOutcome {
    /// Returns `true` if the patch changed the text.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self.status, PatchStatus::Applied { .. })
    }
}

/// One anchored rewrite.
#[derive(Debug, Clone)]
pub struct StructuralPatch {
    name: String,
    anchor: Regex,
    replacement: String,
    marker: Option<String>,
    all: bool,
}

impl StructuralPatch {
    /// Creates a patch replacing the first match of `anchor`.
    ///
    /// `replacement` may use `${1}`-style group references.
    ///
    /// # Errors
    ///
    /// Returns `Error::ValidationError` if `anchor` is not a valid regex.
    pub fn new(name: impl Into<String>, anchor: &str, replacement: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let anchor = Regex::new(anchor).map_err(|e| Error::ValidationError {
            field: format!("patch {name}"),
            reason: e.to_string(),
        })?;
        Ok(Self {
            name,
            anchor,
            replacement: replacement.into(),
            marker: None,
            all: false,
        })
    }

    /// Skips the patch when `marker` is already present in the text.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Replaces every match instead of the first.
    #[must_use]
    pub const fn replace_all(mut self) -> Self {
        self.all = true;
        self
    }

    /// Patch name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the patch to `text`.
    #[must_use]
    pub fn apply(&self, text: &str) -> (String, PatchOutcome) {
        let outcome = |status| PatchOutcome {
            name: self.name.clone(),
            status,
        };

        if self.marker.as_deref().is_some_and(|marker| text.contains(marker)) {
            return (text.to_string(), outcome(PatchStatus::AlreadyApplied));
        }

        let count = if self.all {
            self.anchor.find_iter(text).count()
        } else {
            usize::from(self.anchor.is_match(text))
        };
        if count == 0 {
            return (text.to_string(), outcome(PatchStatus::AnchorMissing));
        }

        let limit = if self.all { 0 } else { 1 };
        let patched = self
            .anchor
            .replacen(text, limit, self.replacement.as_str())
            .into_owned();
        (patched, outcome(PatchStatus::Applied { count }))
    }
}

/// Ordered list of patches.
#[derive(Debug, Clone, Default)]
pub struct PatchApplier {
    patches: Vec<StructuralPatch>,
}

impl PatchApplier {
    /// Creates an empty applier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an applier with the edge compatibility patches.
    ///
    /// # Errors
    ///
    /// Returns an error only if a built-in anchor fails to compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use edgelink_linker::PatchApplier;
    ///
    /// let applier = PatchApplier::with_defaults().unwrap();
    /// let (text, outcomes) = applier.apply("start();\ntrapUnhandledErrors();\n");
    ///
    /// assert_eq!(text, "start();\n");
    /// assert!(outcomes[1].is_applied());
    /// ```
    pub fn with_defaults() -> Result<Self> {
        let guard = format!("if (!globalThis.{EDGE_PLATFORM_FLAG}) {{");
        Ok(Self::new()
            .with_patch(
                StructuralPatch::new("guard-serve", SERVE_ANCHOR, format!("${{1}}{guard}\n  ${{2}}\n}}"))?
                    .with_marker(guard),
            )
            .with_patch(StructuralPatch::new("remove-error-trap", ERROR_TRAP_ANCHOR, "")?.replace_all()))
    }

    /// Appends a patch.
    #[must_use]
    pub fn with_patch(mut self, patch: StructuralPatch) -> Self {
        self.patches.push(patch);
        self
    }

    /// Number of patches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// Returns `true` if no patches are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Applies every patch in order.
    #[must_use]
    pub fn apply(&self, text: &str) -> (String, Vec<PatchOutcome>) {
        let mut current = text.to_string();
        let mut outcomes = Vec::with_capacity(self.patches.len());

        for patch in &self.patches {
            let (patched, outcome) = patch.apply(&current);
            match outcome.status {
                PatchStatus::Applied { count } => {
                    tracing::debug!("Patch {} applied {count} time(s)", patch.name());
                }
                PatchStatus::AlreadyApplied => {
                    tracing::debug!("Patch {} already present", patch.name());
                }
                PatchStatus::AnchorMissing => {
                    tracing::warn!("Patch {} found no anchor; text left unchanged", patch.name());
                }
            }
            current = patched;
            outcomes.push(outcome);
        }

        (current, outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_ENTRY: &str = "const nitroApp = useNitroApp();\nconst port = 3000;\nlet _fetch = nitroApp.fetch;\nserve({\n  port,\n  fetch: _fetch\n});\ntrapUnhandledErrors();\nexport default {};\n";

    #[test]
    fn test_guard_serve() {
        let (text, outcomes) = PatchApplier::with_defaults().unwrap().apply(SERVER_ENTRY);

        assert!(text.contains(
            "let _fetch = nitroApp.fetch;\nif (!globalThis.__EDGE_PLATFORM__) {\n  serve({\n  port,\n  fetch: _fetch\n});\n}"
        ));
        assert_eq!(outcomes[0].status, PatchStatus::Applied { count: 1 });
    }

    #[test]
    fn test_remove_error_trap_keeps_definition() {
        let src = "function trapUnhandledErrors() {\n  process.on('x', f);\n}\n  trapUnhandledErrors();\nnext();\ntrapUnhandledErrors()\n";
        let (text, outcomes) = PatchApplier::with_defaults().unwrap().apply(src);

        assert_eq!(text, "function trapUnhandledErrors() {\n  process.on('x', f);\n}\nnext();\n");
        assert_eq!(outcomes[1].status, PatchStatus::Applied { count: 2 });
    }

    #[test]
    fn test_remove_error_trap_skips_chained_calls() {
        let src = "trapUnhandledErrors().then(report);\nconst t = trapUnhandledErrors();\ntrapUnhandledErrors() ;\r\nnext();";
        let (text, outcomes) = PatchApplier::with_defaults().unwrap().apply(src);

        assert_eq!(
            text,
            "trapUnhandledErrors().then(report);\nconst t = trapUnhandledErrors();\nnext();"
        );
        assert_eq!(outcomes[1].status, PatchStatus::Applied { count: 1 });
    }

    #[test]
    fn test_absent_anchors_are_noops() {
        let src = "const a = 1;\nserve({ fetch: handler });\n";
        let (text, outcomes) = PatchApplier::with_defaults().unwrap().apply(src);

        assert_eq!(text, src);
        assert!(outcomes.iter().all(|o| o.status == PatchStatus::AnchorMissing));
    }

    #[test]
    fn test_reapplying_is_stable() {
        let applier = PatchApplier::with_defaults().unwrap();
        let (once, _) = applier.apply(SERVER_ENTRY);
        let (twice, outcomes) = applier.apply(&once);

        assert_eq!(once, twice);
        assert_eq!(outcomes[0].status, PatchStatus::AlreadyApplied);
    }

    #[test]
    fn test_custom_patch() {
        let applier = PatchApplier::new()
            .with_patch(StructuralPatch::new("rename", r"foo(\d)", "bar${1}").unwrap().replace_all());
        let (text, outcomes) = applier.apply("foo1 foo2 baz");

        assert_eq!(text, "bar1 bar2 baz");
        assert_eq!(outcomes[0].status, PatchStatus::Applied { count: 2 });
        assert_eq!(applier.len(), 1);
    }

    #[test]
    fn test_invalid_anchor() {
        let err = StructuralPatch::new("broken", "(", "").unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = PatchOutcome {
            name: "guard-serve".to_string(),
            status: PatchStatus::Applied { count: 1 },
        };
        assert_eq!(
            serde_json::to_string(&outcome).unwrap(),
            r#"{"name":"guard-serve","status":"applied","count":1}"#
        );
    }
}
