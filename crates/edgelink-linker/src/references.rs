//! Link-order check for registry references.
//!
//! A static reference binds when its module initializer runs, so its target
//! must be linked earlier. A dynamic reference is only dereferenced when
//! called, so the target merely has to exist somewhere in the bundle.

use crate::rewriter::RewrittenModule;
use edgelink_core::{Error, Result};
use edgelink_files::FilePath;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Whether a reference binds at initialization or on call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `import ... from` or `export ... from`
    Static,
    /// `import(...)`
    Dynamic,
}

/// One registry reference made by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReference {
    /// Specifier as written
    pub specifier: String,
    /// Registry key it resolved to
    pub target: String,
    /// Binding time
    pub kind: ReferenceKind,
    /// 1-based source line
    pub line: usize,
}

/// What is wrong with a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceProblem {
    /// No linked module has the target key
    Missing,
    /// The target is linked at or after the referencing module
    RegisteredLater,
}

/// A reference the link order cannot satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceFinding {
    /// Referencing module
    pub module: FilePath,
    /// The reference
    pub reference: ModuleReference,
    /// The problem
    pub problem: ReferenceProblem,
}

impl fmt::Display for ReferenceFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.problem {
            ReferenceProblem::Missing => "no linked module registers",
            ReferenceProblem::RegisteredLater => "link order registers it too late:",
        };
        write!(
            f,
            "{}:{} '{}' ({reason} {})",
            self.module, self.reference.line, self.reference.specifier, self.reference.target
        )
    }
}

/// Checks every reference of `modules`, which must be in link order.
///
/// Findings are logged as warnings and returned.
///
/// # Errors
///
/// With `strict` set, the first finding is returned as
/// `Error::UnresolvedReference`.
pub fn check_references(modules: &[RewrittenModule], strict: bool) -> Result<Vec<ReferenceFinding>> {
    let positions: HashMap<&str, usize> = modules
        .iter()
        .enumerate()
        .map(|(idx, module)| (module.path.as_str(), idx))
        .collect();

    let mut findings = Vec::new();
    for (idx, module) in modules.iter().enumerate() {
        for reference in &module.references {
            let problem = match (positions.get(reference.target.as_str()), reference.kind) {
                (None, _) => ReferenceProblem::Missing,
                (Some(&target), ReferenceKind::Static) if target >= idx => {
                    ReferenceProblem::RegisteredLater
                }
                _ => continue,
            };

            let finding = ReferenceFinding {
                module: module.path.clone(),
                reference: reference.clone(),
                problem,
            };
            tracing::warn!("Unsatisfied reference {finding}");
            findings.push(finding);
        }
    }

    if strict && let Some(first) = findings.first() {
        return Err(Error::UnresolvedReference {
            module: first.module.to_string(),
            specifier: first.reference.specifier.clone(),
            reason: match first.problem {
                ReferenceProblem::Missing => "target module is not linked".to_string(),
                ReferenceProblem::RegisteredLater => {
                    format!("target {} is linked after the referencing module", first.reference.target)
                }
            },
        });
    }

    Ok(findings)
}
