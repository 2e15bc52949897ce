//! Module rewriting: `import`/`export` statements into registry operations.
//!
//! Each executable module is tokenized and scanned once for `import` and
//! `export` keywords at statement positions. Every recognized form is
//! replaced in place by plain statements that read from or publish into the
//! runtime module registry; any other shape after one of those keywords is a
//! fatal [`Error::UnsupportedSyntax`]. The rewritten body is then wrapped in
//! an immediately-invoked function so module-local names never collide in
//! the flattened bundle.
//!
//! # Examples
//!
//! ```
//! use edgelink_core::LinkerConfig;
//! use edgelink_files::FilePath;
//! use edgelink_linker::ModuleRewriter;
//!
//! let rewriter = ModuleRewriter::new(&LinkerConfig::default());
//! let path = FilePath::new("chunks/_routes/home.mjs").unwrap();
//! let module = rewriter
//!     .rewrite_source(&path, "import { h as y } from '../_libs/util.mjs';\nexport default y;\n")
//!     .unwrap();
//!
//! assert!(module.code.contains(r#"const { h: y } = __MODS__["chunks/_libs/util.mjs"] || {};"#));
//! assert!(module.code.contains("__DEFAULT_EXPORT__ = y;"));
//! assert_eq!(module.exports, vec!["default"]);
//! ```

use crate::lexer::{Token, TokenKind, line_at, tokenize};
use crate::references::{ModuleReference, ReferenceKind};
use crate::specifier::{Specifier, classify};
use edgelink_core::{Error, LinkerConfig, Result};
use edgelink_files::{FilePath, FileRecord};

/// Name of the runtime module registry object.
pub const REGISTRY: &str = "__MODS__";

/// Per-module local that receives `export default` expressions.
pub const DEFAULT_SENTINEL: &str = "__DEFAULT_EXPORT__";

/// Rewrites module sources for the flattened bundle.
#[derive(Debug, Clone)]
pub struct ModuleRewriter {
    builtin_prefix: String,
    strict_builtins: bool,
}

/// A module after rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenModule {
    /// Module path, also its registry key
    pub path: FilePath,
    /// Wrapped initializer code
    pub code: String,
    /// Names the module publishes, `default` included
    pub exports: Vec<String>,
    /// Registry references, in source order
    pub references: Vec<ModuleReference>,
}

impl ModuleRewriter {
    /// Creates a rewriter using the builtin settings of `config`.
    #[must_use]
    pub fn new(config: &LinkerConfig) -> Self {
        Self {
            builtin_prefix: config.builtin_prefix.clone(),
            strict_builtins: config.strict_builtins,
        }
    }

    /// Rewrites one collected record.
    ///
    /// # Errors
    ///
    /// See [`rewrite_source`](Self::rewrite_source).
    pub fn rewrite(&self, record: &FileRecord) -> Result<RewrittenModule> {
        self.rewrite_source(record.path(), record.content())
    }

    /// Rewrites `src` as the module at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnsupportedSyntax` for an unterminated literal or an
    /// unrecognized `import`/`export` form, `Error::UnknownBuiltin` for a
    /// builtin outside the polyfill table when strict, and
    /// `Error::UnresolvedReference` for a relative specifier that climbs
    /// above the server root.
    pub fn rewrite_source(&self, path: &FilePath, src: &str) -> Result<RewrittenModule> {
        let tokens = tokenize(src).map_err(|e| Error::UnsupportedSyntax {
            module: path.to_string(),
            line: line_at(src, e.offset),
            message: e.message,
        })?;

        let mut scan = Scan {
            rewriter: self,
            path,
            src,
            tokens,
            edits: Vec::new(),
            manifest: ExportManifest::default(),
            references: Vec::new(),
        };
        scan.run()?;

        let body = scan.apply_edits();
        let code = wrap(path, &body, &scan.manifest)?;
        let exports = scan.manifest.names();

        tracing::debug!(
            "Rewrote {path}: {} references, {} exports",
            scan.references.len(),
            exports.len()
        );

        Ok(RewrittenModule {
            path: path.clone(),
            code,
            exports,
            references: scan.references,
        })
    }
}

/// What a module publishes.
#[derive(Debug, Default)]
struct ExportManifest {
    /// Objects spread into the exports (`export * from`)
    spreads: Vec<String>,
    /// `exportedName -> expression` pairs
    entries: Vec<(String, String)>,
    /// `export default <expr>` assigned the sentinel
    has_default: bool,
}

impl ExportManifest {
    fn is_empty(&self) -> bool {
        self.spreads.is_empty() && self.entries.is_empty() && !self.has_default
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|(name, _)| name.clone()).collect();
        if self.has_default {
            names.push("default".to_string());
        }
        names
    }
}

/// Where a binding reads from.
#[derive(Debug)]
enum Source {
    /// Quoted registry key
    Registry(String),
    /// Polyfill expression
    Polyfill(&'static str),
    /// Unknown builtin
    Empty,
}

impl Source {
    fn object(&self) -> String {
        match self {
            Self::Registry(key) => format!("{REGISTRY}[{key}] || {{}}"),
            Self::Polyfill(polyfill) => (*polyfill).to_string(),
            Self::Empty => "{}".to_string(),
        }
    }

    fn default_value(&self) -> String {
        match self {
            Self::Registry(key) => format!("({REGISTRY}[{key}] || {{}}).default"),
            Self::Polyfill(polyfill) => (*polyfill).to_string(),
            Self::Empty => "{}".to_string(),
        }
    }

    fn member(&self, name: &str) -> String {
        match self {
            _ if name == "default" => self.default_value(),
            Self::Registry(key) => format!("({REGISTRY}[{key}] || {{}}).{name}"),
            Self::Polyfill(polyfill) => format!("{polyfill}.{name}"),
            Self::Empty => "undefined".to_string(),
        }
    }
}

#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

struct Scan<'a> {
    rewriter: &'a ModuleRewriter,
    path: &'a FilePath,
    src: &'a str,
    tokens: Vec<Token>,
    edits: Vec<Edit>,
    manifest: ExportManifest,
    references: Vec<ModuleReference>,
}

impl Scan<'_> {
    fn run(&mut self) -> Result<()> {
        if self.src.starts_with("#!") {
            let end = self.src.find('\n').unwrap_or(self.src.len());
            self.replace(0, end, String::new());
        }

        let mut i = 0;
        while i < self.tokens.len() {
            let statement = self.is_ident(i, "import") || self.is_ident(i, "export");
            if !statement || self.is_property(i) {
                i += 1;
            } else if self.is_ident(i, "import") {
                i = self.import_at(i)?;
            } else {
                i = self.export_at(i)?;
            }
        }
        Ok(())
    }

    /// `obj.import`, `obj?.export` and `{ import: 1 }` are property names.
    fn is_property(&self, i: usize) -> bool {
        let after_dot = i > 0 && (self.is_punct(i - 1, ".") || self.is_punct(i - 1, "?."));
        after_dot || self.is_punct(i + 1, ":")
    }

    fn import_at(&mut self, i: usize) -> Result<usize> {
        let line = self.line(i);

        if self.is_punct(i + 1, ".") {
            return Ok(i + 1);
        }
        if self.is_punct(i + 1, "(") {
            return self.dynamic_import(i, line);
        }
        if self.kind(i + 1) == Some(TokenKind::Str) {
            let specifier = self.string_value(i + 1)?;
            let next = self.statement_end(i + 2);
            if !matches!(self.classify(&specifier)?, Specifier::Builtin { .. }) {
                self.source_for(&specifier, ReferenceKind::Static, line)?;
            }
            self.remove_statement(i, next);
            return Ok(next);
        }

        let mut j = i + 1;
        let mut default = None;
        let mut namespace = None;
        let mut named = None;

        if self.kind(j) == Some(TokenKind::Ident) && !self.is_ident(j, "from") {
            default = Some(self.name(j)?);
            j += 1;
            if self.is_punct(j, ",") {
                j += 1;
                if !self.is_punct(j, "*") && !self.is_punct(j, "{") {
                    return Err(self.unsupported(j, "expected '*' or '{' after default import"));
                }
            }
        }
        if self.is_punct(j, "*") {
            if !self.is_ident(j + 1, "as") {
                return Err(self.unsupported(j + 1, "expected 'as' after '*' in import"));
            }
            namespace = Some(self.name(j + 2)?);
            j += 3;
        } else if self.is_punct(j, "{") {
            named = Some(self.specifier_list(&mut j)?);
        }
        if default.is_none() && namespace.is_none() && named.is_none() {
            return Err(self.unsupported(j, "unrecognized import form"));
        }

        if !self.is_ident(j, "from") {
            return Err(self.unsupported(j, "expected 'from' in import"));
        }
        let specifier = self.string_value(j + 1)?;
        j = self.skip_attributes(j + 2)?;
        let next = self.statement_end(j);

        let source = self.source_for(&specifier, ReferenceKind::Static, line)?;
        let mut statements = Vec::new();
        if let Some(local) = default {
            statements.push(format!("const {local} = {};", source.default_value()));
        }
        if let Some(local) = namespace {
            statements.push(format!("const {local} = {};", source.object()));
        }
        if let Some(list) = named.filter(|list| !list.is_empty()) {
            let pattern: Vec<String> = list
                .iter()
                .map(|(imported, local)| {
                    if imported == local {
                        local.clone()
                    } else {
                        format!("{imported}: {local}")
                    }
                })
                .collect();
            statements.push(format!("const {{ {} }} = {};", pattern.join(", "), source.object()));
        }

        self.replace_statement(i, next, statements.join(" "));
        Ok(next)
    }

    fn dynamic_import(&mut self, i: usize, line: usize) -> Result<usize> {
        let literal = self.kind(i + 2) == Some(TokenKind::Str) && self.is_punct(i + 3, ")");
        if !literal {
            tracing::warn!(
                "{}:{line}: dynamic import with a computed specifier left as is",
                self.path
            );
            return Ok(i + 2);
        }

        let specifier = self.string_value(i + 2)?;
        if matches!(self.classify(&specifier)?, Specifier::Builtin { .. }) {
            return Ok(i + 4);
        }

        let Source::Registry(key) = self.source_for(&specifier, ReferenceKind::Dynamic, line)? else {
            return Ok(i + 4);
        };
        self.replace(
            self.tokens[i].start,
            self.tokens[i + 3].end,
            format!("Promise.resolve({REGISTRY}[{key}])"),
        );
        Ok(i + 4)
    }

    fn export_at(&mut self, i: usize) -> Result<usize> {
        let line = self.line(i);
        let j = i + 1;

        // a method named `export`
        if self.is_punct(j, "(") {
            return Ok(j);
        }

        if self.is_punct(j, "{") {
            let mut k = j;
            let list = self.specifier_list(&mut k)?;
            if self.is_ident(k, "from") {
                let specifier = self.string_value(k + 1)?;
                let source = self.source_for(&specifier, ReferenceKind::Static, line)?;
                for (imported, exported) in list {
                    self.manifest.entries.push((exported, source.member(&imported)));
                }
                k += 2;
            } else {
                self.manifest.entries.extend(list.into_iter().map(|(local, exported)| (exported, local)));
            }
            let next = self.statement_end(k);
            self.remove_statement(i, next);
            return Ok(next);
        }

        if self.is_punct(j, "*") {
            let (alias, k) = if self.is_ident(j + 1, "as") {
                (Some(self.name(j + 2)?), j + 3)
            } else {
                (None, j + 1)
            };
            if !self.is_ident(k, "from") {
                return Err(self.unsupported(k, "expected 'from' in export *"));
            }
            let specifier = self.string_value(k + 1)?;
            let source = self.source_for(&specifier, ReferenceKind::Static, line)?;
            match alias {
                Some(alias) => self.manifest.entries.push((alias, source.object())),
                None => self.manifest.spreads.push(source.object()),
            }
            let next = self.statement_end(k + 2);
            self.remove_statement(i, next);
            return Ok(next);
        }

        if self.is_ident(j, "default") {
            let k = j + 1;
            if let Some(name_idx) = self.declared_name(k) {
                let name = self.name(name_idx)?;
                self.strip_qualifier(i, k);
                self.manifest.entries.push(("default".to_string(), name));
                return Ok(k);
            }
            self.replace(
                self.tokens[i].start,
                self.tokens[j].end,
                format!("{DEFAULT_SENTINEL} ="),
            );
            self.manifest.has_default = true;
            return Ok(k);
        }

        if ["const", "let", "var"].iter().any(|kw| self.is_ident(j, kw)) {
            if self.kind(j + 1) != Some(TokenKind::Ident) {
                return Err(self.unsupported(j + 1, "destructuring in an exported declaration"));
            }
            let name = self.name(j + 1)?;
            self.strip_qualifier(i, j);
            self.manifest.entries.push((name.clone(), name));
            return Ok(j);
        }

        if let Some(name_idx) = self.declared_name(j) {
            let name = self.name(name_idx)?;
            self.strip_qualifier(i, j);
            self.manifest.entries.push((name.clone(), name));
            return Ok(j);
        }

        Err(self.unsupported(j, "unrecognized export form"))
    }

    /// Index of the name in `function [*] name`, `async function [*] name`
    /// or `class name` starting at `k`.
    fn declared_name(&self, k: usize) -> Option<usize> {
        let mut k = k;
        if self.is_ident(k, "async") && self.is_ident(k + 1, "function") {
            k += 1;
        }
        if self.is_ident(k, "function") {
            k += 1;
            if self.is_punct(k, "*") {
                k += 1;
            }
        } else if self.is_ident(k, "class") {
            k += 1;
            if self.is_ident(k, "extends") {
                return None;
            }
        } else {
            return None;
        }
        (self.kind(k) == Some(TokenKind::Ident)).then_some(k)
    }

    /// Parses `{ a, b as c, default as d }` starting at `*j`, leaving `*j`
    /// after the closing brace.
    fn specifier_list(&self, j: &mut usize) -> Result<Vec<(String, String)>> {
        *j += 1;
        let mut list = Vec::new();
        loop {
            if self.is_punct(*j, "}") {
                *j += 1;
                return Ok(list);
            }
            let name = self.name(*j)?;
            *j += 1;
            let alias = if self.is_ident(*j, "as") {
                let alias = self.name(*j + 1)?;
                *j += 2;
                alias
            } else {
                name.clone()
            };
            list.push((name, alias));

            if self.is_punct(*j, ",") {
                *j += 1;
            } else if !self.is_punct(*j, "}") {
                return Err(self.unsupported(*j, "expected ',' or '}' in specifier list"));
            }
        }
    }

    /// Skips an import attributes clause (`with { type: "json" }`).
    fn skip_attributes(&self, j: usize) -> Result<usize> {
        let keyword = self.is_ident(j, "with") || self.is_ident(j, "assert");
        if !keyword || !self.is_punct(j + 1, "{") {
            return Ok(j);
        }
        (j + 2..self.tokens.len())
            .find(|&k| self.is_punct(k, "}"))
            .map(|k| k + 1)
            .ok_or_else(|| self.unsupported(j, "unterminated import attributes"))
    }

    fn classify(&self, specifier: &str) -> Result<Specifier> {
        classify(self.path, specifier, &self.rewriter.builtin_prefix).map_err(|reason| {
            Error::UnresolvedReference {
                module: self.path.to_string(),
                specifier: specifier.to_string(),
                reason,
            }
        })
    }

    fn source_for(&mut self, specifier: &str, kind: ReferenceKind, line: usize) -> Result<Source> {
        match self.classify(specifier)? {
            Specifier::Relative(target) | Specifier::Bare(target) => {
                let key = serde_json::to_string(&target)?;
                self.references.push(ModuleReference {
                    specifier: specifier.to_string(),
                    target,
                    kind,
                    line,
                });
                Ok(Source::Registry(key))
            }
            Specifier::Builtin {
                polyfill: Some(polyfill),
                ..
            } => Ok(Source::Polyfill(polyfill)),
            Specifier::Builtin { name, polyfill: None } => {
                if self.rewriter.strict_builtins {
                    return Err(Error::UnknownBuiltin {
                        module: self.path.to_string(),
                        name,
                    });
                }
                tracing::warn!(
                    "{}:{line}: no polyfill for builtin '{name}'; binding an empty object",
                    self.path
                );
                Ok(Source::Empty)
            }
        }
    }

    fn string_value(&self, i: usize) -> Result<String> {
        if self.kind(i) != Some(TokenKind::Str) {
            return Err(self.unsupported(i, "expected a string specifier"));
        }
        let text = self.text(i);
        let inner = &text[1..text.len() - 1];
        if inner.contains('\\') {
            return Err(self.unsupported(i, "escape sequence in module specifier"));
        }
        Ok(inner.to_string())
    }

    fn name(&self, i: usize) -> Result<String> {
        if self.kind(i) == Some(TokenKind::Ident) {
            Ok(self.text(i).to_string())
        } else {
            Err(self.unsupported(i, "expected an identifier"))
        }
    }

    /// Index after an optional `;` at `i`.
    fn statement_end(&self, i: usize) -> usize {
        if self.is_punct(i, ";") { i + 1 } else { i }
    }

    /// Replaces a whole statement with an empty statement, so the lines
    /// around it are never joined by semicolon insertion.
    fn remove_statement(&mut self, first: usize, next: usize) {
        self.replace_statement(first, next, ";".to_string());
    }

    /// Replaces tokens `first..next`.
    fn replace_statement(&mut self, first: usize, next: usize, replacement: String) {
        let start = self.tokens[first].start;
        let end = self.tokens[next - 1].end;
        self.replace(start, end, replacement);
    }

    /// Drops `export ` (or `export default `) in front of token `decl`.
    fn strip_qualifier(&mut self, export: usize, decl: usize) {
        self.replace(self.tokens[export].start, self.tokens[decl].start, String::new());
    }

    fn replace(&mut self, start: usize, end: usize, replacement: String) {
        self.edits.push(Edit {
            start,
            end,
            replacement,
        });
    }

    fn apply_edits(&self) -> String {
        let mut out = String::with_capacity(self.src.len());
        let mut cursor = 0;
        for edit in &self.edits {
            out.push_str(&self.src[cursor..edit.start]);
            out.push_str(&edit.replacement);
            cursor = edit.end;
        }
        out.push_str(&self.src[cursor..]);
        out
    }

    fn kind(&self, i: usize) -> Option<TokenKind> {
        self.tokens.get(i).map(|t| t.kind)
    }

    fn text(&self, i: usize) -> &str {
        self.tokens.get(i).map_or("", |t| t.text(self.src))
    }

    fn is_punct(&self, i: usize, p: &str) -> bool {
        self.tokens.get(i).is_some_and(|t| t.is_punct(self.src, p))
    }

    fn is_ident(&self, i: usize, word: &str) -> bool {
        self.tokens.get(i).is_some_and(|t| t.is_ident(self.src, word))
    }

    fn line(&self, i: usize) -> usize {
        let offset = self.tokens.get(i).map_or(self.src.len(), |t| t.start);
        line_at(self.src, offset)
    }

    fn unsupported(&self, i: usize, message: &str) -> Error {
        let found = match self.tokens.get(i) {
            Some(_) => format!("'{}'", self.text(i)),
            None => "end of input".to_string(),
        };
        Error::UnsupportedSyntax {
            module: self.path.to_string(),
            line: self.line(i),
            message: format!("{message}, found {found}"),
        }
    }
}

/// Wraps a rewritten body in its isolated-scope initializer.
fn wrap(path: &FilePath, body: &str, manifest: &ExportManifest) -> Result<String> {
    let mut code = format!(
        "/* Module: {} */\n(function() {{\n  let {DEFAULT_SENTINEL};\n",
        path.as_str().replace("*/", "*\\/")
    );
    code.push_str(body);
    if !body.ends_with('\n') {
        code.push('\n');
    }

    if !manifest.is_empty() {
        // `export *` never forwards a default
        let mut parts: Vec<String> = manifest
            .spreads
            .iter()
            .map(|s| format!("...(({{ default: _, ...rest }}) => rest)({s})"))
            .collect();
        parts.extend(manifest.entries.iter().map(|(name, value)| {
            if name == value {
                name.clone()
            } else {
                format!("{name}: {value}")
            }
        }));
        if manifest.has_default {
            parts.push(format!("default: {DEFAULT_SENTINEL}"));
        }
        let key = serde_json::to_string(path.as_str())?;
        code.push_str(&format!("  {REGISTRY}[{key}] = {{ {} }};\n", parts.join(", ")));
    }

    code.push_str("})();\n");
    Ok(code)
}
