// ── Diagnostics ──
//
// Mapping and lifecycle code never bails on the first problem. Findings
// are collected here and handed back next to whatever was produced, so a
// caller sees every validation failure of a plan at once.

use std::fmt;

use strum::Display;

use crate::error::CoreError;
use crate::mapper::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// What produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DiagnosticKind {
    /// A declared value breaks a rule; nothing was sent.
    Validation,
    /// The remote object does not exist.
    NotFound,
    /// The API rejected a call or could not be reached.
    Client,
    /// A declared value could not be converted to its wire form.
    Transform,
    Configuration,
    General,
}

/// Lifecycle step a client error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
    Share,
    Detach,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub summary: String,
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.summary, self.detail)
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn add(
        &mut self,
        severity: Severity,
        kind: DiagnosticKind,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic {
            severity,
            kind,
            summary: summary.into(),
            detail: detail.into(),
        });
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.add(Severity::Error, DiagnosticKind::General, summary, detail);
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.add(Severity::Warning, DiagnosticKind::General, summary, detail);
    }

    pub fn add_validation(&mut self, detail: impl Into<String>) {
        self.add(
            Severity::Error,
            DiagnosticKind::Validation,
            "Validation Error",
            detail,
        );
    }

    pub fn add_transform(&mut self, detail: impl Into<String>) {
        self.add(
            Severity::Error,
            DiagnosticKind::Transform,
            "Transformation Error",
            detail,
        );
    }

    pub fn add_configuration(&mut self, detail: impl Into<String>) {
        self.add(
            Severity::Error,
            DiagnosticKind::Configuration,
            "Configuration Error",
            detail,
        );
    }

    pub fn add_not_found(&mut self, kind: ResourceKind, id: &str) {
        self.add(
            Severity::Error,
            DiagnosticKind::NotFound,
            "Not Found",
            format!("{kind} {id} was not found"),
        );
    }

    /// Record a failed remote call with its operation, resource and id.
    ///
    /// Not-found failures are recorded as [`DiagnosticKind::NotFound`].
    pub fn add_client_error(
        &mut self,
        operation: Operation,
        kind: ResourceKind,
        id: &str,
        err: &CoreError,
    ) {
        if err.is_not_found() {
            self.add_not_found(kind, id);
            return;
        }
        let target = if id.is_empty() {
            kind.to_string()
        } else {
            format!("{kind} {id}")
        };
        self.add(
            Severity::Error,
            DiagnosticKind::Client,
            "Client Error",
            format!("failed to {operation} {target}: {err}"),
        );
    }

    /// Union: append every entry of `other`.
    pub fn append(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn has_error(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    /// `true` if any entry reports a missing remote object.
    pub fn is_not_found(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.kind == DiagnosticKind::NotFound)
    }

    /// Turn not-found errors into warnings once the caller has dealt with
    /// the missing object (e.g. by dropping it from state).
    pub fn downgrade_not_found(&mut self) {
        for d in &mut self.entries {
            if d.kind == DiagnosticKind::NotFound {
                d.severity = Severity::Warning;
            }
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}
