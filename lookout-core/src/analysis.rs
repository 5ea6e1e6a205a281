//! Code analysis backend seam.
//!
//! The execution endpoints hand submitted source to a [`CodeAnalyzer`]
//! and shape their responses from the returned report. The default
//! [`PatternAnalyzer`] runs substring heuristics, enough to drive the
//! dashboard; a real backend slots in behind the same trait.

use serde::Serialize;

/// One structural observation about submitted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Finding {
    PotentialIssue,
    OutputOperation,
    FunctionDefinition,
    ConditionalBranch,
    LoopConstruct,
    ModuleImport,
    TypeDefinition,
}

impl Finding {
    /// Human-readable description used by the explanation view.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::PotentialIssue => "Potential issues detected",
            Self::OutputOperation => "Output operation detected",
            Self::FunctionDefinition => "Function definition detected",
            Self::ConditionalBranch => "Conditional logic found",
            Self::LoopConstruct => "Loop structure identified",
            Self::ModuleImport => "Module dependencies detected",
            Self::TypeDefinition => "Object-oriented structure found",
        }
    }

    /// Whether this finding describes code structure, as opposed to the
    /// issue/output signals that only shape prediction output.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::PotentialIssue | Self::OutputOperation)
    }
}

/// Counts and findings for one piece of submitted code.
#[derive(Debug, Clone, Serialize)]
pub struct CodeReport {
    pub char_count: usize,
    pub line_count: usize,
    pub findings: Vec<Finding>,
}

impl CodeReport {
    pub fn has(&self, finding: Finding) -> bool {
        self.findings.contains(&finding)
    }
}

/// Analysis backend: source text in, structured report out.
pub trait CodeAnalyzer: Send + Sync {
    fn analyze(&self, code: &str) -> CodeReport;
}

/// Substring-heuristic analyzer, the default backend.
///
/// Issue detection is case-insensitive; the structural patterns match
/// the source as written.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternAnalyzer;

impl CodeAnalyzer for PatternAnalyzer {
    fn analyze(&self, code: &str) -> CodeReport {
        let lowered = code.to_lowercase();
        let mut findings = Vec::new();

        if lowered.contains("error") || lowered.contains("exception") {
            findings.push(Finding::PotentialIssue);
        }
        if code.contains("print") || code.contains("console.log") {
            findings.push(Finding::OutputOperation);
        }
        if code.contains("function") || code.contains("def ") {
            findings.push(Finding::FunctionDefinition);
        }
        if code.contains("if") || code.contains("else") {
            findings.push(Finding::ConditionalBranch);
        }
        if code.contains("for") || code.contains("while") {
            findings.push(Finding::LoopConstruct);
        }
        if code.contains("import") || code.contains("require") {
            findings.push(Finding::ModuleImport);
        }
        if code.contains("class") {
            findings.push(Finding::TypeDefinition);
        }

        CodeReport {
            char_count: code.chars().count(),
            line_count: code.lines().count().max(1),
            findings,
        }
    }
}
