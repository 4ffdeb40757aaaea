use serde::Serialize;
use std::path::{Path, PathBuf};

const CLASS_SUFFIX: &str = ".class";

/// A class named by a service descriptor, waiting to be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub class_name: String,
    pub artifact: PathBuf,
}

impl Candidate {
    pub fn new(class_name: impl Into<String>, artifact: &Path) -> Self {
        Self {
            class_name: class_name.into(),
            artifact: artifact.to_path_buf(),
        }
    }

    /// `com.example.Plugin` -> `com/example/Plugin.class`
    pub fn entry_path(&self) -> String {
        self.class_name.replace('.', "/") + CLASS_SUFFIX
    }
}

/// How sure the static scan is about the literal it found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Every string load in the accessor body yields the same literal.
    SinglePath,
    /// Distinct literals are loaded; the last one in instruction order was kept.
    LastSeen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "confidence")]
pub enum ResolutionMethod {
    Static(Confidence),
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedName {
    pub class_name: String,
    pub artifact: PathBuf,
    pub name: String,
    pub method: ResolutionMethod,
}

/// Why a strategy could not produce a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// No `getName()` returning `String` is declared by the class itself.
    MethodNotFound,
    /// The accessor exists but returns no string literal as is.
    NoLiteral,
    /// The only literal found is the empty string.
    EmptyLiteral,
}

impl std::fmt::Display for Unresolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Unresolved::MethodNotFound => "class declares no getName() returning String",
            Unresolved::NoLiteral => "getName() returns no string literal",
            Unresolved::EmptyLiteral => "getName() returns an empty literal",
        };
        f.write_str(text)
    }
}

/// Outcome of one strategy for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedName),
    Unresolved(Unresolved),
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSummary {
    pub path: PathBuf,
    pub has_descriptor: bool,
    pub candidates: usize,
    pub modular: bool,
}

/// A failure recorded instead of aborting the pass.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub artifact: PathBuf,
    pub class_name: Option<String>,
    pub message: String,
}

/// Everything a resolution pass produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    pub resolved: Vec<ResolvedName>,
    pub artifacts: Vec<ArtifactSummary>,
    pub failures: Vec<Failure>,
}

impl ResolutionReport {
    /// Resolved names in artifact-then-candidate order, duplicates kept.
    pub fn names(&self) -> Vec<String> {
        self.resolved.iter().map(|r| r.name.clone()).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
