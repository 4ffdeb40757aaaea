//! Ordered chain of name resolution strategies.
//!
//! Static inspection runs first; the dynamic resolver is only consulted when
//! every earlier strategy reported [`Resolution::Unresolved`]. Errors are not
//! fallen through: a missing class entry or a malformed class file ends the
//! chain immediately.

use crate::archive::ArchiveHandle;
use crate::error::{DiscoveryError, Result};
use crate::fallback::DynamicResolver;
use crate::inspector::{self, StaticOutcome};
use crate::model::{Candidate, Resolution, ResolutionMethod, ResolvedName, Unresolved};

pub trait NameStrategy: Send + Sync {
    fn label(&self) -> &'static str;

    fn resolve(&self, handle: &mut ArchiveHandle, candidate: &Candidate) -> Result<Resolution>;
}

/// Reads the candidate's class file and inspects it without loading it.
pub struct StaticStrategy;

impl NameStrategy for StaticStrategy {
    fn label(&self) -> &'static str {
        "static"
    }

    fn resolve(&self, handle: &mut ArchiveHandle, candidate: &Candidate) -> Result<Resolution> {
        let entry = candidate.entry_path();
        let bytes = handle.read_bytes(&entry)?;

        Ok(match inspector::inspect(&entry, bytes)? {
            StaticOutcome::Literal(literal) if literal.value.is_empty() => {
                Resolution::Unresolved(Unresolved::EmptyLiteral)
            }
            StaticOutcome::Literal(literal) => Resolution::Resolved(ResolvedName {
                class_name: candidate.class_name.clone(),
                artifact: candidate.artifact.clone(),
                name: literal.value,
                method: ResolutionMethod::Static(literal.confidence),
            }),
            StaticOutcome::NoLiteral => Resolution::Unresolved(Unresolved::NoLiteral),
            StaticOutcome::MethodNotFound => Resolution::Unresolved(Unresolved::MethodNotFound),
        })
    }
}

pub struct DynamicStrategy {
    resolver: DynamicResolver,
}

impl DynamicStrategy {
    pub fn new(resolver: DynamicResolver) -> Self {
        Self { resolver }
    }
}

impl NameStrategy for DynamicStrategy {
    fn label(&self) -> &'static str {
        "dynamic"
    }

    fn resolve(&self, _handle: &mut ArchiveHandle, candidate: &Candidate) -> Result<Resolution> {
        self.resolver.resolve(candidate).map(Resolution::Resolved)
    }
}

#[derive(Default)]
pub struct StrategyChain {
    strategies: Vec<Box<dyn NameStrategy>>,
}

impl StrategyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, strategy: impl NameStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.label()).collect()
    }

    /// Runs the strategies in order and returns the first name produced.
    pub fn resolve(&self, handle: &mut ArchiveHandle, candidate: &Candidate) -> Result<ResolvedName> {
        let mut last_reason = None;
        for strategy in &self.strategies {
            match strategy.resolve(handle, candidate)? {
                Resolution::Resolved(resolved) => return Ok(resolved),
                Resolution::Unresolved(reason) => {
                    tracing::debug!(
                        "{} strategy left {} unresolved: {}",
                        strategy.label(),
                        candidate.class_name,
                        reason
                    );
                    last_reason = Some(reason);
                }
            }
        }

        let reason = match last_reason {
            Some(reason) => format!("{reason} and no fallback is enabled"),
            None => "no resolution strategy configured".to_string(),
        };
        Err(DiscoveryError::dynamic(
            &candidate.class_name,
            &candidate.artifact,
            reason,
        ))
    }
}
