//! Name resolution by running the accessor.
//!
//! Used only when the class file does not give the name away. Every call gets
//! a fresh execution context whose class path is exactly the owning artifact;
//! nothing is cached between candidates.

mod jvm;

pub use jvm::{JvmRunner, locate_java};

use crate::error::{DiscoveryError, Result};
use crate::model::{Candidate, ResolutionMethod, ResolvedName};
use std::path::Path;
use std::sync::Arc;

/// Executes `getName()` on a freshly constructed instance of a class.
pub trait ClassRunner: Send + Sync {
    /// Loads `class_name` with `artifact` as the only class path entry,
    /// default-constructs it and returns what `getName()` produced.
    fn invoke_name(&self, artifact: &Path, class_name: &str) -> Result<String>;
}

pub struct DynamicResolver {
    runner: Arc<dyn ClassRunner>,
}

impl DynamicResolver {
    pub fn new(runner: Arc<dyn ClassRunner>) -> Self {
        Self { runner }
    }

    pub fn resolve(&self, candidate: &Candidate) -> Result<ResolvedName> {
        tracing::debug!(
            "Running {} from {} to obtain its name",
            candidate.class_name,
            candidate.artifact.display()
        );
        let name = self
            .runner
            .invoke_name(&candidate.artifact, &candidate.class_name)?;
        if name.is_empty() {
            return Err(DiscoveryError::dynamic(
                &candidate.class_name,
                &candidate.artifact,
                "getName() returned an empty string",
            ));
        }
        Ok(ResolvedName {
            class_name: candidate.class_name.clone(),
            artifact: candidate.artifact.clone(),
            name,
            method: ResolutionMethod::Dynamic,
        })
    }
}
