//! Resolves the declared names of every javac plugin found in a set of artifacts.
//!
//! For each artifact, in the order given:
//! 1. Open it and look up the plugin service descriptor
//! 2. Resolve each listed class through the [`StrategyChain`]
//! 3. Append the names, keeping artifact-then-candidate order
//!
//! Artifacts without a descriptor contribute nothing and are not an error.

use crate::archive::ArchiveHandle;
use crate::config::{FailurePolicy, ScanConfig};
use crate::descriptor::{find_descriptor, parse_candidates};
use crate::error::Result;
use crate::fallback::{ClassRunner, DynamicResolver, JvmRunner};
use crate::model::{ArtifactSummary, Candidate, Failure, ResolutionReport, ResolvedName};
use crate::strategy::{DynamicStrategy, StaticStrategy, StrategyChain};
use crate::tracker::ResourceTracker;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PluginNameAggregator {
    config: ScanConfig,
    chain: StrategyChain,
    tracker: ResourceTracker,
}

#[derive(Default)]
struct ArtifactOutcome {
    summary: Option<ArtifactSummary>,
    resolved: Vec<ResolvedName>,
    failures: Vec<Failure>,
}

impl PluginNameAggregator {
    /// Aggregator whose dynamic fallback runs candidates in a child JVM.
    pub fn new(config: ScanConfig) -> Self {
        let tracker = ResourceTracker::new();
        let runner = Arc::new(JvmRunner::from_config(&config, tracker.clone()));
        Self::with_runner(config, runner, tracker)
    }

    pub fn with_runner(
        config: ScanConfig,
        runner: Arc<dyn ClassRunner>,
        tracker: ResourceTracker,
    ) -> Self {
        let mut chain = StrategyChain::new().with(StaticStrategy);
        if config.dynamic_fallback {
            chain = chain.with(DynamicStrategy::new(DynamicResolver::new(runner)));
        }
        Self {
            config,
            chain,
            tracker,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Convenience wrapper returning only the ordered name list.
    pub fn resolve_names(&self, artifacts: &[PathBuf]) -> Result<Vec<String>> {
        Ok(self.resolve(artifacts)?.names())
    }

    pub fn resolve(&self, artifacts: &[PathBuf]) -> Result<ResolutionReport> {
        let start = std::time::Instant::now();
        debug!(
            "Resolving plugin names in {} artifacts with strategies {:?}",
            artifacts.len(),
            self.chain.labels()
        );

        let mut report = ResolutionReport::default();
        if self.config.parallel {
            let outcomes: Vec<_> = artifacts
                .par_iter()
                .map(|artifact| self.resolve_artifact(artifact))
                .collect();
            for (artifact, outcome) in artifacts.iter().zip(outcomes) {
                self.merge(&mut report, artifact, outcome)?;
            }
        } else {
            for artifact in artifacts {
                let outcome = self.resolve_artifact(artifact);
                self.merge(&mut report, artifact, outcome)?;
            }
        }

        info!(
            "Plugin name resolution complete: {} artifacts, {} names, {} failures in {:?}",
            artifacts.len(),
            report.resolved.len(),
            report.failures.len(),
            start.elapsed()
        );
        Ok(report)
    }

    fn merge(
        &self,
        report: &mut ResolutionReport,
        artifact: &Path,
        outcome: Result<ArtifactOutcome>,
    ) -> Result<()> {
        match outcome {
            Ok(outcome) => {
                report.artifacts.extend(outcome.summary);
                report.resolved.extend(outcome.resolved);
                report.failures.extend(outcome.failures);
                Ok(())
            }
            Err(e) if self.best_effort() => {
                warn!("Skipping artifact {}: {}", artifact.display(), e);
                report.failures.push(Failure {
                    artifact: artifact.to_path_buf(),
                    class_name: None,
                    message: e.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn best_effort(&self) -> bool {
        self.config.failure_policy == FailurePolicy::BestEffort
    }

    fn resolve_artifact(&self, artifact: &Path) -> Result<ArtifactOutcome> {
        ArchiveHandle::scoped(artifact, &self.tracker, |handle| {
            let modular = handle.has_module_descriptor();
            let Some(descriptor) = find_descriptor(handle) else {
                debug!("No plugin descriptor in {}", artifact.display());
                return Ok(ArtifactOutcome {
                    summary: Some(ArtifactSummary {
                        path: artifact.to_path_buf(),
                        has_descriptor: false,
                        candidates: 0,
                        modular,
                    }),
                    ..Default::default()
                });
            };

            let class_names = parse_candidates(handle, descriptor, self.config.descriptor_mode)?;
            let mut outcome = ArtifactOutcome {
                summary: Some(ArtifactSummary {
                    path: artifact.to_path_buf(),
                    has_descriptor: true,
                    candidates: class_names.len(),
                    modular,
                }),
                ..Default::default()
            };

            for class_name in class_names {
                let candidate = Candidate::new(class_name, artifact);
                match self.chain.resolve(handle, &candidate) {
                    Ok(resolved) => {
                        debug!(
                            "{} -> {:?} ({:?})",
                            candidate.class_name, resolved.name, resolved.method
                        );
                        outcome.resolved.push(resolved);
                    }
                    Err(e) if self.best_effort() => {
                        warn!("Failed to resolve {}: {}", candidate.class_name, e);
                        outcome.failures.push(Failure {
                            artifact: artifact.to_path_buf(),
                            class_name: Some(candidate.class_name),
                            message: e.to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(outcome)
        })
    }
}
