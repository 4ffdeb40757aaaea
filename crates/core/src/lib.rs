//! Discovery and naming of javac plugins shipped inside dependency jars.
//!
//! A jar registers its plugins in `META-INF/services/com.sun.source.util.Plugin`.
//! For each listed class the declared name (the value `getName()` returns) is
//! recovered from the class file when it is a constant, and by running the
//! accessor in an isolated JVM otherwise. The resulting names are what a build
//! passes to javac as `-Xplugin:<name>`.

pub mod aggregator;
pub mod archive;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fallback;
pub mod inspector;
pub mod logging;
pub mod model;
pub mod strategy;
pub mod tracker;

pub use aggregator::PluginNameAggregator;
pub use config::{DescriptorMode, FailurePolicy, ScanConfig};
pub use error::{DiscoveryError, ErrorKind, Result};
pub use model::{Confidence, ResolutionMethod, ResolutionReport, ResolvedName};
pub use tracker::{ResourceKind, ResourceTracker};
