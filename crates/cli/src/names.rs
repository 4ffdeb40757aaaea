use clap::{Args, ValueEnum};
use plugscan_core::{
    DescriptorMode, DiscoveryError, FailurePolicy, PluginNameAggregator, ResolutionReport,
    ScanConfig,
};
use std::path::PathBuf;
use tracing::{info, warn};

const PLUGIN_FLAG: &str = "-Xplugin:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One name per line
    Plain,
    /// One `-Xplugin:<name>` javac argument per line
    Flags,
    /// The full resolution report
    Json,
}

#[derive(Debug, Args)]
pub struct NamesArgs {
    /// Jars to scan, in classpath order
    #[arg(value_name = "ARTIFACT", required = true)]
    pub artifacts: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// JSON settings file; flags below override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Record failures and keep going instead of stopping at the first one
    #[arg(long)]
    pub best_effort: bool,

    /// Never run plugin code; computed names become errors
    #[arg(long)]
    pub no_dynamic: bool,

    /// Scan jars concurrently (output order is unchanged)
    #[arg(long)]
    pub parallel: bool,

    /// Parse descriptors like java.util.ServiceLoader (comments, blank lines)
    #[arg(long)]
    pub lenient: bool,

    /// java launcher used for the dynamic fallback
    #[arg(long, value_name = "PATH")]
    pub java: Option<PathBuf>,

    /// Seconds allowed per dynamic resolution, 0 for no limit
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Also log to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl NamesArgs {
    pub fn to_config(&self) -> Result<ScanConfig, DiscoveryError> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::from_file(path)?,
            None => ScanConfig::default(),
        };
        if self.best_effort {
            config.failure_policy = FailurePolicy::BestEffort;
        }
        if self.no_dynamic {
            config.dynamic_fallback = false;
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.lenient {
            config.descriptor_mode = DescriptorMode::Lenient;
        }
        if let Some(java) = &self.java {
            config.java_executable = Some(java.clone());
        }
        if let Some(timeout) = self.timeout {
            config.fallback_timeout_secs = timeout;
        }
        Ok(config)
    }
}

pub fn render(report: &ResolutionReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    let mut out = match format {
        OutputFormat::Plain => report.names().join("\n"),
        OutputFormat::Flags => report
            .names()
            .iter()
            .map(|name| format!("{PLUGIN_FLAG}{name}"))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
    };
    if !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}

pub fn run(args: NamesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.to_config()?;
    info!("Scanning {} artifacts", args.artifacts.len());

    let aggregator = PluginNameAggregator::new(config);
    let report = aggregator.resolve(&args.artifacts)?;
    print!("{}", render(&report, args.format)?);

    if !report.is_clean() {
        for failure in &report.failures {
            warn!("{}: {}", failure.artifact.display(), failure.message);
        }
        return Err(format!("{} plugin(s) could not be resolved", report.failures.len()).into());
    }
    Ok(())
}
