mod names;

use clap::{Parser, Subcommand};

pub use names::{NamesArgs, OutputFormat};

#[derive(Parser)]
#[command(
    name = "plugscan",
    version,
    about = "Discovers javac plugins in dependency jars and resolves their names",
    long_about = "plugscan reads the com.sun.source.util.Plugin service descriptor of each jar, \
                  recovers the name every listed plugin declares through getName() and prints \
                  the names, ready to be passed to javac as -Xplugin:<name>."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the declared names of all plugins in the given jars
    #[command(
        long_about = "Resolves plugin names from the class files where possible and by running \
                            getName() in a child JVM otherwise. Jars are processed in the order \
                            given and the output keeps that order."
    )]
    Names(NamesArgs),
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Names(args) => args.verbose,
    };
    let _guard = plugscan_core::logging::init_logging("cli", verbose);

    match cli.command {
        Commands::Names(args) => names::run(args),
    }
}
