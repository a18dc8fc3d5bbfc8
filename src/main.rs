// Command-line entry point for soaap-graph.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use soaap_graph::application::{self, GraphUsecase, STDIN};
use soaap_graph::domain::analysis::Analysis;
use soaap_graph::logging::init_logging;
use soaap_graph::ports::{DotExporter, JsonExporter, OutputExporter};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a JSON report and write its binary cache
    Parse {
        /// Report file, or "-" for stdin
        input: PathBuf,

        /// Cache file (default: <input>.bin; required for stdin)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build a merged call graph from a report or cache
    Graph {
        /// Report file, cache file (*.bin), or "-" for stdin
        input: PathBuf,

        /// Output file, or "-" for stdout
        #[arg(short, long, default_value = STDIN)]
        output: PathBuf,

        /// Analysis to extract (repeatable; see `analyses`)
        #[arg(short, long = "analysis", default_value = "vuln")]
        analyses: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Dot)]
        format: Format,

        /// Reuse (or create) a cache next to the report
        #[arg(long)]
        cache: bool,
    },

    /// List the analyses a graph can be extracted for
    Analyses,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Dot,
    Json,
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == STDIN {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file = File::create(path)
        .with_context(|| format!("Cannot create output file {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Parse { input, output } => {
            let output = match output {
                Some(path) => path,
                None => application::default_cache_path(&input)
                    .context("--output is required when the report is read from stdin")?,
            };

            let results = application::convert_report(&input, &output)
                .with_context(|| format!("Failed to convert {}", input.display()))?;

            info!(
                "Loaded {} past-vulnerability warnings, {} private data accesses, {} call graph traces",
                results.vulnerabilities.len(),
                results.private_accesses.len(),
                results.traces.len()
            );
            info!("Cache written to {}", output.display());
        }

        Command::Graph {
            input,
            output,
            analyses,
            format,
            cache,
        } => {
            let analyses = analyses
                .iter()
                .map(|name| name.parse::<Analysis>())
                .collect::<Result<Vec<_>, _>>()?;

            let results = application::load_results(&input, cache)
                .with_context(|| format!("Failed to load {}", input.display()))?;

            let exporter: &dyn OutputExporter = match format {
                Format::Dot => &DotExporter,
                Format::Json => &JsonExporter,
            };
            let usecase = GraphUsecase { exporter };

            let mut out = open_output(&output)?;
            let summary = usecase.run(&results, &analyses, &mut *out)?;
            info!(
                "Graph written to {} ({} nodes, {} calls)",
                output.display(),
                summary.nodes,
                summary.calls
            );
        }

        Command::Analyses => {
            for analysis in Analysis::ALL {
                println!("{:<12} {}", analysis.name(), analysis.description());
            }
        }
    }

    Ok(())
}
