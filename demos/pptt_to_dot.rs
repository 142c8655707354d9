use acpi_perf_topology::pptt::Pptt;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;

/// Writes the processor and cache topology of a PPTT dump as a Graphviz DOT
/// file. Render it with e.g. `dot -Tsvg pptt_topology.dot -o pptt_topology.svg`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// PPTT file, e.g. a copy of /sys/firmware/acpi/tables/PPTT.
    #[arg(default_value_t = String::from("PPTT.aml"))]
    file: String,

    /// Output file or '-' to use stdout.
    #[arg(short, long, default_value_t = String::from("pptt_topology.dot"))]
    output: String,

    /// Verbosity level for stderr logging.
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    stderrlog::new().verbosity(args.verbose as usize).init()?;

    let data = std::fs::read(&args.file).with_context(|| format!("Failed to read {}", args.file))?;
    let pptt = Pptt::parse(&data).with_context(|| format!("Failed to parse {}", args.file))?;
    log::info!(
        "{} nodes, {} labeled, {} edges",
        pptt.nodes.len(),
        pptt.graph.node_count(),
        pptt.graph.edges().len()
    );

    if args.output == "-" {
        pptt.graph.write_dot(std::io::stdout().lock())?;
    } else {
        let file = std::fs::File::create(&args.output)
            .with_context(|| format!("Failed to create {}", args.output))?;
        let mut writer = BufWriter::new(file);
        pptt.graph.write_dot(&mut writer)?;
        writer.flush()?;
        println!("PPTT topology is saved as '{}'", args.output);
    }
    Ok(())
}
