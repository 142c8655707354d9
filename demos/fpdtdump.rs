use acpi_perf_topology::fpdt::Fpdt;
use anyhow::{Context, Result};
use clap::Parser;
use serde::{Serialize, Serializer};

/// Prints the performance records of an FPDT dump.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// FPDT file, e.g. a copy of /sys/firmware/acpi/tables/FPDT.
    #[arg(default_value_t = String::from("fpdt.dat"))]
    file: String,

    /// Print the records as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Verbosity level for stderr logging.
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn serialize_pointer_as_hex<S>(pointer: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match pointer {
        Some(pointer) => serializer.serialize_str(&format!("0x{pointer:x}")),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Serialize)]
struct RecordInfo {
    offset: usize,
    record_type: u16,
    name: &'static str,
    revision: u8,
    #[serde(serialize_with = "serialize_pointer_as_hex")]
    pointer: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    stderrlog::new().verbosity(args.verbose as usize).init()?;

    let data = std::fs::read(&args.file).with_context(|| format!("Failed to read {}", args.file))?;
    let fpdt = Fpdt::parse(&data).with_context(|| format!("Failed to parse {}", args.file))?;

    if args.json {
        let records: Vec<RecordInfo> = fpdt
            .records
            .iter()
            .map(|walked| RecordInfo {
                offset: walked.offset,
                record_type: walked.record.header.record_type.0,
                name: walked.record.record.name(),
                revision: walked.record.header.revision,
                pointer: walked.record.record.pointer(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for walked in &fpdt.records {
        println!("{}", walked.record.record);
    }
    Ok(())
}
