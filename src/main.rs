// src/main.rs
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fast_q5::config::{effective_threads, validate_date};
use fast_q5::output::write_results;
use fast_q5::{JoinStrategy, LoadOptions, ParsePolicy, PartitionErrorPolicy, QueryParams};

#[derive(Debug, Parser)]
#[command(name = "fast_q5")]
#[command(about = "TPC-H Query 5: local supplier revenue per nation of a region")]
struct Args {
    /// Region name, e.g. ASIA
    #[arg(long = "r_name")]
    r_name: String,

    /// First order date included, YYYY-MM-DD
    #[arg(long = "start_date", value_parser = validate_date)]
    start_date: String,

    /// First order date excluded, YYYY-MM-DD
    #[arg(long = "end_date", value_parser = validate_date)]
    end_date: String,

    /// Worker threads, capped to the available parallelism
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    threads: u32,

    /// Directory holding the .tbl files
    #[arg(long = "table_path")]
    table_path: PathBuf,

    /// Directory the result file is written to
    #[arg(long = "result_path")]
    result_path: PathBuf,

    /// Join implementation
    #[arg(long, value_enum, default_value_t = JoinStrategy::Dense)]
    join: JoinStrategy,

    /// Reject malformed lineitem rows instead of parsing them best-effort
    #[arg(long)]
    strict_parse: bool,

    /// Keep going when a load task cannot reopen lineitem.tbl (its rows are lost)
    #[arg(long)]
    skip_failed_partitions: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let threads = effective_threads(args.threads as usize);
    if threads != args.threads as usize {
        tracing::info!(requested = args.threads, threads, "capped thread count");
    }
    let query = QueryParams::new(args.r_name, args.start_date, args.end_date);
    let options = LoadOptions {
        parse: if args.strict_parse {
            ParsePolicy::Strict
        } else {
            ParsePolicy::Lenient
        },
        on_partition_error: if args.skip_failed_partitions {
            PartitionErrorPolicy::Skip
        } else {
            PartitionErrorPolicy::Fail
        },
    };

    let results = fast_q5::run(&query, &args.table_path, threads, options, args.join)
        .context("failed to execute TPC-H Query 5")?;
    let path = write_results(&args.result_path, &results).context("failed to output results")?;

    println!("TPC-H Query 5 implementation completed: {}", path.display());
    Ok(())
}
