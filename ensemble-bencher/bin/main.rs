use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ensemble_bencher::bench_result::RunMetrics;
use ensemble_bencher::config::BenchConfig;
use ensemble_bencher::errors::Result;
use ensemble_bencher::logging::init_logging;
use ensemble_bencher::runner::BenchRunner;

fn main() -> ExitCode {
    let args = Args::parse();
    println!("args: {:?}\n", args);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Benchmark failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    init_logging(&config.log_level)?;

    let runner = BenchRunner::new(config)?;
    let (frame, metrics) = runner.run()?;
    print_metrics(&metrics);
    println!("Combined frame shape: {:?}", frame.shape());

    Ok(())
}

fn load_config(args: &Args) -> Result<BenchConfig> {
    let mut config = match &args.config {
        Some(path) => BenchConfig::parse_toml(path)?,
        None => BenchConfig::default(),
    };
    if let Some(v) = args.ensembles {
        config.ensembles = v;
    }
    if let Some(v) = args.parameters {
        config.parameters = v;
    }
    if let Some(v) = &args.work_dir {
        config.work_dir = v.clone();
    }
    if let Some(v) = args.write_workers {
        config.write_workers = v;
    }
    if args.keep_files {
        config.cleanup = false;
    }
    Ok(config)
}

fn print_metrics(metrics: &RunMetrics) {
    println!(
        "Writing to {} files where each contains {} numbers takes: {:?}",
        metrics.write.num_shards, metrics.write.num_values, metrics.write.elapsed_time
    );
    println!(
        "Combining {} files containing {} numbers each into one data frame takes: {:?}",
        metrics.read.num_columns, metrics.read.num_rows, metrics.read.elapsed_time
    );
    println!("metrics: {:?}\n", metrics);
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The bench config file, uses default config if not set.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of ensembles (shard files) to write.
    #[arg(short = 'n', long)]
    ensembles: Option<usize>,
    /// Number of parameters in each shard.
    #[arg(short, long)]
    parameters: Option<usize>,
    /// Directory to write shard files.
    #[arg(short, long)]
    work_dir: Option<PathBuf>,
    /// Worker number to write shards, 0 for all cores.
    #[arg(long)]
    write_workers: Option<usize>,
    /// Keep shard files after the run.
    #[arg(long)]
    keep_files: bool,
}
