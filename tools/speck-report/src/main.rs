//! 体模标记统计的命令行工具.
//!
//! 读取一个 nii 扫描, 运行完整流水线, 输出测量表 (TSV), 可选地输出完整结果 (JSON)
//! 和焦平面叠加图 (PNG).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use ct_speck::dataset;
use ct_speck::{Pipeline, SpeckConfig, Volume};

mod report;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Parser)]
#[command(name = "speck-report")]
#[command(
    about = "Locate the six-speck marker group in a phantom scan and tabulate focal-plane intensities"
)]
#[command(version)]
struct Cli {
    /// Path to the input scan (.nii / .nii.gz).
    /// Defaults to $SPECK_PHANTOM or ~/dataset/phantom.nii.gz.
    input: Option<PathBuf>,

    /// JSON file with pipeline parameters. Missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of slices measured on each side of the focal slice.
    #[arg(long)]
    half_window: Option<usize>,

    /// Path to write the results table (TSV). Printed to stdout when omitted.
    #[arg(long)]
    tsv: Option<PathBuf>,

    /// Path to write the full report (JSON).
    #[arg(long)]
    json: Option<PathBuf>,

    /// Path to write the focal slice with measurement regions drawn (PNG).
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    fn input_path(&self) -> CliResult<PathBuf> {
        match &self.input {
            Some(p) => Ok(p.clone()),
            None => dataset::phantom_path_from_env_or_home().ok_or_else(|| {
                format!(
                    "no input given and neither ${} nor a home directory is available",
                    dataset::PHANTOM_ENV
                )
                .into()
            }),
        }
    }

    fn speck_config(&self) -> CliResult<SpeckConfig> {
        let mut config = match &self.config {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .map_err(|e| format!("failed to read config {}: {e}", p.display()))?;
                serde_json::from_str::<SpeckConfig>(&text)?
            }
            None => SpeckConfig::default(),
        };
        if let Some(nn) = self.half_window {
            config = config.with_half_window(nn);
        }
        Ok(config)
    }
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    simple_logger::SimpleLogger::new()
        .with_level(cli.log_level())
        .init()?;

    let input = cli.input_path()?;
    let config = cli.speck_config()?;
    log::info!("Loading scan: {}", input.display());
    let mut volume = Volume::open(&input)?;
    log::info!("Scan shape: {:?}, spacing: {:?}", volume.shape(), volume.spacing());

    let mut pipeline = Pipeline::new(config)?;
    let result = pipeline.run(&mut volume)?;

    report::describe_into(&result, &mut io::stderr())?;

    match &cli.tsv {
        Some(p) => {
            let mut w = BufWriter::new(File::create(p)?);
            result.analysis.write_report(&mut w)?;
            w.flush()?;
            log::info!("Results table written to {}", p.display());
        }
        None => result.analysis.write_report(io::stdout().lock())?,
    }

    if let Some(p) = &cli.json {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(p, json)?;
        log::info!("Report written to {}", p.display());
    }

    if let Some(p) = &cli.overlay {
        result.analysis.render_overlay(&volume).save(p)?;
        log::info!("Overlay written to {}", p.display());
    }
    Ok(())
}
