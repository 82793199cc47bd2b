use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use molecule_descriptors::*;
use tracing::*;

/// Compute molecular descriptors for every row of a CSV file.
#[derive(Parser)]
#[command(name = "descriptors", version, about)]
struct Cli {
    /// Input CSV file with a header row
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Name of the column holding molecules
    #[arg(short, long, value_name = "NAME")]
    column: String,

    /// How molecules are written in that column
    #[arg(long, value_name = "TYPE", default_value = "smiles")]
    column_type: ColumnType,

    /// Output CSV file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Natural-product model, `<fragment id> <score>` per line; without it NP_Score is empty
    #[arg(long, value_name = "FILE")]
    np_model: Option<PathBuf>,

    /// Synthetic-accessibility model, `<score> <fragment id>...` per line; without it SA_score is empty
    #[arg(long, value_name = "FILE")]
    sa_model: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Suppress the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColumnType {
    Smiles,
    Sdf,
}

impl ColumnType {
    fn data_type(self) -> DataType {
        match self {
            ColumnType::Smiles => DataType::logical("smiles"),
            ColumnType::Sdf => DataType::logical("sdf"),
        }
    }
}

/// Progress bar over the rows of the input table.
struct BarContext {
    bar: ProgressBar,
}

impl BarContext {
    fn new(rows: usize, quiet: bool) -> Result<Self> {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(rows as u64)
        };
        bar.set_style(
            ProgressStyle::with_template("  {spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} rows ({eta})")
                .context("invalid progress template")?
                .progress_chars("=> "),
        );
        Ok(Self { bar })
    }
}

impl ExecutionContext for BarContext {
    fn set_progress(&mut self, fraction: f64) {
        let rows = self.bar.length().unwrap_or(0) as f64;
        self.bar.set_position((fraction * rows).round() as u64);
    }
}

fn model_handle<M: scoring::ScoringModel + Default>(path: Option<PathBuf>) -> Arc<ModelHandle<M>> {
    Arc::new(match path {
        Some(path) => ModelHandle::from_file(path),
        None => {
            warn!("No model file given, its score column will be empty");
            ModelHandle::preloaded(M::default())
        }
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let types = HashMap::from([(cli.column.clone(), cli.column_type.data_type())]);
    let file = File::open(&cli.input).with_context(|| format!("failed to open {}", cli.input.display()))?;
    let input = Table::read_csv(BufReader::new(file), &types)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    info!("Read {} rows from {}", input.row_count(), cli.input.display());

    let calculator = DescriptorCalculator::new(model_handle(cli.np_model), model_handle(cli.sa_model));
    let node = DescriptorNode::new(NodeSettings::new(cli.column.as_str()), calculator);

    let mut context = BarContext::new(input.row_count(), cli.quiet)?;
    let output = node.execute(&input, &mut context).context("descriptor calculation failed")?;
    context.bar.finish_and_clear();

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    output.write_csv(writer).context("failed to write output")?;
    Ok(())
}
