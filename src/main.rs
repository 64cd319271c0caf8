mod alignment;
mod clustal;
mod distance;
mod error;
mod fasta;
mod msa;
mod output;
mod pairwise;
mod profile;
mod report;
mod scoring;
mod tree;

use crate::alignment::AlignmentMetrics;
use crate::error::{Error, Result};
use crate::fasta::{AlignmentMode, parse_input};
use crate::msa::progressive_alignment;
use crate::output::{OutputFormat, write_clustal, write_fasta, write_tree};
use crate::report::{ReportConfig, ReportData, write_report};
use crate::scoring::{ColumnScoring, GapModel, MatchScores, Molecule, Scoring};
use clap::{
    CommandFactory, Parser,
    builder::styling::{AnsiColor, Style, Styles},
};
use clio::{Input, Output};
use env_logger::Builder;
use log::{LevelFilter, info};
use std::io::{IsTerminal, Write};
use std::process::ExitCode;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Cyan.on_default().bold())
    .usage(AnsiColor::Yellow.on_default().bold())
    .literal(AnsiColor::Yellow.on_default().bold())
    .placeholder(Style::new().dimmed());

fn parse_score(s: &str) -> std::result::Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("`{s}` isn't a number"))?;
    if v < 0.0 || !v.is_finite() {
        Err("value must be a non-negative number".to_string())
    } else {
        Ok(v)
    }
}

fn parse_line_width(s: &str) -> std::result::Result<usize, String> {
    match s.parse() {
        Ok(0) | Err(_) => Err(format!("`{s}` is not a valid line width")),
        Ok(v) => Ok(v),
    }
}

#[derive(Parser)]
#[command(version, about, styles = STYLES, max_term_width = 88)]
struct Cli {
    /// Input sequences: FASTA, or FASTA/CLUSTAL in aligned mode
    #[arg(default_value = "-")]
    input: Input,

    /// Output alignment file
    #[arg(default_value = "-")]
    output: Output,

    /// Whether the input is unaligned or a previous alignment whose gaps are removed
    #[arg(short = 'a', long, default_value = "unaligned", value_parser = clap::value_parser!(AlignmentMode))]
    alignment_mode: AlignmentMode,

    /// Sequence type: DNA or protein (selects the weight table)
    #[arg(short = 'm', long, default_value = "DNA", value_parser = clap::value_parser!(Molecule))]
    molecule: Molecule,

    /// Profile column scoring: table (mean weight-table score) or counts (match/mismatch/gap counts)
    #[arg(short = 'c', long, default_value = "table", value_parser = clap::value_parser!(ColumnScoring))]
    column_scoring: ColumnScoring,

    /// Score for matching symbols
    #[arg(long = "match", default_value = "1", value_parser = parse_score)]
    match_score: f64,

    /// Penalty for mismatching symbols
    #[arg(long, default_value = "1", value_parser = parse_score)]
    mismatch: f64,

    /// Penalty for opening a gap
    #[arg(long, default_value = "1", value_parser = parse_score)]
    gap_open: f64,

    /// Penalty for extending a gap (omit for a linear gap penalty)
    #[arg(long, value_parser = parse_score)]
    gap_extension: Option<f64>,

    /// Output format: clustal or fasta
    #[arg(short = 'f', long, default_value = "clustal", value_parser = clap::value_parser!(OutputFormat))]
    format: OutputFormat,

    /// Number of alignment columns per block in CLUSTAL output
    #[arg(short = 'w', long, default_value = "60", value_parser = parse_line_width)]
    line_width: usize,

    /// Write the guide tree in Newick format to this file
    #[arg(long)]
    tree: Option<String>,

    /// Report file path
    #[arg(short = 'r', long)]
    report: Option<String>,

    /// Verbosity level (-v for normal logging, -vv for detailed logging)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

impl Cli {
    fn gap_model(&self) -> GapModel {
        match self.gap_extension {
            Some(extend) => GapModel::Affine {
                open: self.gap_open,
                extend,
            },
            None => GapModel::Linear { gap: self.gap_open },
        }
    }

    fn report_options(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Alignment mode", self.alignment_mode.to_string()),
            ("Molecule", self.molecule.to_string()),
            ("Column scoring", self.column_scoring.to_string()),
            ("Match score", self.match_score.to_string()),
            ("Mismatch penalty", self.mismatch.to_string()),
            ("Gap opening penalty", self.gap_open.to_string()),
            (
                "Gap extension penalty",
                self.gap_extension
                    .map_or_else(|| "linear".to_string(), |v| v.to_string()),
            ),
            ("Output format", self.format.to_string()),
        ]
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{}] {}", buf.timestamp(), record.args()))
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    if cli.input.is_std() && std::io::stdin().is_terminal() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let sequence_data = match parse_input(&cli.input, cli.alignment_mode) {
        Ok(data) => data,
        Err(Error::EmptyInput) if cli.input.is_std() => {
            Cli::command().print_help()?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    info!(
        "Loaded {} sequences (mode: {}, molecule: {})",
        sequence_data.sequences.len(),
        cli.alignment_mode,
        cli.molecule
    );

    let gaps = cli.gap_model();
    let scores = MatchScores::new(cli.match_score, cli.mismatch);
    let scoring = Scoring::new(cli.molecule, cli.column_scoring, scores, &gaps);

    info!("Aligning (column scoring: {}, gaps: {:?})", cli.column_scoring, gaps);
    let alignment = progressive_alignment(&sequence_data.sequences, &scoring, &gaps)?;

    let metrics = AlignmentMetrics::from_rows(&alignment.rows);
    info!(
        "Alignment completed (sequences: {}, length: {}, conserved columns: {})",
        metrics.sequence_count, metrics.alignment_length, metrics.conserved_columns
    );

    let names: Vec<&str> = alignment
        .order
        .iter()
        .map(|&idx| sequence_data.names[idx].as_str())
        .collect();

    let mut output = cli.output.clone();
    let output_name = if output.is_std() {
        "stdout".to_string()
    } else {
        output.path().to_string_lossy().into_owned()
    };

    match cli.format {
        OutputFormat::Clustal => {
            write_clustal(&alignment.rows, &names, &mut output, cli.line_width)?;
        }
        OutputFormat::Fasta => write_fasta(&alignment.rows, &names, &mut output)?,
    }
    info!("Output written to {}", output_name);

    if let Some(ref tree_path) = cli.tree {
        write_tree(tree_path, &alignment.tree, &sequence_data.names)?;
        info!("Guide tree written to {}", tree_path);
    }

    if let Some(ref report_path) = cli.report {
        let input_path = if cli.input.is_std() {
            "<stdin>".to_string()
        } else {
            cli.input.path().to_string_lossy().to_string()
        };

        let output_path = if cli.output.is_std() {
            "<stdout>".to_string()
        } else {
            cli.output.path().to_string_lossy().to_string()
        };

        let config = ReportConfig {
            input_path,
            output_path,
            options: cli.report_options(),
        };

        let data = ReportData {
            metrics: &metrics,
            merges: &alignment.merges,
            names: &sequence_data.names,
        };

        write_report(report_path, &config, &data)?;
        info!("Report written to {}", report_path);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbosity);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn gap_model_from_flags() {
        let cli = Cli::parse_from(["progalign-rs", "--gap-open", "2", "--gap-extension", "0.5"]);
        assert_eq!(
            cli.gap_model(),
            GapModel::Affine {
                open: 2.0,
                extend: 0.5
            }
        );

        let cli = Cli::parse_from(["progalign-rs", "--gap-open", "3"]);
        assert_eq!(cli.gap_model(), GapModel::Linear { gap: 3.0 });
    }

    #[test]
    fn rejects_negative_penalties() {
        assert!(Cli::try_parse_from(["progalign-rs", "--mismatch", "-1"]).is_err());
        assert!(Cli::try_parse_from(["progalign-rs", "--line-width", "0"]).is_err());
    }
}
