//! Report generation for progressive alignment runs.

use crate::alignment::AlignmentMetrics;
use crate::error::{Error, Result};
use crate::tree::Merge;
use itertools::Itertools;
use markdown_tables::{MarkdownTableRow, as_table};
use std::io::{BufWriter, Write};
use std::path::Path;

struct RunOption {
    option: String,
    value: String,
}

impl MarkdownTableRow for RunOption {
    fn column_names() -> Vec<&'static str> {
        vec!["Option", "Value"]
    }

    fn column_values(&self) -> Vec<String> {
        vec![self.option.clone(), self.value.clone()]
    }
}

struct Statistic {
    metric: &'static str,
    value: usize,
}

impl MarkdownTableRow for Statistic {
    fn column_names() -> Vec<&'static str> {
        vec!["Metric", "Value"]
    }

    fn column_values(&self) -> Vec<String> {
        vec![self.metric.to_string(), self.value.to_string()]
    }
}

struct MergeRecord {
    step: usize,
    left: String,
    right: String,
    distance: f64,
    size: usize,
}

impl MarkdownTableRow for MergeRecord {
    fn column_names() -> Vec<&'static str> {
        vec!["Step", "Left cluster", "Right cluster", "Distance", "Height", "Size"]
    }

    fn column_values(&self) -> Vec<String> {
        vec![
            self.step.to_string(),
            self.left.clone(),
            self.right.clone(),
            format!("{:.4}", self.distance),
            format!("{:.4}", self.distance / 2.0),
            self.size.to_string(),
        ]
    }
}

/// Run options echoed in the report.
#[derive(Debug)]
pub struct ReportConfig {
    pub input_path: String,
    pub output_path: String,
    pub options: Vec<(&'static str, String)>,
}

/// Data for generating a report.
pub struct ReportData<'a> {
    pub metrics: &'a AlignmentMetrics,
    pub merges: &'a [Merge],
    pub names: &'a [String],
}

macro_rules! write_err {
    ($path:expr) => {
        |e| Error::ReportWrite {
            path: $path.to_path_buf(),
            source: e,
        }
    };
}

/// Writes a Markdown report of the alignment run.
pub fn write_report(
    path: impl AsRef<Path>,
    config: &ReportConfig,
    data: &ReportData<'_>,
) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(write_err!(path))?;
    let mut writer = BufWriter::new(file);

    render_report(&mut writer, config, data).map_err(write_err!(path))?;
    writer.flush().map_err(write_err!(path))?;

    Ok(())
}

fn render_report(
    writer: &mut impl Write,
    config: &ReportConfig,
    data: &ReportData<'_>,
) -> std::io::Result<()> {
    writeln!(writer, "# Progressive Alignment Results\n")?;
    write_options_section(writer, config)?;
    write_statistics_section(writer, data.metrics)?;
    write_merges_section(writer, data.merges, data.names)
}

fn write_options_section(writer: &mut impl Write, config: &ReportConfig) -> std::io::Result<()> {
    writeln!(writer, "## Run options\n")?;

    let options: Vec<RunOption> = [
        ("Input file", config.input_path.clone()),
        ("Output file", config.output_path.clone()),
    ]
    .into_iter()
    .chain(config.options.iter().cloned())
    .map(|(option, value)| RunOption {
        option: option.to_string(),
        value,
    })
    .collect();

    writeln!(writer, "{}", as_table(&options))
}

fn write_statistics_section(
    writer: &mut impl Write,
    metrics: &AlignmentMetrics,
) -> std::io::Result<()> {
    writeln!(writer, "## Statistics\n")?;

    let statistics = vec![
        Statistic {
            metric: "Number of sequences",
            value: metrics.sequence_count,
        },
        Statistic {
            metric: "Alignment length",
            value: metrics.alignment_length,
        },
        Statistic {
            metric: "Conserved columns",
            value: metrics.conserved_columns,
        },
        Statistic {
            metric: "Ungapped columns",
            value: metrics.gap_free_columns,
        },
        Statistic {
            metric: "Gap symbols",
            value: metrics.gap_symbols,
        },
    ];

    writeln!(writer, "{}", as_table(&statistics))
}

fn write_merges_section(
    writer: &mut impl Write,
    merges: &[Merge],
    names: &[String],
) -> std::io::Result<()> {
    writeln!(writer, "## Guide tree merges\n")?;

    if merges.is_empty() {
        return writeln!(writer, "A single sequence was aligned; no clusters were merged.");
    }

    let label = |leaves: &[usize]| {
        leaves
            .iter()
            .map(|&idx| names.get(idx).map_or_else(|| idx.to_string(), Clone::clone))
            .join(", ")
    };
    let records: Vec<MergeRecord> = merges
        .iter()
        .enumerate()
        .map(|(i, merge)| MergeRecord {
            step: i + 1,
            left: label(&merge.left),
            right: label(&merge.right),
            distance: merge.distance,
            size: merge.size,
        })
        .collect();

    writeln!(writer, "{}", as_table(&records))
}
