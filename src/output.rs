//! Output utilities for writing alignments and guide trees.

use crate::alignment::is_conserved_column;
use crate::error::{Error, Result};
use crate::tree::GuideTree;
use itertools::Itertools;
use std::io::{BufWriter, Write};
use std::path::Path;

const FASTA_LINE_WIDTH: usize = 80;

/// Number of spaces between the longest name and the alignment block.
const NAME_PADDING: usize = 5;

/// Layout of the written alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Clustal,
    Fasta,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clustal => write!(f, "clustal"),
            Self::Fasta => write!(f, "fasta"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clustal" => Ok(Self::Clustal),
            "fasta" => Ok(Self::Fasta),
            _ => Err(format!(
                "invalid output format '{s}': must be 'clustal' or 'fasta'"
            )),
        }
    }
}

/// Writes aligned rows in CLUSTAL-like blocks of `line_width` columns.
///
/// Each block lists every row under its name and ends with a conservation
/// line marking columns where all rows carry the same residue with `*`.
pub fn write_clustal<W: Write>(
    rows: &[Vec<u8>],
    names: &[&str],
    output: &mut W,
    line_width: usize,
) -> Result<()> {
    writeln!(output, "CLUSTAL multiple sequence alignment\n")?;
    if rows.is_empty() {
        return Ok(());
    }

    let label_width = names.iter().map(|n| n.len()).max().unwrap_or(0) + NAME_PADDING;
    let alignment_length = rows.iter().map(Vec::len).max().unwrap_or(0);
    let conservation: Vec<u8> = (0..alignment_length)
        .map(|col| {
            if is_conserved_column(rows, col) {
                b'*'
            } else {
                b' '
            }
        })
        .collect();

    for start in (0..alignment_length).step_by(line_width.max(1)) {
        let end = (start + line_width.max(1)).min(alignment_length);
        for (name, row) in names.iter().zip_eq(rows) {
            writeln!(
                output,
                "{name:<label_width$}{}",
                String::from_utf8_lossy(&row[start..end])
            )?;
        }
        writeln!(
            output,
            "{:<label_width$}{}\n",
            "",
            String::from_utf8_lossy(&conservation[start..end])
        )?;
    }

    Ok(())
}

/// Writes sequences in FASTA format to the given output.
pub fn write_fasta<W: Write>(sequences: &[Vec<u8>], names: &[&str], output: &mut W) -> Result<()> {
    for (name, seq) in names.iter().zip_eq(sequences) {
        writeln!(output, ">{name}")?;
        for chunk in seq.chunks(FASTA_LINE_WIDTH) {
            writeln!(output, "{}", String::from_utf8_lossy(chunk))?;
        }
    }

    Ok(())
}

/// Writes the guide tree in Newick format to a file.
pub fn write_tree(path: impl AsRef<Path>, tree: &GuideTree, names: &[String]) -> Result<()> {
    let path = path.as_ref();
    let tree_err = |e| Error::TreeWrite {
        path: path.to_path_buf(),
        source: e,
    };
    let file = std::fs::File::create(path).map_err(tree_err)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", tree.to_newick(names)).map_err(tree_err)?;
    writer.flush().map_err(tree_err)?;

    Ok(())
}
