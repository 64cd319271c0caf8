//! Sequence input: FASTA records, or a previous alignment in aligned mode.

use crate::alignment::{is_gap_char, strip_gaps};
use crate::clustal::{is_clustal, parse_clustal};
use crate::error::{Error, Result};
use clio::Input;
use log::warn;
use needletail::errors::ParseError;
use needletail::{FastxReader, parse_fastx_file, parse_fastx_reader, parse_fastx_stdin};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;

/// Whether the input sequences already carry alignment gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentMode {
    #[default]
    Unaligned,
    /// Gap symbols are removed before the sequences are re-aligned.
    Aligned,
}

impl std::fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unaligned => write!(f, "unaligned"),
            Self::Aligned => write!(f, "aligned"),
        }
    }
}

impl std::str::FromStr for AlignmentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "unaligned" => Ok(Self::Unaligned),
            "aligned" => Ok(Self::Aligned),
            _ => Err(format!(
                "invalid alignment mode '{s}': must be 'unaligned' or 'aligned'"
            )),
        }
    }
}

/// Extracts the accession (first word) from a FASTA header.
pub fn get_record_accession_string(record_header: &[u8]) -> Option<String> {
    let accession = record_header
        .split(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\x0C' | b'\r'))
        .next();
    match accession {
        Some(acc) if !acc.is_empty() => Some(String::from_utf8_lossy(acc).into_owned()),
        _ => None,
    }
}

/// Parsed sequence data from the input file.
pub struct SequenceData {
    pub names: Vec<String>,
    pub sequences: Vec<Vec<u8>>,
}

/// Reads the input and returns upper-cased sequences ready for alignment.
///
/// Unaligned input is FASTA. Aligned input may be FASTA or CLUSTAL, detected
/// by its header line; its gap symbols are removed.
pub fn parse_input(input: &Input, mode: AlignmentMode) -> Result<SequenceData> {
    let records = match mode {
        AlignmentMode::Unaligned => read_fastx(open_fastx(input)?)?,
        AlignmentMode::Aligned => read_alignment(read_input(input)?)?,
    };
    collect_sequences(records, mode)
}

fn fasta_error(e: ParseError) -> Error {
    Error::FastaParse(e.to_string())
}

fn open_fastx(input: &Input) -> Result<Box<dyn FastxReader>> {
    let reader = if input.is_std() {
        parse_fastx_stdin()
    } else {
        if input.is_empty().unwrap_or(false) {
            return Err(Error::EmptyInput);
        }
        parse_fastx_file(input.path().to_path_buf())
    };

    reader.map_err(fasta_error)
}

fn read_input(input: &Input) -> Result<Vec<u8>> {
    let mut text = Vec::new();
    let read = if input.is_std() {
        std::io::stdin().lock().read_to_end(&mut text)
    } else {
        File::open(input.path().to_path_buf()).and_then(|mut f| f.read_to_end(&mut text))
    };

    read.map_err(|e| Error::ReadInput {
        path: if input.is_std() {
            PathBuf::from("<stdin>")
        } else {
            input.path().to_path_buf()
        },
        source: e,
    })?;
    Ok(text)
}

/// Splits a previous alignment into named gapped rows.
fn read_alignment(text: Vec<u8>) -> Result<Vec<(String, Vec<u8>)>> {
    if text.trim_ascii().is_empty() {
        return Err(Error::EmptyInput);
    }
    if is_clustal(&text) {
        return parse_clustal(&text);
    }

    read_fastx(parse_fastx_reader(Cursor::new(text)).map_err(fasta_error)?)
}

fn read_fastx(mut reader: Box<dyn FastxReader>) -> Result<Vec<(String, Vec<u8>)>> {
    let mut records = Vec::new();

    while let Some(record) = reader.next() {
        let record = record.map_err(fasta_error)?;
        let name = get_record_accession_string(record.id())
            .unwrap_or_else(|| format!("seq{}", records.len() + 1));
        records.push((name, record.seq().to_vec()));
    }

    Ok(records)
}

fn collect_sequences(records: Vec<(String, Vec<u8>)>, mode: AlignmentMode) -> Result<SequenceData> {
    let mut names = Vec::with_capacity(records.len());
    let mut sequences = Vec::with_capacity(records.len());

    for (name, mut sequence_bytes) in records {
        sequence_bytes.retain(|&b| !b.is_ascii_whitespace());
        sequence_bytes.make_ascii_uppercase();

        match mode {
            AlignmentMode::Aligned => {
                sequence_bytes = strip_gaps(&sequence_bytes);
                if sequence_bytes.is_empty() {
                    warn!("Sequence '{name}' contains only gaps");
                }
            }
            AlignmentMode::Unaligned => {
                if sequence_bytes.iter().any(|&b| is_gap_char(b)) {
                    return Err(Error::InvalidInput(format!(
                        "sequence '{name}' contains gap symbols; use the 'aligned' mode to remove them"
                    )));
                }
            }
        }

        names.push(name);
        sequences.push(sequence_bytes);
    }

    if sequences.is_empty() {
        return Err(Error::EmptyInput);
    }

    Ok(SequenceData { names, sequences })
}
