//! Fasta reading and writing for member sequences.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::{Error, Result};

/// Reads fasta records as `(id, sequence)` pairs, in file order.
/// Multi-line sequences are concatenated.
///
/// # Errors
///
/// On unreadable input.
pub fn read<R: BufRead>(reader: R) -> Result<Vec<(String, String)>> {
    let parser = bio::io::fasta::Reader::new(reader);
    let mut records = Vec::new();
    for record in parser.records() {
        let record = record.map_err(|e| Error::input(format!("bad fasta record: {e}")))?;
        let seq = String::from_utf8_lossy(record.seq()).into_owned();
        records.push((record.id().to_string(), seq));
    }
    Ok(records)
}

/// Reads a fasta file as `(id, sequence)` pairs.
///
/// # Errors
///
/// On unreadable input.
pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Vec<(String, String)>> {
    let file = std::fs::File::open(path)?;
    read(std::io::BufReader::new(file))
}

/// Reads a fasta file into an id → sequence map.
///
/// # Errors
///
/// On unreadable input, or when an id repeats.
pub fn read_map<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for (id, seq) in read_path(path)? {
        if map.insert(id.clone(), seq).is_some() {
            return Err(Error::input(format!("duplicate fasta id '{id}'")));
        }
    }
    Ok(map)
}

/// Writes `(id, sequence)` pairs as fasta.
///
/// # Errors
///
/// On write failure.
pub fn write<'a, W, I>(writer: &mut W, records: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    for (id, seq) in records {
        writeln!(writer, ">{id}")?;
        writeln!(writer, "{seq}")?;
    }
    Ok(())
}
