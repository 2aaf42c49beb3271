//! Alignment serialization: clustalw, fasta, phylip and nexus.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::{
    seq::{Alignment, Row, Strand},
    Error, Result,
};

/// Width of one sequence block in clustalw and fasta output.
const BLOCK_WIDTH: usize = 60;

/// Writes the alignment in clustalw format.
///
/// # Errors
///
/// On write failure.
pub fn write_clustal<W: Write>(writer: &mut W, alignment: &Alignment) -> Result<()> {
    writeln!(writer, "CLUSTAL W multiple sequence alignment")?;
    writeln!(writer)?;

    let name_width = alignment
        .rows()
        .iter()
        .map(|r| r.member_id.len())
        .max()
        .unwrap_or(0)
        .max(10)
        + 3;
    let width = alignment.width();
    let mut offset = 0;
    while offset < width {
        let end = (offset + BLOCK_WIDTH).min(width);
        for row in alignment.rows() {
            writeln!(writer, "{:<name_width$}{}", row.member_id, &row.text[offset..end])?;
        }
        writeln!(writer)?;
        offset = end;
    }
    Ok(())
}

/// Reads an alignment in clustalw format.
///
/// Conservation lines (leading whitespace) and the header are skipped; row
/// order follows first appearance.
///
/// # Errors
///
/// [`Error::Input`] when the resulting rows have unequal widths.
pub fn read_clustal<R: BufRead>(reader: R) -> Result<Alignment> {
    let mut order: Vec<String> = Vec::new();
    let mut sequences: HashMap<String, String> = HashMap::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty()
            || line.starts_with("CLUSTAL")
            || line.starts_with(char::is_whitespace)
        {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(name), Some(chunk)) = (fields.next(), fields.next()) else {
            continue;
        };
        let entry = sequences.entry(name.to_string()).or_insert_with(|| {
            order.push(name.to_string());
            String::new()
        });
        entry.push_str(chunk);
    }

    let mut alignment = Alignment::new();
    alignment.source = Some("clustalw".to_string());
    for name in order {
        let text = sequences.remove(&name).unwrap_or_default();
        alignment.push_row(Row::new(name, text, Strand::Forward))?;
    }
    Ok(alignment)
}

/// Writes the alignment as gapped fasta.
///
/// # Errors
///
/// On write failure.
pub fn write_fasta<W: Write>(writer: &mut W, alignment: &Alignment) -> Result<()> {
    for row in alignment.rows() {
        writeln!(writer, ">{}", row.member_id)?;
        let bytes = row.text.as_bytes();
        for chunk in bytes.chunks(BLOCK_WIDTH) {
            writeln!(writer, "{}", String::from_utf8_lossy(chunk))?;
        }
    }
    Ok(())
}

/// Reads a gapped-fasta alignment.
///
/// # Errors
///
/// [`Error::Input`] when the rows have unequal widths.
pub fn read_fasta<R: BufRead>(reader: R) -> Result<Alignment> {
    let records = super::fasta::read(reader)?;
    let mut alignment = Alignment::new();
    alignment.source = Some("fasta".to_string());
    for (id, seq) in records {
        alignment.push_row(Row::new(id, seq, Strand::Forward))?;
    }
    Ok(alignment)
}

/// Writes the alignment in sequential phylip format.
///
/// Names are truncated to the classic 10 characters.
///
/// # Errors
///
/// On write failure.
pub fn write_phylip<W: Write>(writer: &mut W, alignment: &Alignment) -> Result<()> {
    writeln!(writer, " {} {}", alignment.len(), alignment.width())?;
    for row in alignment.rows() {
        let name: String = row.member_id.chars().take(10).collect();
        writeln!(writer, "{name:<10}{}", row.text)?;
    }
    Ok(())
}

/// Writes the alignment as a nexus data block.
///
/// # Errors
///
/// On write failure, or when a member id needs quoting nexus cannot carry.
pub fn write_nexus<W: Write>(writer: &mut W, alignment: &Alignment) -> Result<()> {
    for row in alignment.rows() {
        if row.member_id.contains(|c: char| c.is_whitespace() || c == ';') {
            return Err(Error::input(format!(
                "member id '{}' cannot be written to nexus",
                row.member_id
            )));
        }
    }
    writeln!(writer, "#NEXUS")?;
    writeln!(writer, "begin data;")?;
    writeln!(
        writer,
        "  dimensions ntax={} nchar={};",
        alignment.len(),
        alignment.width()
    )?;
    writeln!(writer, "  format datatype=dna gap=-;")?;
    writeln!(writer, "  matrix")?;
    let name_width = alignment
        .rows()
        .iter()
        .map(|r| r.member_id.len())
        .max()
        .unwrap_or(0)
        + 2;
    for row in alignment.rows() {
        writeln!(writer, "    {:<name_width$}{}", row.member_id, row.text)?;
    }
    writeln!(writer, "  ;")?;
    writeln!(writer, "end;")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::seq::{Alignment, Row, Strand};

    use super::{read_clustal, read_fasta, write_clustal, write_fasta, write_nexus, write_phylip};

    fn alignment() -> Alignment {
        let long = "ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT--";
        let other = "ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTAA";
        Alignment::from_rows([
            Row::new("member_one", long.to_string(), Strand::Forward),
            Row::new("m2", other.to_string(), Strand::Forward),
        ])
        .unwrap()
    }

    #[test]
    fn test_clustal_round_trip() {
        let original = alignment();
        let mut buffer = Vec::new();
        write_clustal(&mut buffer, &original).unwrap();

        let back = read_clustal(buffer.as_slice()).unwrap();
        assert_eq!(back.member_ids(), original.member_ids());
        for row in original.rows() {
            assert_eq!(back.row(&row.member_id).unwrap().text, row.text);
        }
    }

    #[test]
    fn test_fasta_round_trip() {
        let original = alignment();
        let mut buffer = Vec::new();
        write_fasta(&mut buffer, &original).unwrap();

        let back = read_fasta(buffer.as_slice()).unwrap();
        assert_eq!(back.member_ids(), original.member_ids());
        assert_eq!(back.row("m2").unwrap().text, original.row("m2").unwrap().text);
    }

    #[test]
    fn test_phylip_header() {
        let mut buffer = Vec::new();
        write_phylip(&mut buffer, &alignment()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with(" 2 66\n"));
        assert!(text.contains("member_one"));
    }

    #[test]
    fn test_nexus_block() {
        let mut buffer = Vec::new();
        write_nexus(&mut buffer, &alignment()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("#NEXUS"));
        assert!(text.contains("dimensions ntax=2 nchar=66;"));
        assert!(text.trim_end().ends_with("end;"));
    }
}
