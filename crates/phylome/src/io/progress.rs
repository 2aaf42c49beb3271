//! Progress reporting to the diagnostic stream.

use std::io::Write;

use crate::Result;

/// Writes one progress line: `\t<message> <percent> %   (processing:<id>)`,
/// with two decimals, ending in a carriage return so consecutive lines
/// overwrite each other on a terminal.
///
/// # Errors
///
/// On write failure.
#[allow(clippy::cast_precision_loss)]
pub fn report<W: Write>(writer: &mut W, message: &str, current: usize, total: usize, id: &str) -> Result<()> {
    let percent = if total == 0 {
        100.0
    } else {
        100.0 * current as f64 / total as f64
    };
    write!(writer, "\t{message} {percent:.2} %   (processing:{id})\r")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::report;

    #[test]
    fn test_format() {
        let mut buffer = Vec::new();
        report(&mut buffer, "aligning families", 1, 3, "fam_002").unwrap();
        let line = String::from_utf8(buffer).unwrap();
        assert_eq!(line, "\taligning families 33.33 %   (processing:fam_002)\r");
    }

    #[test]
    fn test_empty_total() {
        let mut buffer = Vec::new();
        report(&mut buffer, "done", 0, 0, "none").unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("100.00 %"));
    }
}
