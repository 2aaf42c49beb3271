//! A labelled symmetric distance matrix.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A symmetric matrix of pairwise distances with string labels and a zero
/// diagonal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistanceMatrix {
    /// Row/column labels, in construction order.
    labels: Vec<String>,
    /// Label → index lookup.
    index: HashMap<String, usize>,
    /// Row-major `n * n` values.
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Creates a zero matrix over the given labels.
    ///
    /// # Errors
    ///
    /// If a label repeats.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if index.insert(label.clone(), i).is_some() {
                return Err(Error::input(format!("duplicate matrix label '{label}'")));
            }
        }
        let n = labels.len();
        Ok(Self {
            labels,
            index,
            values: vec![0.0; n * n],
        })
    }

    /// The number of labels.
    #[must_use]
    pub fn n(&self) -> usize {
        self.labels.len()
    }

    /// The labels, in construction order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Whether the given label is present.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// The value at `(i, j)` by index.
    #[must_use]
    pub fn get_idx(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n() + j]
    }

    /// The value for a pair of labels, if both are present.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let (&i, &j) = (self.index.get(a)?, self.index.get(b)?);
        Some(self.get_idx(i, j))
    }

    /// Sets the value for a pair of labels, symmetrically.
    ///
    /// # Errors
    ///
    /// If either label is unknown, or the pair is on the diagonal with a
    /// non-zero value.
    pub fn set(&mut self, a: &str, b: &str, value: f64) -> Result<()> {
        let i = *self
            .index
            .get(a)
            .ok_or_else(|| Error::input(format!("unknown matrix label '{a}'")))?;
        let j = *self
            .index
            .get(b)
            .ok_or_else(|| Error::input(format!("unknown matrix label '{b}'")))?;
        if i == j && value != 0.0 {
            return Err(Error::Consistency(format!(
                "diagonal entry for '{a}' must be zero, got {value}"
            )));
        }
        let n = self.n();
        self.values[i * n + j] = value;
        self.values[j * n + i] = value;
        Ok(())
    }

    /// Renames a label in place.
    ///
    /// # Errors
    ///
    /// If `old` is unknown or `new` already present.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if self.index.contains_key(new) {
            return Err(Error::input(format!("matrix label '{new}' already exists")));
        }
        let i = self
            .index
            .remove(old)
            .ok_or_else(|| Error::input(format!("unknown matrix label '{old}'")))?;
        self.labels[i] = new.to_string();
        self.index.insert(new.to_string(), i);
        Ok(())
    }

    /// Iterates over unordered label pairs `(a, b, distance)` with `a`
    /// before `b` in construction order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        (0..self.n()).flat_map(move |i| {
            ((i + 1)..self.n()).map(move |j| (self.labels[i].as_str(), self.labels[j].as_str(), self.get_idx(i, j)))
        })
    }

    /// Writes the matrix in phylip square format.
    ///
    /// # Errors
    ///
    /// On write failure.
    pub fn write_phylip<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{:5}", self.n())?;
        for (i, label) in self.labels.iter().enumerate() {
            write!(writer, "{label:<10}")?;
            for j in 0..self.n() {
                write!(writer, "  {:.6}", self.get_idx(i, j))?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Reads a matrix in phylip square format.
    ///
    /// # Errors
    ///
    /// If the header count or any row does not parse, or the row count does
    /// not match the header.
    pub fn read_phylip<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();
        let header = lines
            .next()
            .ok_or_else(|| Error::input("empty phylip distance file"))??;
        let n: usize = header
            .trim()
            .parse()
            .map_err(|_| Error::input(format!("bad phylip header '{header}'")))?;

        let mut labels = Vec::with_capacity(n);
        let mut rows = Vec::with_capacity(n);
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let label = fields
                .next()
                .ok_or_else(|| Error::input("phylip row without a label"))?
                .to_string();
            let row: Vec<f64> = fields
                .map(|f| {
                    f.parse()
                        .map_err(|_| Error::input(format!("bad distance '{f}' in row '{label}'")))
                })
                .collect::<Result<_>>()?;
            if row.len() != n {
                return Err(Error::input(format!(
                    "phylip row '{label}' has {} entries, expected {n}",
                    row.len()
                )));
            }
            labels.push(label);
            rows.push(row);
        }
        if labels.len() != n {
            return Err(Error::input(format!(
                "phylip file has {} rows, header says {n}",
                labels.len()
            )));
        }

        let mut matrix = Self::new(labels.clone())?;
        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                if i != j {
                    matrix.set(&labels[i], &labels[j], value)?;
                }
            }
        }
        Ok(matrix)
    }
}
