//! Tab-separated side tables: strains, GO annotations, deflines, and
//! cluster membership.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::{cluster_set::ClusterSet, family::SequenceFamily, seq::Member, strain::StrainMap, Error, Result};

/// One GO term of an annotated member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoTerm {
    /// The term id, e.g. `GO:0008150`.
    pub id: String,
    /// The optional description after `=`.
    pub description: Option<String>,
}

/// Reads a strain table: `<member-id>\t<strain-label>` per line.
///
/// # Errors
///
/// [`Error::Input`] on lines without exactly two columns.
pub fn read_strain_table<R: BufRead>(reader: R) -> Result<StrainMap> {
    let mut strains = StrainMap::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(member), Some(strain), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(Error::input(format!(
                "strain table line {}: expected '<member-id>\\t<strain-label>'",
                number + 1
            )));
        };
        strains.insert(member.trim(), strain.trim());
    }
    Ok(strains)
}

/// Reads a GO annotation table: two tab-separated columns, the second a
/// semicolon-separated term list, each term optionally
/// `GO:NNNNNNN=<description>`.
///
/// # Errors
///
/// [`Error::Input`] on lines without exactly two columns.
pub fn read_go_table<R: BufRead>(reader: R) -> Result<HashMap<String, Vec<GoTerm>>> {
    let mut annotations = HashMap::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(member), Some(terms), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(Error::input(format!(
                "GO table line {}: expected '<member-id>\\t<terms>'",
                number + 1
            )));
        };
        let terms = terms
            .split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|term| match term.split_once('=') {
                Some((id, description)) => GoTerm {
                    id: id.trim().to_string(),
                    description: Some(description.trim().to_string()),
                },
                None => GoTerm {
                    id: term.to_string(),
                    description: None,
                },
            })
            .collect();
        annotations.insert(member.trim().to_string(), terms);
    }
    Ok(annotations)
}

/// Reads a blast defline file (`<subject-id>\t<description>`) into a map,
/// for pre-indexing instead of per-hit scans.
///
/// # Errors
///
/// [`Error::Input`] on lines without a tab.
pub fn read_deflines<R: BufRead>(reader: R) -> Result<HashMap<String, String>> {
    let mut deflines = HashMap::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some((subject, description)) = line.split_once('\t') else {
            return Err(Error::input(format!(
                "defline file line {}: expected '<subject-id>\\t<description>'",
                number + 1
            )));
        };
        deflines.insert(subject.trim().to_string(), description.trim().to_string());
    }
    Ok(deflines)
}

/// Writes cluster membership as `<cluster>\t<member>` per line, in family
/// and member id order.
///
/// # Errors
///
/// On write failure.
pub fn write_memberships<W: Write>(writer: &mut W, set: &ClusterSet) -> Result<()> {
    for family in set.iter() {
        for member in family.member_ids() {
            writeln!(writer, "{}\t{member}", family.id)?;
        }
    }
    Ok(())
}

/// Reads cluster membership written by [`write_memberships`].
///
/// # Errors
///
/// [`Error::Input`] on lines without a tab.
pub fn read_memberships<R: BufRead>(reader: R) -> Result<ClusterSet> {
    let mut set = ClusterSet::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some((family_id, member_id)) = line.split_once('\t') else {
            return Err(Error::input(format!(
                "membership file line {}: expected '<cluster>\\t<member>'",
                number + 1
            )));
        };
        let (family_id, member_id) = (family_id.trim(), member_id.trim());
        if set.family(family_id).is_none() {
            set.insert_family(SequenceFamily::new(family_id));
        }
        if let Some(family) = set.family_mut(family_id) {
            family.insert_member(Member::new(member_id));
        }
    }
    Ok(set)
}
