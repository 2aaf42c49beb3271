//! Incremental clustering of blast hits into families.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::{cluster_set::ClusterSet, family::SequenceFamily, seq::Member, Error, Result};

use super::{filter::HitFilter, record::TabularRecord};

/// Builds families from a stream of blast hits by incremental union in
/// order of appearance.
///
/// A member is assigned to at most one cluster; the first assignment wins.
/// Self-hits always admit the query into its own cluster. A subject whose
/// hit passes the filter attaches to the cluster currently holding its
/// query; when the query is unassigned, a fresh cluster is created for it
/// first.
#[derive(Debug)]
pub struct ClusterBuilder {
    /// Root used for the renumbered family ids.
    rootname: String,
    /// The filter every non-self hit must pass.
    filter: HitFilter,
    /// When set, a full cluster rejects further admissions; a rejected
    /// subject seeds a new cluster when it is next seen as a query.
    max_cluster_members: Option<usize>,
    /// Clusters in creation order; each holds member ids in admission order.
    clusters: Vec<Vec<String>>,
    /// member id → index into `clusters`.
    assignment: HashMap<String, usize>,
}

impl ClusterBuilder {
    /// Creates a builder with the given id root and hit filter.
    #[must_use]
    pub fn new<S: Into<String>>(rootname: S, filter: HitFilter) -> Self {
        Self {
            rootname: rootname.into(),
            filter,
            max_cluster_members: None,
            clusters: Vec::new(),
            assignment: HashMap::new(),
        }
    }

    /// Caps the number of members per cluster.
    #[must_use]
    pub fn with_max_cluster_members(mut self, cap: usize) -> Self {
        self.max_cluster_members = Some(cap);
        self
    }

    /// Feeds one hit to the builder.
    pub fn observe(&mut self, record: &TabularRecord) {
        if record.is_self_hit() {
            self.cluster_of(&record.query);
            return;
        }
        if !self.filter.matches(record) {
            return;
        }
        let cluster = self.cluster_of(&record.query);
        if self.assignment.contains_key(&record.subject) {
            return;
        }
        if self
            .max_cluster_members
            .is_some_and(|cap| self.clusters[cluster].len() >= cap)
        {
            return;
        }
        self.clusters[cluster].push(record.subject.clone());
        self.assignment.insert(record.subject.clone(), cluster);
    }

    /// The cluster currently holding `id`, creating a fresh one when the id
    /// is unassigned.
    fn cluster_of(&mut self, id: &str) -> usize {
        if let Some(&cluster) = self.assignment.get(id) {
            return cluster;
        }
        let cluster = self.clusters.len();
        self.clusters.push(vec![id.to_string()]);
        self.assignment.insert(id.to_string(), cluster);
        cluster
    }

    /// Consumes the builder, renumbering clusters by descending size with
    /// zero-padded sequential ids.
    #[must_use]
    pub fn finish(self) -> ClusterSet {
        let mut set = ClusterSet::new();
        for (idx, members) in self.clusters.into_iter().enumerate() {
            // Provisional ids follow creation order so renumbering ties
            // stay stable.
            let mut family = SequenceFamily::new(format!("{}_tmp{idx:09}", self.rootname));
            for id in members {
                family.insert_member(Member::new(id));
            }
            set.insert_family(family);
        }
        set.renumber(&self.rootname);
        ftlog::info!("clustered blast hits into {} families", set.len());
        set
    }

    /// Clusters an already-parsed record stream (the full-parser variant:
    /// any report format whose parsing is delegated to a collaborator).
    #[must_use]
    pub fn from_records<I>(rootname: &str, filter: HitFilter, max_cluster_members: Option<usize>, records: I) -> ClusterSet
    where
        I: IntoIterator<Item = TabularRecord>,
    {
        let mut builder = Self::new(rootname, filter);
        if let Some(cap) = max_cluster_members {
            builder = builder.with_max_cluster_members(cap);
        }
        for record in records {
            builder.observe(&record);
        }
        builder.finish()
    }

    /// Clusters a tabular report read directly (the fast variant).
    ///
    /// # Errors
    ///
    /// [`Error::Input`] on malformed rows.
    pub fn from_tabular<R: Read>(
        rootname: &str,
        filter: HitFilter,
        max_cluster_members: Option<usize>,
        reader: R,
    ) -> Result<ClusterSet> {
        let mut builder = Self::new(rootname, filter);
        if let Some(cap) = max_cluster_members {
            builder = builder.with_max_cluster_members(cap);
        }

        let mut tsv = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .from_reader(reader);
        for row in tsv.records() {
            let row = row.map_err(|e| Error::input(format!("bad blast report row: {e}")))?;
            let fields: Vec<&str> = row.iter().collect();
            let record = TabularRecord::from_fields(&fields)?;
            builder.observe(&record);
        }
        Ok(builder.finish())
    }

    /// Clusters a tabular report file (the fast variant).
    ///
    /// # Errors
    ///
    /// [`Error::Input`] on malformed rows; I/O errors opening the file.
    pub fn from_tabular_path<P: AsRef<Path>>(
        rootname: &str,
        filter: HitFilter,
        max_cluster_members: Option<usize>,
        path: P,
    ) -> Result<ClusterSet> {
        let file = std::fs::File::open(path)?;
        Self::from_tabular(rootname, filter, max_cluster_members, std::io::BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use crate::blast::{HitFilter, TabularRecord};

    use super::ClusterBuilder;

    fn hit(query: &str, subject: &str, pct: f64, len: u64) -> TabularRecord {
        let line = format!("{query}\t{subject}\t{pct}\t{len}\t0\t0\t1\t{len}\t1\t{len}\t1e-20\t100");
        let fields: Vec<&str> = line.split('\t').collect();
        TabularRecord::from_fields(&fields).unwrap()
    }

    #[test]
    fn test_filtered_clustering() {
        let filter = HitFilter::parse(["pct_identity > 75", "aln_length > 60"]).unwrap();
        let records = vec![hit("q1", "s1", 95.0, 120), hit("q1", "s2", 70.0, 40)];
        let set = ClusterBuilder::from_records("fam", filter, None, records);

        assert_eq!(set.len(), 1);
        let family = set.family("fam_001").unwrap();
        assert!(family.contains("q1"));
        assert!(family.contains("s1"));
        assert!(!family.contains("s2"));
    }

    #[test]
    fn test_first_assignment_wins() {
        let records = vec![hit("q1", "s1", 95.0, 120), hit("q2", "s1", 95.0, 120)];
        let set = ClusterBuilder::from_records("fam", HitFilter::pass_all(), None, records);

        // s1 stays with q1; q2 ends up alone.
        assert_eq!(set.len(), 2);
        assert_eq!(set.family("fam_001").unwrap().len(), 2);
        assert!(set.family("fam_001").unwrap().contains("s1"));
        assert_eq!(set.family("fam_002").unwrap().len(), 1);
    }

    #[test]
    fn test_max_cluster_members() {
        let records = vec![
            hit("q1", "s1", 95.0, 120),
            hit("q1", "s2", 95.0, 120),
            hit("s2", "s3", 95.0, 120),
        ];
        let set = ClusterBuilder::from_records("fam", HitFilter::pass_all(), Some(2), records);

        // The cap keeps s2 out of q1's cluster; s2 seeds its own when seen
        // as a query.
        assert_eq!(set.len(), 2);
        let index = set.member_index().unwrap();
        assert_eq!(index.get("q1"), index.get("s1"));
        assert_eq!(index.get("s2"), index.get("s3"));
        assert_ne!(index.get("q1"), index.get("s2"));
    }

    #[test]
    fn test_renumbering_descending() {
        let records = vec![
            hit("a", "a", 100.0, 100),
            hit("b", "b1", 95.0, 120),
            hit("b", "b2", 95.0, 120),
        ];
        let set = ClusterBuilder::from_records("fam", HitFilter::pass_all(), None, records);
        assert_eq!(set.family_ids(), vec!["fam_001", "fam_002"]);
        assert_eq!(set.family("fam_001").unwrap().len(), 3);
        assert_eq!(set.family("fam_002").unwrap().len(), 1);
    }

    #[test]
    fn test_fast_tabular_parse() {
        let report = "q1\ts1\t95.0\t120\t0\t0\t1\t120\t1\t120\t1e-50\t220\nq1\tq1\t100.0\t120\t0\t0\t1\t120\t1\t120\t0.0\t240\n";
        let set = ClusterBuilder::from_tabular("fam", HitFilter::pass_all(), None, report.as_bytes()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.family("fam_001").unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_row_rejected() {
        let report = "q1\ts1\tnot-a-number\t120\t0\t0\t1\t120\t1\t120\t1e-50\t220\n";
        assert!(ClusterBuilder::from_tabular("fam", HitFilter::pass_all(), None, report.as_bytes()).is_err());
    }
}
