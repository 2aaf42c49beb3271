//! Blast report ingestion: records, hit filters, and cluster building.

mod cluster;
mod filter;
mod record;

pub use cluster::ClusterBuilder;
pub use filter::{Comparator, Condition, FilterField, HitFilter};
pub use record::{read_tabular, TabularRecord};
