//! Phylogenomic cluster processing.
//!
//! phylome groups heterogeneous nucleotide sequences into putative gene
//! families, drives each family through alignment, distance, tree and
//! bootstrap phases, and prunes families with strain-aware selection
//! policies for downstream comparative analysis.
//!
//! ## Modules
//!
//! - [`blast`]: tabular blast ingestion and incremental cluster building.
//! - [`ace`]: assembly-file ingestion, one family per contig.
//! - [`seq`], [`matrix`], [`tree`]: the per-family data model.
//! - [`overlaps`]: overlap geometry and the seed-and-extend search.
//! - [`prune`]: the four pruning operators.
//! - [`recruit`]: homolog recruitment via consensus blast.
//! - [`topo`]: strain-labelled topology classification.
//! - [`dist`]: in-process pairwise distance corrections.
//! - [`external`], [`pipeline`]: external collaborators and the per-path
//!   orchestrator.
//! - [`config`], [`io`]: run configuration and interface formats.

pub mod ace;
pub mod blast;
mod cluster_set;
pub mod config;
pub mod dist;
mod error;
pub mod external;
mod family;
pub mod io;
mod matrix;
pub mod overlaps;
pub mod pipeline;
pub mod prune;
pub mod recruit;
pub mod seq;
mod strain;
pub mod topo;
pub mod tree;

pub use cluster_set::ClusterSet;
pub use error::{Error, Result};
pub use family::SequenceFamily;
pub use matrix::DistanceMatrix;
pub use strain::{Composition, StrainMap};
