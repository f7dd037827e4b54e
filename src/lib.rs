//! Germline variant-calling inference engine.
//!
//! The crate provides the probabilistic core of a variant caller: a
//! per-read/per-haplotype likelihood cache, a genotype likelihood model
//! that marginalizes haplotype assignment under arbitrary ploidy, and a
//! region scheduler that drives per-region work through a worker pool.
//! Read ingestion, candidate discovery, haplotype assembly and the
//! pairwise alignment error model are consumed through traits.

#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;

pub mod calling;
pub mod candidates;
pub mod config;
pub mod errors;
pub mod filtration;
pub mod haplotypes;
pub mod model;
pub mod progress;
pub mod reference;
pub mod utils;
pub mod variants;

pub use crate::haplotypes::{Haplotype, HaplotypeHandle, HaplotypeSet};
pub use crate::model::genotype::Genotype;
pub use crate::model::likelihood::GermlineLikelihoodModel;
pub use crate::model::likelihoods::HaplotypeLikelihoodCache;
pub use crate::variants::{AlignedRead, GenomicRegion, Variant};

/// Sample identifier as used in read groups and output headers.
pub type SampleName = String;
