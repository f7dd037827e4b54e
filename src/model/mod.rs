//! The probabilistic core: genotypes over haplotype handles, the per-read
//! likelihood cache, and the germline likelihood model that ties them
//! together.

pub mod genotype;
pub mod individual;
pub mod likelihood;
pub mod likelihoods;
pub mod priors;

pub use genotype::{enumerate_genotypes, num_genotypes, Genotype};
pub use individual::{infer_latents, InferredLatents};
pub use likelihood::GermlineLikelihoodModel;
pub use likelihoods::HaplotypeLikelihoodCache;
