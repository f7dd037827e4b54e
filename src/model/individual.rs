//! Single-sample genotype inference: enumerate genotypes, score them under
//! the germline likelihood model and a Hardy–Weinberg prior, and normalize
//! to posteriors. The calling layer above turns these latents into calls.

use crate::haplotypes::HaplotypeHandle;
use crate::model::genotype::{enumerate_genotypes, Genotype};
use crate::model::likelihood::GermlineLikelihoodModel;
use crate::model::likelihoods::HaplotypeLikelihoodCache;
use crate::model::priors::{ln_hardy_weinberg, uniform_frequencies, HaplotypeFrequencies};
use crate::utils::stats::ln_sum_exp;

/// Inference result for one sample over one region's genotype space.
/// Vectors are parallel to `genotypes`.
#[derive(Debug)]
pub struct InferredLatents {
    genotypes: Vec<Genotype>,
    log_likelihoods: Vec<f64>,
    log_posteriors: Vec<f64>,
    log_evidence: f64,
}

impl InferredLatents {
    pub fn genotypes(&self) -> &[Genotype] {
        &self.genotypes
    }

    /// `ln P(reads | G)` per enumerated genotype, the surface consumed by
    /// callers.
    pub fn log_likelihoods(&self) -> &[f64] {
        &self.log_likelihoods
    }

    pub fn log_posteriors(&self) -> &[f64] {
        &self.log_posteriors
    }

    /// `ln P(reads)` under the model, for model comparison.
    pub fn log_evidence(&self) -> f64 {
        self.log_evidence
    }

    /// The maximum a posteriori genotype with its log posterior.
    pub fn map_genotype(&self) -> Option<(&Genotype, f64)> {
        self.log_posteriors
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).expect("posterior is NaN"))
            .map(|(i, &p)| (&self.genotypes[i], p))
    }
}

/// Scores every genotype of the given ploidy over `haplotypes` for the
/// cache's current sample. Frequencies default to uniform when not
/// provided.
pub fn infer_latents(
    haplotypes: &[HaplotypeHandle],
    ploidy: u32,
    likelihoods: &HaplotypeLikelihoodCache,
    frequencies: Option<&HaplotypeFrequencies>,
) -> InferredLatents {
    let uniform;
    let frequencies = match frequencies {
        Some(f) => f,
        None => {
            uniform = uniform_frequencies(haplotypes);
            &uniform
        }
    };
    let genotypes = enumerate_genotypes(haplotypes, ploidy);
    let mut model = GermlineLikelihoodModel::new(likelihoods);
    let log_likelihoods: Vec<f64> = genotypes.iter().map(|g| model.evaluate(g)).collect();
    let log_joints: Vec<f64> = genotypes
        .iter()
        .zip(&log_likelihoods)
        .map(|(genotype, lnl)| ln_hardy_weinberg(genotype, frequencies) + lnl)
        .collect();
    let log_evidence = ln_sum_exp(&log_joints);
    let log_posteriors = log_joints
        .iter()
        .map(|joint| joint - log_evidence)
        .collect();
    InferredLatents {
        genotypes,
        log_likelihoods,
        log_posteriors,
        log_evidence,
    }
}
