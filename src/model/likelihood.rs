//! Germline genotype likelihoods.
//!
//! `ln p(read | genotype)  = ln Σ_{haplotype in genotype} p(read | haplotype) - ln ploidy`
//! `ln p(reads | genotype) = Σ_{read in reads} ln p(read | genotype)`
//!
//! Haplotypes are not deduplicated in the mixture: a haplotype occurring
//! twice in a triploid genotype contributes twice, which the specialized
//! paths express as a `ln 2` weight on its vector. The general polyploid
//! path is the ground truth; the haploid/diploid/triploid branches only
//! exist because this is the innermost loop of calling and must not touch
//! a scratch buffer for the common ploidies.

use crate::haplotypes::HaplotypeHandle;
use crate::model::genotype::Genotype;
use crate::model::likelihoods::HaplotypeLikelihoodCache;
use crate::utils::stats::{ln_add_exp, ln_add_exp3, ln_small, ln_sum_exp};

pub struct GermlineLikelihoodModel<'a> {
    likelihoods: &'a HaplotypeLikelihoodCache,
    scratch: Vec<f64>,
}

impl<'a> GermlineLikelihoodModel<'a> {
    pub fn new(likelihoods: &'a HaplotypeLikelihoodCache) -> Self {
        GermlineLikelihoodModel {
            likelihoods,
            scratch: Vec::new(),
        }
    }

    /// `ln P(reads | genotype)` for the cache's current sample.
    ///
    /// Every haplotype in the genotype must be installed in the cache.
    pub fn evaluate(&mut self, genotype: &Genotype) -> f64 {
        assert!(self.likelihoods.is_primed());
        let result = match genotype.ploidy() {
            0 => 0.0,
            1 => self.evaluate_haploid(genotype),
            2 => self.evaluate_diploid(genotype),
            3 => self.evaluate_triploid(genotype),
            _ => self.evaluate_polyploid(genotype),
        };
        if result.is_nan() {
            warn!(
                "non-finite genotype likelihood despite stabilization; treating as impossible"
            );
            return f64::NEG_INFINITY;
        }
        result
    }

    fn evaluate_haploid(&self, genotype: &Genotype) -> f64 {
        self.likelihoods.get(genotype[0]).iter().sum()
    }

    fn evaluate_diploid(&self, genotype: &Genotype) -> f64 {
        let log_likelihoods1 = self.likelihoods.get(genotype[0]);
        if genotype.is_homozygous() {
            return log_likelihoods1.iter().sum();
        }
        let log_likelihoods2 = self.likelihoods.get(genotype[1]);
        log_likelihoods1
            .iter()
            .zip(log_likelihoods2)
            .map(|(&a, &b)| ln_add_exp(a, b) - ln_small(2))
            .sum()
    }

    fn evaluate_triploid(&self, genotype: &Genotype) -> f64 {
        let log_likelihoods1 = self.likelihoods.get(genotype[0]);
        if genotype.is_homozygous() {
            return log_likelihoods1.iter().sum();
        }
        if genotype.zygosity() == 3 {
            let log_likelihoods2 = self.likelihoods.get(genotype[1]);
            let log_likelihoods3 = self.likelihoods.get(genotype[2]);
            return log_likelihoods1
                .iter()
                .zip(log_likelihoods2)
                .zip(log_likelihoods3)
                .map(|((&a, &b), &c)| ln_add_exp3(a, b, c) - ln_small(3))
                .sum();
        }
        // zygosity 2: one haplotype occurs twice. The two canonical
        // layouts (xxy, xyy) are symmetric and must agree.
        if genotype[0] != genotype[1] {
            let log_likelihoods2 = self.likelihoods.get(genotype[1]);
            log_likelihoods1
                .iter()
                .zip(log_likelihoods2)
                .map(|(&single, &double)| ln_add_exp(single, ln_small(2) + double) - ln_small(3))
                .sum()
        } else {
            let log_likelihoods3 = self.likelihoods.get(genotype[2]);
            log_likelihoods1
                .iter()
                .zip(log_likelihoods3)
                .map(|(&double, &single)| ln_add_exp(ln_small(2) + double, single) - ln_small(3))
                .sum()
        }
    }

    fn evaluate_polyploid(&mut self, genotype: &Genotype) -> f64 {
        let ploidy = genotype.ploidy();
        let zygosity = genotype.zygosity();
        if zygosity == 1 {
            return self.likelihoods.get(genotype[0]).iter().sum();
        }
        if zygosity == 2 {
            let mut uniques = genotype.unique_counts();
            let (handle_a, count_a) = uniques.next().unwrap();
            let (handle_b, count_b) = uniques.next().unwrap();
            return self.evaluate_two_way_mixture(handle_a, count_a, handle_b, count_b, ploidy);
        }
        let weighted: Vec<(&[f64], f64)> = genotype
            .unique_counts()
            .map(|(handle, count)| (self.likelihoods.get(handle), ln_small(count)))
            .collect();
        let num_reads = weighted[0].0.len();
        self.scratch.resize(zygosity as usize, 0.0);
        let mut result = 0.0;
        for read in 0..num_reads {
            for (slot, (log_likelihoods, ln_count)) in self.scratch.iter_mut().zip(&weighted) {
                *slot = ln_count + log_likelihoods[read];
            }
            result += ln_sum_exp(&self.scratch) - ln_small(ploidy);
        }
        result
    }

    fn evaluate_two_way_mixture(
        &self,
        handle_a: HaplotypeHandle,
        count_a: u32,
        handle_b: HaplotypeHandle,
        count_b: u32,
        ploidy: u32,
    ) -> f64 {
        let log_likelihoods_a = self.likelihoods.get(handle_a);
        let log_likelihoods_b = self.likelihoods.get(handle_b);
        let ln_count_a = ln_small(count_a);
        let ln_count_b = ln_small(count_b);
        log_likelihoods_a
            .iter()
            .zip(log_likelihoods_b)
            .map(|(&a, &b)| ln_add_exp(ln_count_a + a, ln_count_b + b) - ln_small(ploidy))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplotypes::{Haplotype, HaplotypeSet};
    use crate::variants::{GenomicRegion, Variant};
    use approx::assert_relative_eq;

    const NEG_INF: f64 = f64::NEG_INFINITY;

    /// Builds a working set of `n` haplotypes and primes a cache with the
    /// given per-haplotype log-likelihood vectors.
    fn primed_cache(vectors: &[Vec<f64>]) -> (Vec<HaplotypeHandle>, HaplotypeLikelihoodCache) {
        let region = GenomicRegion::new("1", 0, 4);
        let mut set =
            HaplotypeSet::with_reference(Haplotype::new(region.clone(), b"ACGT".to_vec(), vec![]));
        for i in 1..vectors.len() {
            set.push(Haplotype::new(
                region.clone(),
                b"ACGA".to_vec(),
                vec![Variant::new(i as u64 % 4, "T", "A")],
            ));
        }
        let handles: Vec<_> = set.handles().collect();
        let mut cache = HaplotypeLikelihoodCache::new();
        cache.prime(
            "sample",
            handles.iter().copied().zip(vectors.iter().cloned()).collect(),
        );
        (handles, cache)
    }

    fn evaluate(vectors: &[Vec<f64>], genotype_of: impl Fn(&[HaplotypeHandle]) -> Genotype) -> f64 {
        let (handles, cache) = primed_cache(vectors);
        let mut model = GermlineLikelihoodModel::new(&cache);
        model.evaluate(&genotype_of(&handles))
    }

    #[test]
    fn empty_genotype_scores_zero() {
        let lnl = evaluate(&[vec![-1.0]], |_| Genotype::empty());
        assert_eq!(lnl, 0.0);
    }

    #[test]
    fn haploid_single_read() {
        // S1: L[h] = [ln 0.9]
        let lnl = evaluate(&[vec![0.9f64.ln()]], |h| Genotype::new(vec![h[0]]));
        assert_relative_eq!(lnl, 0.9f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn diploid_heterozygous_two_reads() {
        // S2: per read ln((0.9 + 0.1) / 2) = ln 0.5
        let vectors = vec![
            vec![0.9f64.ln(), 0.1f64.ln()],
            vec![0.1f64.ln(), 0.9f64.ln()],
        ];
        let lnl = evaluate(&vectors, |h| Genotype::new(vec![h[0], h[1]]));
        assert_relative_eq!(lnl, 2.0 * 0.5f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn diploid_homozygous_is_plain_sum() {
        // S3
        let vectors = vec![vec![0.9f64.ln(), 0.1f64.ln()], vec![0.0, 0.0]];
        let lnl = evaluate(&vectors, |h| Genotype::new(vec![h[0], h[0]]));
        assert_relative_eq!(lnl, 0.9f64.ln() + 0.1f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn triploid_zygosity_two() {
        // S4: ln((2·0.8 + 0.2) / 3) = ln 0.6
        let vectors = vec![vec![0.8f64.ln()], vec![0.2f64.ln()]];
        let lnl = evaluate(&vectors, |h| Genotype::new(vec![h[0], h[0], h[1]]));
        assert_relative_eq!(lnl, 0.6f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn triploid_zygosity_two_is_symmetric_in_which_haplotype_doubles() {
        let vectors = vec![vec![0.8f64.ln(), -2.5], vec![0.2f64.ln(), -0.3]];
        let (handles, cache) = primed_cache(&vectors);
        let mut model = GermlineLikelihoodModel::new(&cache);
        // canonical layouts xxy and xyy exercise the two code paths
        let double_low = model.evaluate(&Genotype::new(vec![handles[0], handles[0], handles[1]]));
        let double_high = model.evaluate(&Genotype::new(vec![handles[0], handles[1], handles[1]]));
        let expected_low = (2.0 * 0.8 + 0.2f64).ln() - 3f64.ln()
            + ln_add_exp(ln_small(2) - 2.5, -0.3) - ln_small(3);
        let expected_high = (0.8 + 2.0 * 0.2f64).ln() - 3f64.ln()
            + ln_add_exp(-2.5, ln_small(2) - 0.3) - ln_small(3);
        assert_relative_eq!(double_low, expected_low, max_relative = 1e-12);
        assert_relative_eq!(double_high, expected_high, max_relative = 1e-12);
    }

    #[test]
    fn triploid_heterozygous() {
        let vectors = vec![vec![0.5f64.ln()], vec![0.3f64.ln()], vec![0.1f64.ln()]];
        let lnl = evaluate(&vectors, |h| Genotype::new(vec![h[0], h[1], h[2]]));
        assert_relative_eq!(lnl, (0.9f64 / 3.0).ln(), max_relative = 1e-12);
    }

    #[test]
    fn tetraploid_full_zygosity_single_read() {
        // S5: ln((4·0.25) / 4) = ln 0.25
        let vectors = vec![
            vec![0.25f64.ln()],
            vec![0.25f64.ln()],
            vec![0.25f64.ln()],
            vec![0.25f64.ln()],
        ];
        let lnl = evaluate(&vectors, |h| Genotype::new(h.to_vec()));
        assert_relative_eq!(lnl, 0.25f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn tetraploid_partial_zygosities_follow_the_general_mixture() {
        // the unfinished tetraploid fast path of old implementations must
        // NOT surface as a zero; z in {2, 3} goes through the mixture math
        let vectors = vec![vec![0.6f64.ln()], vec![0.2f64.ln()], vec![0.1f64.ln()]];
        let (h, cache) = primed_cache(&vectors);
        let mut model = GermlineLikelihoodModel::new(&cache);
        // z = 2: 3 copies of h0, 1 of h1
        let z2 = model.evaluate(&Genotype::new(vec![h[0], h[0], h[0], h[1]]));
        assert_relative_eq!(z2, ((3.0 * 0.6 + 0.2) / 4.0f64).ln(), max_relative = 1e-12);
        // z = 3: 2 copies of h0, 1 each of h1, h2
        let z3 = model.evaluate(&Genotype::new(vec![h[0], h[0], h[1], h[2]]));
        assert_relative_eq!(
            z3,
            ((2.0 * 0.6 + 0.2 + 0.1) / 4.0f64).ln(),
            max_relative = 1e-12
        );
        assert_ne!(z2, 0.0);
        assert_ne!(z3, 0.0);
    }

    #[test]
    fn pentaploid_two_way_mixture_uses_true_multiplicities() {
        // z = 2 with multiplicities 2 and 3 (not 1 and k-1)
        let vectors = vec![vec![0.4f64.ln()], vec![0.1f64.ln()]];
        let lnl = evaluate(&vectors, |h| {
            Genotype::new(vec![h[0], h[0], h[1], h[1], h[1]])
        });
        assert_relative_eq!(
            lnl,
            ((2.0 * 0.4 + 3.0 * 0.1) / 5.0f64).ln(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn homozygous_reduction_holds_for_all_ploidies() {
        let vector = vec![-0.7, -1.3, -0.2];
        let expected: f64 = vector.iter().sum();
        for ploidy in 1..=6 {
            let lnl = evaluate(&[vector.clone(), vec![0.0; 3]], |h| {
                Genotype::new(std::iter::repeat(h[0]).take(ploidy))
            });
            assert_eq!(lnl, expected);
        }
    }

    #[test]
    fn specializations_agree_with_the_general_path() {
        // fixed, irregular vectors over 4 haplotypes and 5 reads
        let vectors = vec![
            vec![-0.11, -3.2, -0.9, -7.5, -0.01],
            vec![-1.4, -0.3, -2.2, -0.6, -5.5],
            vec![-2.9, -1.8, -0.1, -0.2, -0.4],
            vec![-0.5, -0.5, -4.0, -1.1, -2.3],
        ];
        let (handles, cache) = primed_cache(&vectors);
        let mut model = GermlineLikelihoodModel::new(&cache);
        for ploidy in 2..=4u32 {
            for genotype in crate::model::genotype::enumerate_genotypes(&handles, ploidy) {
                let fast = model.evaluate(&genotype);
                let general = model.evaluate_polyploid(&genotype);
                assert_relative_eq!(fast, general, epsilon = 1e-9, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn permutation_invariance_at_the_public_api() {
        let vectors = vec![vec![-0.2, -1.0], vec![-2.0, -0.1], vec![-0.7, -0.7]];
        let (h, cache) = primed_cache(&vectors);
        let mut model = GermlineLikelihoodModel::new(&cache);
        let reference = model.evaluate(&Genotype::new(vec![h[0], h[1], h[2]]));
        for permutation in &[
            vec![h[0], h[2], h[1]],
            vec![h[1], h[0], h[2]],
            vec![h[2], h[1], h[0]],
        ] {
            assert_eq!(model.evaluate(&Genotype::new(permutation.clone())), reference);
        }
    }

    #[test]
    fn empty_read_set_scores_zero() {
        let vectors = vec![vec![], vec![]];
        let lnl = evaluate(&vectors, |h| Genotype::new(vec![h[0], h[1]]));
        assert_eq!(lnl, 0.0);
    }

    #[test]
    fn read_incompatible_with_every_haplotype_sinks_the_genotype() {
        // S6
        let vectors = vec![vec![0.5f64.ln(), NEG_INF], vec![0.5f64.ln(), NEG_INF]];
        let lnl = evaluate(&vectors, |h| Genotype::new(vec![h[0], h[1]]));
        assert_eq!(lnl, NEG_INF);
    }

    #[test]
    fn neg_infinity_against_one_haplotype_is_survivable() {
        let vectors = vec![vec![NEG_INF], vec![0.5f64.ln()]];
        let lnl = evaluate(&vectors, |h| Genotype::new(vec![h[0], h[1]]));
        assert_relative_eq!(lnl, 0.25f64.ln(), max_relative = 1e-12);
    }

    #[test]
    fn probability_coherence() {
        // exp(per-read mixture) never exceeds the best single haplotype
        let vectors = vec![vec![0.9f64.ln()], vec![0.4f64.ln()], vec![0.2f64.ln()]];
        let (h, cache) = primed_cache(&vectors);
        let mut model = GermlineLikelihoodModel::new(&cache);
        for genotype in crate::model::genotype::enumerate_genotypes(&h, 3) {
            let best: f64 = genotype
                .unique()
                .map(|handle| cache.get(handle)[0])
                .fold(NEG_INF, f64::max);
            assert!(model.evaluate(&genotype) <= best + 1e-12);
        }
    }
}
