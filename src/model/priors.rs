//! Hardy–Weinberg genotype priors over haplotype frequencies.

use std::collections::HashMap;

use crate::haplotypes::HaplotypeHandle;
use crate::model::genotype::Genotype;
use crate::utils::stats::{ln_multinomial_coefficient, ln_small};

pub type HaplotypeFrequencies = HashMap<HaplotypeHandle, f64>;

/// Uniform frequencies over a haplotype set, the usual starting point when
/// nothing is known about the region.
pub fn uniform_frequencies(haplotypes: &[HaplotypeHandle]) -> HaplotypeFrequencies {
    let uniform = 1.0 / haplotypes.len() as f64;
    haplotypes.iter().map(|&h| (h, uniform)).collect()
}

/// `ln P(genotype | frequencies)` under Hardy–Weinberg equilibrium.
///
/// The general form is the multinomial coefficient over multiplicities
/// times the frequency of each haplotype raised to its multiplicity; the
/// haploid and diploid branches just shortcut the common cases.
pub fn ln_hardy_weinberg(genotype: &Genotype, frequencies: &HaplotypeFrequencies) -> f64 {
    match genotype.ploidy() {
        1 => frequencies[&genotype[0]].ln(),
        2 => {
            if genotype.is_homozygous() {
                2.0 * frequencies[&genotype[0]].ln()
            } else {
                frequencies[&genotype[0]].ln() + frequencies[&genotype[1]].ln() + ln_small(2)
            }
        }
        _ => {
            let mut multiplicities = Vec::with_capacity(genotype.zygosity() as usize);
            let mut result = 0.0;
            for (handle, count) in genotype.unique_counts() {
                multiplicities.push(count);
                result += f64::from(count) * frequencies[&handle].ln();
            }
            ln_multinomial_coefficient(&multiplicities) + result
        }
    }
}
