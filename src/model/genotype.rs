//! Genotypes as canonical multisets of haplotype handles, and their
//! enumeration.

use std::ops::Index;

use itertools::Itertools;

use crate::haplotypes::HaplotypeHandle;

/// An immutable multiset of haplotype handles; its size is the ploidy.
///
/// Handles are normalized to ascending order on construction, so two
/// genotypes built from permutations of the same handles compare equal and
/// hash identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genotype {
    handles: Vec<HaplotypeHandle>,
}

impl Genotype {
    pub fn new(handles: impl IntoIterator<Item = HaplotypeHandle>) -> Self {
        let mut handles: Vec<_> = handles.into_iter().collect();
        handles.sort_unstable();
        Genotype { handles }
    }

    /// The empty genotype (ploidy 0); its likelihood is 0 by convention.
    pub fn empty() -> Self {
        Genotype {
            handles: Vec::new(),
        }
    }

    pub fn ploidy(&self) -> u32 {
        self.handles.len() as u32
    }

    /// Number of distinct haplotypes.
    pub fn zygosity(&self) -> u32 {
        self.unique().count() as u32
    }

    pub fn is_homozygous(&self) -> bool {
        !self.handles.is_empty() && self.handles.first() == self.handles.last()
    }

    /// Multiplicity of a handle within the genotype.
    pub fn count(&self, handle: HaplotypeHandle) -> u32 {
        self.handles.iter().filter(|&&h| h == handle).count() as u32
    }

    /// Distinct handles in ascending order, each visited once.
    pub fn unique(&self) -> impl Iterator<Item = HaplotypeHandle> + '_ {
        self.handles.iter().copied().dedup()
    }

    /// All handles in canonical order, duplicates included.
    pub fn iter(&self) -> impl Iterator<Item = HaplotypeHandle> + '_ {
        self.handles.iter().copied()
    }

    /// Distinct handles paired with their multiplicities, ascending.
    pub fn unique_counts(&self) -> impl Iterator<Item = (HaplotypeHandle, u32)> + '_ {
        self.handles
            .iter()
            .copied()
            .dedup_with_count()
            .map(|(count, handle)| (handle, count as u32))
    }
}

impl Index<usize> for Genotype {
    type Output = HaplotypeHandle;

    fn index(&self, index: usize) -> &HaplotypeHandle {
        &self.handles[index]
    }
}

/// Number of genotypes of the given ploidy over `n` haplotypes:
/// `C(n + ploidy - 1, ploidy)`.
pub fn num_genotypes(n: usize, ploidy: u32) -> u64 {
    let mut result = 1u64;
    for i in 1..=u64::from(ploidy) {
        result = result * (n as u64 + i - 1) / i;
    }
    result
}

/// All multisets of size `ploidy` drawn with replacement from `haplotypes`,
/// in a deterministic order (non-decreasing handle tuples over the sorted
/// handle set).
pub fn enumerate_genotypes(haplotypes: &[HaplotypeHandle], ploidy: u32) -> Vec<Genotype> {
    let mut sorted = haplotypes.to_vec();
    sorted.sort_unstable();
    sorted
        .into_iter()
        .combinations_with_replacement(ploidy as usize)
        .map(Genotype::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn handles(set_size: usize) -> Vec<HaplotypeHandle> {
        use crate::haplotypes::{Haplotype, HaplotypeSet};
        use crate::variants::GenomicRegion;
        let region = GenomicRegion::new("1", 0, 4);
        let mut set =
            HaplotypeSet::with_reference(Haplotype::new(region.clone(), b"ACGT".to_vec(), vec![]));
        for _ in 1..set_size {
            set.push(Haplotype::new(region.clone(), b"ACGA".to_vec(), vec![
                crate::variants::Variant::new(3, "T", "A"),
            ]));
        }
        set.handles().collect()
    }

    #[test]
    fn multiset_semantics() {
        let h = handles(3);
        let genotype = Genotype::new(vec![h[2], h[0], h[2]]);
        assert_eq!(genotype.ploidy(), 3);
        assert_eq!(genotype.zygosity(), 2);
        assert!(!genotype.is_homozygous());
        assert_eq!(genotype.count(h[2]), 2);
        assert_eq!(genotype.count(h[0]), 1);
        assert_eq!(genotype.count(h[1]), 0);
        assert_eq!(genotype[0], h[0]);
        assert_eq!(genotype[1], h[2]);
        assert_eq!(genotype[2], h[2]);
        assert_eq!(genotype.unique().collect::<Vec<_>>(), vec![h[0], h[2]]);
        assert_eq!(
            genotype.unique_counts().collect::<Vec<_>>(),
            vec![(h[0], 1), (h[2], 2)]
        );
    }

    #[test]
    fn equality_and_hash_are_order_invariant() {
        let h = handles(3);
        let a = Genotype::new(vec![h[0], h[1], h[2]]);
        let b = Genotype::new(vec![h[2], h[0], h[1]]);
        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn empty_genotype() {
        let genotype = Genotype::empty();
        assert_eq!(genotype.ploidy(), 0);
        assert_eq!(genotype.zygosity(), 0);
        assert!(!genotype.is_homozygous());
    }

    #[test]
    fn enumeration_size_and_determinism() {
        let h = handles(4);
        for &ploidy in &[1u32, 2, 3, 4] {
            let genotypes = enumerate_genotypes(&h, ploidy);
            assert_eq!(genotypes.len() as u64, num_genotypes(h.len(), ploidy));
            // all distinct
            let distinct: HashSet<_> = genotypes.iter().cloned().collect();
            assert_eq!(distinct.len(), genotypes.len());
            // deterministic regardless of input order
            let mut shuffled = h.clone();
            shuffled.reverse();
            assert_eq!(enumerate_genotypes(&shuffled, ploidy), genotypes);
        }
    }

    #[test]
    fn enumeration_counts() {
        assert_eq!(num_genotypes(4, 2), 10);
        assert_eq!(num_genotypes(4, 3), 20);
        assert_eq!(num_genotypes(1, 5), 1);
        assert_eq!(num_genotypes(3, 0), 1);
    }

    #[test]
    fn enumeration_of_ploidy_zero_is_the_empty_genotype() {
        let h = handles(3);
        let genotypes = enumerate_genotypes(&h, 0);
        assert_eq!(genotypes, vec![Genotype::empty()]);
    }
}
