//! Haplotypes and the per-region working set that owns them.
//!
//! Downstream code never holds haplotypes directly; it refers to them by
//! [`HaplotypeHandle`], an index into the region's [`HaplotypeSet`].
//! Handles are stable for the lifetime of one region's processing and
//! meaningless across regions.

use anyhow::Result;

use crate::utils;
use crate::variants::{GenomicRegion, Variant};

/// Opaque identifier of a haplotype within one region's working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HaplotypeHandle(u32);

impl HaplotypeHandle {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A candidate sequence over a region, assembled from a subset of the
/// region's candidate variants applied to the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Haplotype {
    region: GenomicRegion,
    sequence: Vec<u8>,
    variants: Vec<Variant>,
}

impl Haplotype {
    pub fn new(region: GenomicRegion, sequence: Vec<u8>, variants: Vec<Variant>) -> Self {
        Haplotype {
            region,
            sequence,
            variants,
        }
    }

    pub fn region(&self) -> &GenomicRegion {
        &self.region
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn contains_ns(&self) -> bool {
        utils::has_ns(&self.sequence)
    }

    pub fn is_reference(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Arena of the haplotypes proposed for one region. The first entry is
/// always the reference haplotype.
#[derive(Debug)]
pub struct HaplotypeSet {
    haplotypes: Vec<Haplotype>,
}

impl HaplotypeSet {
    pub fn with_reference(reference: Haplotype) -> Self {
        assert!(reference.is_reference());
        HaplotypeSet {
            haplotypes: vec![reference],
        }
    }

    pub fn push(&mut self, haplotype: Haplotype) -> HaplotypeHandle {
        assert!(
            haplotype.region() == self.haplotypes[0].region(),
            "haplotype region mismatch within one working set"
        );
        let handle = HaplotypeHandle(self.haplotypes.len() as u32);
        self.haplotypes.push(haplotype);
        handle
    }

    pub fn reference_handle(&self) -> HaplotypeHandle {
        HaplotypeHandle(0)
    }

    pub fn get(&self, handle: HaplotypeHandle) -> &Haplotype {
        &self.haplotypes[handle.index()]
    }

    pub fn len(&self) -> usize {
        self.haplotypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.haplotypes.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = HaplotypeHandle> {
        (0..self.haplotypes.len() as u32).map(HaplotypeHandle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HaplotypeHandle, &Haplotype)> {
        self.haplotypes
            .iter()
            .enumerate()
            .map(|(i, h)| (HaplotypeHandle(i as u32), h))
    }
}

/// Assembles the candidate haplotypes of a region; the graph construction
/// behind it lives upstream.
pub trait HaplotypeBuilder {
    fn build(&self, region: &GenomicRegion, candidates: &[Variant]) -> Result<HaplotypeSet>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(region: &GenomicRegion) -> Haplotype {
        Haplotype::new(region.clone(), b"ACGTACGT".to_vec(), vec![])
    }

    #[test]
    fn handles_are_dense_and_stable() {
        let region = GenomicRegion::new("1", 0, 8);
        let mut set = HaplotypeSet::with_reference(reference(&region));
        let h1 = set.push(Haplotype::new(
            region.clone(),
            b"ACGAACGT".to_vec(),
            vec![Variant::new(3, "T", "A")],
        ));
        let h2 = set.push(Haplotype::new(
            region.clone(),
            b"ACGTACGA".to_vec(),
            vec![Variant::new(7, "T", "A")],
        ));
        assert_eq!(set.len(), 3);
        assert_eq!(set.reference_handle().index(), 0);
        assert_eq!(h1.index(), 1);
        assert_eq!(h2.index(), 2);
        assert_eq!(set.get(h1).sequence(), b"ACGAACGT");
        assert!(set.get(set.reference_handle()).is_reference());
        let handles: Vec<_> = set.handles().collect();
        assert_eq!(handles, vec![set.reference_handle(), h1, h2]);
    }

    #[test]
    fn n_detection_uses_sequence_content() {
        let region = GenomicRegion::new("1", 0, 4);
        let plain = Haplotype::new(region.clone(), b"ACGT".to_vec(), vec![]);
        let with_n = Haplotype::new(region, b"ACNT".to_vec(), vec![]);
        assert!(!plain.contains_ns());
        assert!(with_n.contains_ns());
    }
}
