//! Candidates taken from a user-supplied VCF/BCF.
//!
//! Each record yields one candidate per ALT allele. Ref/alt pairs are
//! left-trimmed by their common prefix, advancing the position by the
//! prefix length; a pair without a common prefix (e.g. a plain SNV) is
//! emitted verbatim at the record position. No right-trimming is
//! performed, matching how the proposed alleles are later applied to the
//! reference.

use anyhow::Result;
use rust_htslib::bcf::{self, Read};
use strum_macros::{Display, EnumString};

use crate::candidates::CandidateGenerator;
use crate::errors;
use crate::utils::SimpleCounter;
use crate::variants::{GenomicRegion, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum SkipReason {
    #[strum(serialize = "symbolic ALT alleles (SVs are proposed elsewhere)")]
    SymbolicAlt,
    #[strum(serialize = "spanning-deletion placeholder alleles")]
    SpanningDeletion,
}

/// Left-trim a ref/alt pair per the record-decomposition contract.
/// Degenerate records with identical alleles pass through untouched.
pub(crate) fn trimmed(pos: u64, ref_allele: &[u8], alt_allele: &[u8]) -> Variant {
    if ref_allele == alt_allele {
        return Variant::new(pos, ref_allele, alt_allele);
    }
    let prefix = ref_allele
        .iter()
        .zip(alt_allele)
        .take_while(|(a, b)| a == b)
        .count();
    Variant::new(
        pos + prefix as u64,
        &ref_allele[prefix..],
        &alt_allele[prefix..],
    )
}

fn is_symbolic(allele: &[u8]) -> bool {
    allele.first() == Some(&b'<')
        || allele.iter().any(|&b| b == b'[' || b == b']')
}

pub struct ExternalCandidates {
    reader: bcf::IndexedReader,
    skips: SimpleCounter<SkipReason>,
}

impl ExternalCandidates {
    pub fn from_path(path: &str) -> Result<Self> {
        Ok(ExternalCandidates {
            reader: bcf::IndexedReader::from_path(path)?,
            skips: SimpleCounter::default(),
        })
    }

    fn display_skips(&self) {
        for (reason, &count) in self.skips.iter() {
            if count > 0 {
                info!("Skipped {} {}.", count, reason);
            }
        }
    }
}

impl CandidateGenerator for ExternalCandidates {
    fn generate(&mut self, region: &GenomicRegion) -> Result<Vec<Variant>> {
        let rid = self
            .reader
            .header()
            .name2rid(region.contig().as_bytes())
            .map_err(|_| errors::Error::UnknownContig {
                contig: region.contig().to_owned(),
            })?;
        self.reader.fetch(rid, region.start(), Some(region.end()))?;

        let mut candidates = Vec::new();
        let mut last_pos = 0u64;
        let mut record = self.reader.empty_record();
        while let Some(result) = self.reader.read(&mut record) {
            result?;
            let pos = record.pos() as u64;
            if pos < last_pos {
                return Err(errors::Error::UnsortedCandidateFile {
                    contig: region.contig().to_owned(),
                    pos,
                }
                .into());
            }
            last_pos = pos;
            if !region.contains(pos) {
                continue;
            }
            let alleles = record.alleles();
            let ref_allele = alleles[0].to_owned();
            for &alt_allele in &alleles[1..] {
                if alt_allele == b"*" {
                    self.skips.incr(SkipReason::SpanningDeletion);
                } else if is_symbolic(alt_allele) {
                    self.skips.incr(SkipReason::SymbolicAlt);
                } else {
                    candidates.push(trimmed(pos, &ref_allele, alt_allele));
                }
            }
        }
        if self.skips.total_count() > 0 {
            self.display_skips();
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_left_trimmed_by_their_common_prefix() {
        assert_eq!(trimmed(100, b"ACGT", b"ACGG"), Variant::new(103, "T", "G"));
        assert_eq!(trimmed(100, b"AT", b"A"), Variant::new(101, "T", ""));
        assert_eq!(trimmed(100, b"A", b"AT"), Variant::new(101, "", "T"));
        // no common prefix: verbatim at the record position
        assert_eq!(trimmed(100, b"A", b"T"), Variant::new(100, "A", "T"));
    }

    #[test]
    fn trimming_advances_by_the_full_common_prefix() {
        assert_eq!(trimmed(50, b"ACGTT", b"ACG"), Variant::new(53, "TT", ""));
        // mismatch inside the shorter allele stops the trim early
        assert_eq!(trimmed(50, b"ACGT", b"AT"), Variant::new(51, "CGT", "T"));
    }

    #[test]
    fn no_right_trimming_is_performed() {
        // a naive canonicalizer would strip the shared suffix; we must not
        assert_eq!(trimmed(10, b"CAA", b"CA"), Variant::new(12, "A", ""));
        assert_eq!(trimmed(10, b"TTA", b"TA"), Variant::new(11, "TA", "A"));
    }

    #[test]
    fn symbolic_alleles_are_recognized() {
        assert!(is_symbolic(b"<DEL>"));
        assert!(is_symbolic(b"A[2:1000["));
        assert!(is_symbolic(b"]2:1000]A"));
        assert!(!is_symbolic(b"ACGT"));
    }
}
