//! Process-wide reference sequence access.
//!
//! A lazy, read-mostly buffer over an indexed FASTA. Whole contigs are
//! loaded on first use and shared as `Arc` slices; entries are immutable
//! after insert, so readers never block each other once a contig is
//! present. Total cached bytes are bounded by the configured footprint,
//! evicting least-recently-used contigs first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Result;
use bio::io::fasta;
use lru_time_cache::LruCache;

use crate::config::MemoryFootprint;
use crate::variants::GenomicRegion;

struct SequenceCache {
    // the value carries an access stamp; eviction picks the smallest one,
    // the entry capacity only needs to exceed any plausible contig count
    entries: LruCache<String, (Arc<Vec<u8>>, u64)>,
    cached_bytes: usize,
    max_bytes: usize,
    clock: u64,
}

impl SequenceCache {
    fn new(max_bytes: usize) -> Self {
        SequenceCache {
            entries: LruCache::with_capacity(4096),
            cached_bytes: 0,
            max_bytes,
            clock: 0,
        }
    }

    fn get(&mut self, contig: &str) -> Option<Arc<Vec<u8>>> {
        self.clock += 1;
        let clock = self.clock;
        self.entries.get_mut(contig).map(|(sequence, stamp)| {
            *stamp = clock;
            Arc::clone(sequence)
        })
    }

    fn insert(&mut self, contig: String, sequence: Arc<Vec<u8>>) {
        self.clock += 1;
        self.cached_bytes += sequence.len();
        self.entries.insert(contig, (sequence, self.clock));
        while self.cached_bytes > self.max_bytes && self.entries.len() > 1 {
            let victim = self
                .entries
                .peek_iter()
                .min_by_key(|(_, (_, stamp))| *stamp)
                .map(|(contig, _)| contig.clone())
                .unwrap();
            if let Some((evicted, _)) = self.entries.remove(&victim) {
                self.cached_bytes -= evicted.len();
                debug!("evicted contig {} from the reference cache", victim);
            }
        }
    }
}

/// A lazy buffer for reference sequences.
pub struct ReferenceBuffer {
    reader: RwLock<fasta::IndexedReader<fs::File>>,
    sequences: Mutex<SequenceCache>,
    reference_path: PathBuf,
}

impl ReferenceBuffer {
    pub fn from_path<P: AsRef<Path> + std::fmt::Debug>(path: P, footprint: MemoryFootprint) -> Result<Self> {
        let reader = fasta::IndexedReader::from_file(&path)?;
        Ok(ReferenceBuffer {
            reader: RwLock::new(reader),
            sequences: Mutex::new(SequenceCache::new(footprint.bytes())),
            reference_path: path.as_ref().to_path_buf(),
        })
    }

    pub fn reference_path(&self) -> &Path {
        &self.reference_path
    }

    /// Contigs of the reference in index order, with their sizes.
    pub fn contigs(&self) -> Vec<(String, u64)> {
        self.reader
            .read()
            .unwrap()
            .index
            .sequences()
            .into_iter()
            .map(|seq| (seq.name, seq.len))
            .collect()
    }

    /// One whole-contig region per contig, in index order; the default
    /// target when no regions are requested explicitly.
    pub fn contig_regions(&self) -> Vec<GenomicRegion> {
        self.contigs()
            .into_iter()
            .map(|(name, len)| GenomicRegion::new(name, 0, len))
            .collect()
    }

    /// Load the given contig. O(1) once cached.
    pub fn sequence(&self, contig: &str) -> Result<Arc<Vec<u8>>> {
        {
            let mut sequences = self.sequences.lock().unwrap();
            if let Some(sequence) = sequences.get(contig) {
                return Ok(sequence);
            }
        }

        // miss: load outside the cache lock, then publish
        let mut buffer = Vec::new();
        {
            let mut reader = self.reader.write().unwrap();
            reader.fetch_all(contig)?;
            reader.read(&mut buffer)?;
        }
        let sequence = Arc::new(buffer);
        self.sequences
            .lock()
            .unwrap()
            .insert(contig.to_owned(), Arc::clone(&sequence));
        Ok(sequence)
    }

    /// Slice of a region's sequence, loading its contig if necessary.
    pub fn region_sequence(&self, region: &GenomicRegion) -> Result<Vec<u8>> {
        let contig = self.sequence(region.contig())?;
        let start = region.start() as usize;
        let end = (region.end() as usize).min(contig.len());
        Ok(contig[start.min(end)..end].to_vec())
    }
}
