use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::thread;
use std::time::Duration;

use anyhow::Result;

pub mod stats;

/// Counts occurrences of (skip/warning) reasons without losing any event.
#[derive(Debug)]
pub struct SimpleCounter<T>
where
    T: Eq + Hash + Debug,
{
    inner: HashMap<T, usize>,
    total_count: usize,
}

impl<T> Default for SimpleCounter<T>
where
    T: Eq + Hash + Debug,
{
    fn default() -> Self {
        SimpleCounter {
            inner: HashMap::new(),
            total_count: 0,
        }
    }
}

impl<T> SimpleCounter<T>
where
    T: Eq + Hash + Debug,
{
    pub fn incr(&mut self, event: T) {
        self.total_count += 1;
        *self.inner.entry(event).or_insert(0) += 1;
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn iter(&self) -> hash_map::Iter<T, usize> {
        self.inner.iter()
    }
}

/// Retry a transient operation with doubling backoff. Returns the first
/// success, or the last error once `attempts` tries are exhausted.
pub fn with_backoff<T, F>(attempts: u32, base_delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    assert!(attempts >= 1);
    let mut delay = base_delay;
    let mut last_err = None;
    for attempt in 0..attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt + 1 < attempts {
                    debug!("transient failure (attempt {}): {}; retrying", attempt + 1, e);
                    thread::sleep(delay);
                    delay *= 2;
                }
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap())
}

/// Does the sequence contain the unknown base 'N' (either case)?
pub fn has_ns(sequence: &[u8]) -> bool {
    sequence.iter().any(|&base| base == b'N' || base == b'n')
}

/// Uppercase the IUPAC bases we care about, leaving other bytes alone.
pub fn capitalize(sequence: &mut [u8]) {
    for base in sequence.iter_mut() {
        if let b'a' | b'c' | b'g' | b't' | b'u' | b'n' = *base {
            *base = base.to_ascii_uppercase();
        }
    }
}

fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' | b'U' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' | b'u' => b'a',
        _ => b'N',
    }
}

pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence.iter().rev().map(|&b| complement(b)).collect()
}
