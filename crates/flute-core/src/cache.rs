use crate::transfer_matrix::TransferMatrix;
use tracing::trace;

/// Remembers the last full-span matrix computed for one node of the
/// cascade.
///
/// Keys are compared by exact bit pattern, so a query must repeat the same
/// `f64` values to hit. Storing replaces the previous entry.
#[derive(Debug, Clone, Default)]
pub struct MatrixCache {
    entry: Option<(CacheKey, TransferMatrix)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    frequency: u64,
    entry_ratio: u64,
}

impl CacheKey {
    fn new(frequency: f64, entry_ratio: f64) -> Self {
        Self {
            frequency: frequency.to_bits(),
            entry_ratio: entry_ratio.to_bits(),
        }
    }
}

impl MatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached matrix for `frequency`, if present.
    pub fn get(&self, frequency: f64) -> Option<TransferMatrix> {
        self.get_scaled(frequency, 1.0)
    }

    /// Cached matrix for `frequency` computed at `entry_ratio`.
    pub fn get_scaled(&self, frequency: f64, entry_ratio: f64) -> Option<TransferMatrix> {
        let key = CacheKey::new(frequency, entry_ratio);
        match self.entry {
            Some((k, m)) if k == key => Some(m),
            _ => None,
        }
    }

    pub fn store(&mut self, frequency: f64, matrix: TransferMatrix) {
        self.store_scaled(frequency, 1.0, matrix);
    }

    pub fn store_scaled(&mut self, frequency: f64, entry_ratio: f64, matrix: TransferMatrix) {
        trace!(frequency, entry_ratio, "caching transfer matrix");
        self.entry = Some((CacheKey::new(frequency, entry_ratio), matrix));
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}
