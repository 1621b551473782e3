//! Bin-level mapping, parallel when the `rayon` feature is enabled.
//!
//! Speed bins never share mutable state during fitting or solving, so the
//! per-bin closures are mapped independently. Output order always matches
//! input order.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Map `f` over `items`, preserving order.
#[cfg(feature = "rayon")]
pub fn map_ordered<I, T, F>(items: &[I], f: F) -> Vec<T>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync + Send,
{
    items.par_iter().map(f).collect()
}

/// Map `f` over `items`, preserving order.
#[cfg(not(feature = "rayon"))]
pub fn map_ordered<I, T, F>(items: &[I], f: F) -> Vec<T>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync + Send,
{
    items.iter().map(f).collect()
}
