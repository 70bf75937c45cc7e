//! Batch scheduling for listing pages
//!
//! Pages `1..=N` are split into consecutive batches of at most `C` pages.
//! Batches run strictly in order; every page inside a batch runs at once, so
//! `C` is also the bound on pages in flight.

/// Partitions pages `1..=pages` into ordered batches of at most `concurrency`
///
/// A `concurrency` of zero is treated as one.
///
/// # Example
///
/// ```
/// use shopcrawl::crawler::partition_batches;
///
/// let batches = partition_batches(10, 4);
/// assert_eq!(batches, vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 10]]);
/// ```
pub fn partition_batches(pages: u32, concurrency: u32) -> Vec<Vec<u32>> {
    let size = concurrency.max(1) as usize;
    let all: Vec<u32> = (1..=pages).collect();
    all.chunks(size).map(<[u32]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uneven_partition() {
        let batches = partition_batches(10, 4);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(batches[2], vec![9, 10]);
    }

    #[test]
    fn test_pages_keep_order() {
        let flattened: Vec<u32> = partition_batches(7, 3).into_iter().flatten().collect();
        assert_eq!(flattened, (1..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_fewer_pages_than_concurrency() {
        assert_eq!(partition_batches(2, 4), vec![vec![1, 2]]);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(partition_batches(0, 4).is_empty());
        assert_eq!(partition_batches(3, 0).len(), 3);
    }
}
