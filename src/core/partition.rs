//! Partitioned parallel execution.
//!
//! Work lists are split into contiguous chunks and each chunk runs on its own
//! scoped thread. Every chunk runs to completion; the first failure in chunk
//! order is reported.

use crate::error::{Error, Result};

/// Split `items` into at most `n_partitions` contiguous chunks of equal size
/// (the last one may be shorter).
pub fn partition<T>(items: &[T], n_partitions: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }
    let n_partitions = n_partitions.max(1);
    let chunk_size = items.len().div_ceil(n_partitions);
    items.chunks(chunk_size).collect()
}

pub fn run_partitioned<T, F>(items: &[T], n_partitions: usize, task: F) -> Result<()>
where
    T: Sync,
    F: Fn(&[T]) -> Result<()> + Sync,
{
    let chunks = partition(items, n_partitions);
    match chunks.len() {
        0 => return Ok(()),
        1 => return task(chunks[0]),
        _ => {}
    }

    let task = &task;
    std::thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| scope.spawn(move || task(chunk)))
            .collect();

        let mut first_error = None;
        for handle in handles {
            let outcome = handle
                .join()
                .map_err(|_| Error::internal_unexpected("Partition worker thread panicked"))
                .and_then(|result| result);
            if let Err(err) = outcome {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn partition_sizes_follow_ceiling_division() {
        let items: Vec<u32> = (0..10).collect();
        let chunks = partition(&items, 4);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
    }

    #[test]
    fn partition_never_exceeds_item_count() {
        let items = vec!["a", "b"];
        assert_eq!(partition(&items, 20).len(), 2);
        assert!(partition::<u8>(&[], 20).is_empty());
        assert_eq!(partition(&items, 0).len(), 1);
    }

    #[test]
    fn every_item_is_processed_once() {
        let items: Vec<usize> = (0..57).collect();
        let seen = Mutex::new(Vec::new());
        let calls = AtomicUsize::new(0);

        run_partitioned(&items, 8, |chunk| {
            calls.fetch_add(1, Ordering::SeqCst);
            seen.lock().unwrap().extend_from_slice(chunk);
            Ok(())
        })
        .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, items);
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn first_failing_chunk_is_reported() {
        let items: Vec<usize> = (0..6).collect();
        let err = run_partitioned(&items, 3, |chunk| {
            if chunk.contains(&2) || chunk.contains(&5) {
                Err(Error::internal_unexpected(format!("chunk {:?}", chunk)))
            } else {
                Ok(())
            }
        })
        .unwrap_err();

        assert_eq!(err.details["error"], "chunk [2, 3]");
    }
}
