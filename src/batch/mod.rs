//! Splitting a generated sequence into bounded, ordered batches.

use std::num::NonZeroUsize;

/// Number of batches `len` items produce with at most `max` per batch.
///
/// `None` means unbounded: one batch. An empty sequence produces none.
pub fn batch_count(len: usize, max: Option<NonZeroUsize>) -> usize {
    match (len, max) {
        (0, _) => 0,
        (_, None) => 1,
        (len, Some(max)) => len.div_ceil(max.get()),
    }
}

/// Split `items` into consecutive batches of at most `max` items.
///
/// Every batch but the last holds exactly `max` items, and concatenating
/// the batches reproduces `items` in order.
///
/// ```
/// use ebo_factory::batch::split_batches;
/// use std::num::NonZeroUsize;
///
/// let items: Vec<u32> = (1..=5).collect();
/// let batches = split_batches(&items, NonZeroUsize::new(2));
/// assert_eq!(batches, vec![&[1, 2][..], &[3, 4][..], &[5][..]]);
/// ```
pub fn split_batches<T>(items: &[T], max: Option<NonZeroUsize>) -> Vec<&[T]> {
    match max {
        _ if items.is_empty() => Vec::new(),
        None => vec![items],
        Some(max) => items.chunks(max.get()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fifteen_by_two() {
        let items: Vec<usize> = (0..15).collect();
        let batches = split_batches(&items, NonZeroUsize::new(2));
        let sizes: Vec<_> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, [2, 2, 2, 2, 2, 2, 2, 1]);
        assert_eq!(batch_count(15, NonZeroUsize::new(2)), 8);
    }

    #[test]
    fn test_unbounded_is_single_batch() {
        let items = [1, 2, 3];
        assert_eq!(split_batches(&items, None), [&items[..]]);
        assert_eq!(batch_count(3, None), 1);
    }

    #[test]
    fn test_empty_input_has_no_batches() {
        let items: [u8; 0] = [];
        assert!(split_batches(&items, None).is_empty());
        assert!(split_batches(&items, NonZeroUsize::new(4)).is_empty());
        assert_eq!(batch_count(0, None), 0);
    }

    proptest! {
        #[test]
        fn prop_batches_concatenate_to_input(len in 1usize..500, max in 1usize..64) {
            let items: Vec<usize> = (0..len).collect();
            let max = NonZeroUsize::new(max);
            let batches = split_batches(&items, max);

            prop_assert_eq!(batches.len(), batch_count(len, max));
            prop_assert_eq!(batches.concat(), items);
        }

        #[test]
        fn prop_only_last_batch_is_short(len in 1usize..500, max in 1usize..64) {
            let items: Vec<usize> = (0..len).collect();
            let batches = split_batches(&items, NonZeroUsize::new(max));
            let (last, full) = batches.split_last().unwrap();

            prop_assert!(full.iter().all(|batch| batch.len() == max));
            prop_assert_eq!(last.len(), len - full.len() * max);
            prop_assert!(!last.is_empty());
        }
    }
}
