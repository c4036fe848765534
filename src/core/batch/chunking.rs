//! Size-bounded chunking of a partition group
//!
//! Chunks are cut purely by item count. Callers with large or uneven items
//! must pick a conservative size, since the service also limits the payload
//! of a single transaction.

use std::iter::FusedIterator;

/// Lazy iterator over consecutive chunks of at most `size` items
#[derive(Debug)]
pub struct Chunks<T> {
    items: std::vec::IntoIter<T>,
    size: usize,
}

impl<T> Iterator for Chunks<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<T> = self.items.by_ref().take(self.size).collect();
        if chunk.is_empty() { None } else { Some(chunk) }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let chunks = self.items.len().div_ceil(self.size);
        (chunks, Some(chunks))
    }
}

impl<T> ExactSizeIterator for Chunks<T> {}

impl<T> FusedIterator for Chunks<T> {}

/// Split `items` into chunks of at most `size` items, preserving order
///
/// A `size` of zero is treated as one.
pub fn chunk_group<T>(items: Vec<T>, size: usize) -> Chunks<T> {
    Chunks {
        items: items.into_iter(),
        size: size.max(1),
    }
}
