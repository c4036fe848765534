//! In-memory emulator integration tests
//!
//! Runs synthetic posts through the writer into the emulator, the same path
//! the binary takes.

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::common::assertions::SummaryAssertions;
    use crate::common::{TestItem, fast_config};
    use partition_writer::fixtures::{PostEntity, SeedOptions, seed_posts};
    use partition_writer::{
        InMemoryDocumentStore, InMemoryStoreConfig, PartitionKey, PartitionedWriter,
    };
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn seeded_posts(authors: usize) -> Vec<PostEntity> {
        let options = SeedOptions {
            authors,
            min_posts_per_author: 2,
            max_posts_per_author: 20,
        };
        seed_posts(&options, &mut StdRng::seed_from_u64(2024))
    }

    #[tokio::test]
    async fn test_posts_by_author() {
        let posts = seeded_posts(200);
        let total = posts.len();
        let authors: HashSet<String> = posts.iter().map(|post| post.author.clone()).collect();
        let sample = posts[0].clone();

        let store = InMemoryDocumentStore::new(InMemoryStoreConfig::default());
        let writer = PartitionedWriter::new(Arc::new(store.clone()), fast_config()).unwrap();
        let summary = writer
            .insert_partitioned(posts, |post| post.author.clone())
            .await
            .unwrap();

        assert!(summary.is_complete());
        assert_eq!(summary.partitions, authors.len());
        assert_eq!(store.document_count(), total);
        assert_eq!(store.partition_count(), authors.len());
        assert_approx_eq!(summary.total_cost_units, 5.71 * total as f64, 1e-3);
        summary.assert_accounted();

        let stored = store
            .get(&PartitionKey::from(&sample.author), &sample.id.to_string())
            .unwrap();
        let roundtrip: PostEntity = serde_json::from_value(stored).unwrap();
        assert_eq!(roundtrip, sample);
    }

    /// Writing the same posts twice fails every item of the second run as a conflict
    #[tokio::test]
    async fn test_second_insert_conflicts() {
        let posts = seeded_posts(20);
        let total = posts.len() as u64;

        let store = InMemoryDocumentStore::default();
        let writer = PartitionedWriter::new(Arc::new(store.clone()), fast_config()).unwrap();
        writer
            .insert_partitioned(posts.clone(), |post| post.author.clone())
            .await
            .unwrap();

        let summary = writer
            .insert_partitioned(posts, |post| post.author.clone())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, total);
        assert_eq!(summary.conflicted, total);
        assert_eq!(store.document_count(), total as usize);
    }

    /// A duplicate inside one chunk aborts that chunk atomically
    #[tokio::test]
    async fn test_duplicate_in_chunk_rolls_back_chunk() {
        let store = InMemoryDocumentStore::default();
        let writer = PartitionedWriter::new(Arc::new(store.clone()), fast_config()).unwrap();
        let items = vec![
            TestItem::new("a", "p1"),
            TestItem::new("b", "p1"),
            TestItem::new("a", "p1"),
            TestItem::new("c", "p2"),
        ];

        let summary = writer
            .insert_partitioned(items, |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(summary.failed, 3);
        assert_eq!(summary.conflicted, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(store.partition_len(&PartitionKey::from("p1")), 0);
        assert_eq!(store.partition_len(&PartitionKey::from("p2")), 1);
    }

    /// Identical ids under different keys are distinct documents
    #[tokio::test]
    async fn test_ids_are_scoped_to_partition() {
        let store = InMemoryDocumentStore::default();
        let writer = PartitionedWriter::new(Arc::new(store.clone()), fast_config()).unwrap();
        let items = vec![TestItem::new("same", "p1"), TestItem::new("same", "p2")];

        let summary = writer
            .insert_partitioned(items, |item| item.pk.clone())
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(store.document_count(), 2);
    }
}
