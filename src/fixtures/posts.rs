//! Social-media style posts partitioned by author

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "John",
    "Ken", "Leslie", "Margaret", "Niklaus", "Radia", "Tony",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Backus", "Dijkstra", "Hamilton", "Hoare", "Hopper", "Kay", "Knuth", "Lamport",
    "Liskov", "Lovelace", "Perlman", "Ritchie", "Thompson", "Turing", "Wirth",
];

const WORDS: &[&str] = &[
    "batch", "quick", "partition", "latency", "write", "retry", "cloud", "document", "service",
    "request", "stream", "today", "again", "finally", "shipped", "review",
];

/// A post document; `author` is the partition key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEntity {
    #[serde(rename = "id")]
    pub id: Uuid,
    pub author: String,
    pub date_posted: DateTime<Utc>,
    pub message: String,
    pub likes: u32,
}

impl PostEntity {
    pub fn partition_key(&self) -> &str {
        &self.author
    }
}

/// Shape of a seeded data set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    pub authors: usize,
    pub min_posts_per_author: usize,
    pub max_posts_per_author: usize,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            authors: 10_000,
            min_posts_per_author: 2,
            max_posts_per_author: 20,
        }
    }
}

/// Generate posts for `options.authors` distinct authors
///
/// Each author gets between the minimum and maximum number of posts
/// (inclusive), dated within the last 30 days. Posts of one author are
/// contiguous in the output.
pub fn seed_posts<R: Rng + ?Sized>(options: &SeedOptions, rng: &mut R) -> Vec<PostEntity> {
    let min = options.min_posts_per_author;
    let max = options.max_posts_per_author.max(min);
    let now = Utc::now();

    let mut posts = Vec::new();
    for index in 0..options.authors {
        let author = author_name(index, rng);
        let count = rng.gen_range(min..=max);
        posts.extend((0..count).map(|_| random_post(&author, now, rng)));
    }
    posts
}

fn author_name<R: Rng + ?Sized>(index: usize, rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Anon");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Author");
    // Suffix keeps names unique for any author count
    format!("{} {} #{}", first, last, index + 1)
}

fn random_post<R: Rng + ?Sized>(author: &str, now: DateTime<Utc>, rng: &mut R) -> PostEntity {
    let words: Vec<&str> = (0..5).filter_map(|_| WORDS.choose(rng).copied()).collect();
    let mut message = words.join(" ");
    if let Some(first) = message.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    message.push('.');

    PostEntity {
        id: uuid::Builder::from_random_bytes(rng.r#gen()).into_uuid(),
        author: author.to_string(),
        date_posted: now - Duration::seconds(rng.gen_range(0..30 * 24 * 3600)),
        message,
        likes: rng.gen_range(0..=1000),
    }
}
