//! Stable cache keys for synthesized judgments.
//!
//! The key is a SHA-256 digest over the task and the set of responses, so a
//! host cache can skip re-judging an identical input set. Responses are sorted
//! before hashing because upstream collection order is not guaranteed. Storage,
//! expiry and eviction belong to the host.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::types::ExpertResponse;

/// Bumped whenever the hashed layout changes, so stale keys can never collide.
const KEY_VERSION: &[u8] = b"council-synthesis-v1";

/// Hex-encoded SHA-256 cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynthesisCacheKey(String);

impl SynthesisCacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SynthesisCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SynthesisCacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the cache key for `task` and `responses`.
///
/// Any permutation of `responses` gives the same key. Changing the task or any
/// response's model, output or status gives a different one. Every field is
/// length-prefixed so adjacent fields cannot alias.
pub fn compute_cache_key(task: &str, responses: &[ExpertResponse]) -> SynthesisCacheKey {
    let mut ordered: Vec<&ExpertResponse> = responses.iter().collect();
    ordered.sort_by(|a, b| {
        a.expert_id
            .cmp(&b.expert_id)
            .then_with(|| a.model.cmp(&b.model))
            .then_with(|| a.output.cmp(&b.output))
            .then_with(|| a.status.tag().cmp(&b.status.tag()))
    });

    let mut hasher = Sha256::new();
    update_field(&mut hasher, KEY_VERSION);
    update_field(&mut hasher, task.as_bytes());
    hasher.update((ordered.len() as u64).to_le_bytes());
    for response in ordered {
        update_field(&mut hasher, response.model.as_bytes());
        update_field(&mut hasher, response.output.as_bytes());
        hasher.update([response.status.tag()]);
    }
    SynthesisCacheKey(format!("{:x}", hasher.finalize()))
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
