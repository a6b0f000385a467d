//! Property-Based Tests for the Credential Cache
//!
//! Uses proptest to check accounting, expiry, secret stripping and
//! invalidation over generated operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::auth::{hash_token, Credential};
use crate::cache::CredentialCache;
use crate::clock::ManualClock;

// == Test Configuration ==
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates token hashes used as cache keys
fn hash_strategy() -> impl Strategy<Value = String> {
    "[a-f0-9]{4,16}".prop_map(|s| s)
}

fn team_strategy() -> impl Strategy<Value = String> {
    prop_oneof![Just("team_a".to_string()), Just("team_b".to_string())]
}

fn credential(id: &str, team_id: &str, token: &str) -> Credential {
    let now = Utc::now();
    Credential {
        id: id.to_string(),
        team_id: team_id.to_string(),
        user_id: format!("user_{}", id),
        name: "generated".to_string(),
        token: Some(token.to_string()),
        hashed_token: hash_token(token),
        scopes: vec!["read:data".to_string()],
        expires_at: now + chrono::Duration::days(1),
        revoked: false,
        created_at: now,
    }
}

/// Operations applied against the cache
#[derive(Debug, Clone)]
enum CacheOp {
    Set { hash: String, team: String },
    Get { hash: String },
    Exists { hash: String },
    Delete { hash: String },
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (hash_strategy(), team_strategy()).prop_map(|(hash, team)| CacheOp::Set { hash, team }),
        hash_strategy().prop_map(|hash| CacheOp::Get { hash }),
        hash_strategy().prop_map(|hash| CacheOp::Exists { hash }),
        hash_strategy().prop_map(|hash| CacheOp::Delete { hash }),
        (0u64..200_000).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, hits and misses match the outcomes of
    // `get` calls, existence checks never count, and hit_rate is derived.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let clock = ManualClock::new(0);
        let cache = CredentialCache::with_clock(TEST_DEFAULT_TTL, clock.shared());
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;
        let mut expected_sets: u64 = 0;

        for (i, op) in ops.into_iter().enumerate() {
            match op {
                CacheOp::Set { hash, team } => {
                    cache.set(hash, &credential(&format!("k{}", i), &team, "kg_api_x"));
                    expected_sets += 1;
                }
                CacheOp::Get { hash } => match cache.get(&hash) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Exists { hash } => {
                    let _ = cache.exists(&hash);
                }
                CacheOp::Delete { hash } => {
                    let _ = cache.delete(&hash);
                }
                CacheOp::Advance { ms } => clock.advance(ms),
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.sets, expected_sets, "Sets mismatch");
        prop_assert_eq!(stats.size, cache.len(), "Size mismatch");

        let lookups = expected_hits + expected_misses;
        let expected_rate = if lookups == 0 { 0.0 } else { expected_hits as f64 / lookups as f64 };
        prop_assert!((stats.hit_rate - expected_rate).abs() < 1e-9);
    }

    // For any positive TTL, a value is returned until timestamp + ttl and is
    // absent (and a miss) afterwards.
    #[test]
    fn prop_ttl_monotonicity(hash in hash_strategy(), ttl_ms in 1u64..10_000_000, start in 0u64..1_000_000) {
        let clock = ManualClock::new(start);
        let cache = CredentialCache::with_clock(TEST_DEFAULT_TTL, clock.shared());

        cache.set_with_ttl(hash.clone(), &credential("k1", "team_a", "kg_api_x"), Duration::from_millis(ttl_ms));
        prop_assert!(cache.get(&hash).is_some());

        clock.set(start + ttl_ms);
        prop_assert!(cache.get(&hash).is_some(), "still live at the boundary");

        clock.set(start + ttl_ms + 1);
        prop_assert!(cache.get(&hash).is_none());

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, 2);
        prop_assert_eq!(stats.misses, 1);
    }

    // Whatever plaintext token a credential carries, nothing retrievable from
    // the cache contains it.
    #[test]
    fn prop_secret_stripping(secret in "[A-Za-z0-9_-]{16,48}") {
        let token = format!("kg_api_{}", secret);
        let cache = CredentialCache::new(TEST_DEFAULT_TTL);
        let hash = hash_token(&token);

        cache.set(hash.clone(), &credential("k1", "team_a", &token));

        let cached = cache.get(&hash).unwrap();
        let json = serde_json::to_string(&cached).unwrap();
        prop_assert!(!json.contains(&token));
        prop_assert!(!json.contains(&hash));
    }

    // Team invalidation removes exactly the entries of that team.
    #[test]
    fn prop_selective_invalidation(entries in prop::collection::hash_map(hash_strategy(), team_strategy(), 1..40)) {
        let cache = CredentialCache::new(TEST_DEFAULT_TTL);
        for (i, (hash, team)) in entries.iter().enumerate() {
            cache.set(hash.clone(), &credential(&format!("k{}", i), team, "kg_api_x"));
        }

        let team_a: HashSet<&String> = entries.iter().filter(|(_, t)| *t == "team_a").map(|(h, _)| h).collect();
        let removed = cache.delete_by_team_id("team_a");
        prop_assert_eq!(removed, team_a.len());

        for (hash, team) in &entries {
            let present = cache.exists(hash);
            if team == "team_a" {
                prop_assert!(!present, "team_a entry {} should be gone", hash);
            } else {
                prop_assert!(present, "team_b entry {} should remain", hash);
            }
        }
    }
}

// == Concurrent Access ==

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // Concurrent lookups from many threads are all accounted for exactly once.
    #[test]
    fn prop_concurrent_lookups_are_counted_once(
        present in prop::collection::hash_set(hash_strategy(), 1..10),
        probes in prop::collection::vec(hash_strategy(), 10..80),
    ) {
        let cache = Arc::new(CredentialCache::new(TEST_DEFAULT_TTL));
        for (i, hash) in present.iter().enumerate() {
            cache.set(hash.clone(), &credential(&format!("k{}", i), "team_a", "kg_api_x"));
        }

        let expected_hits = probes.iter().filter(|p| present.contains(*p)).count() as u64;
        let expected_misses = probes.len() as u64 - expected_hits;

        std::thread::scope(|scope| {
            for chunk in probes.chunks(8) {
                let cache = Arc::clone(&cache);
                scope.spawn(move || {
                    for probe in chunk {
                        let _ = cache.get(probe);
                    }
                });
            }
        });

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
    }
}
