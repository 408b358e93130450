//! Collision-checked generation of short link keys.

use std::sync::Arc;

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::json;
use tracing::debug;

use crate::domain::repositories::ShortLinkRepository;
use crate::error::AppError;

/// Alphabet keys are drawn from. Case-sensitive, URL-safe.
pub const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Upper bound on candidates tried for one allocation.
pub const MAX_ATTEMPTS: u64 = 100;

/// Number of candidates tried before giving up on a key of `length`.
///
/// Never more than the key space itself, so a tiny saturated space fails fast.
pub fn retry_bound(length: usize) -> u64 {
    u32::try_from(length)
        .ok()
        .and_then(|exp| (KEY_ALPHABET.len() as u64).checked_pow(exp))
        .map_or(MAX_ATTEMPTS, |space| space.min(MAX_ATTEMPTS))
}

/// Draws one candidate key of `length` characters from `rng`.
pub fn generate_key<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

/// Produces keys that are free in the store at the time of the check.
///
/// The check does not reserve the key. Whoever inserts the link must still
/// handle a uniqueness violation from the store.
pub struct KeyAllocator<R: ShortLinkRepository + ?Sized> {
    repository: Arc<R>,
    reject: Option<Box<dyn Fn(&str) -> bool + Send + Sync>>,
}

impl<R: ShortLinkRepository + ?Sized> KeyAllocator<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            reject: None,
        }
    }

    /// Treats candidates matching `predicate` as taken.
    pub fn reject_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.reject = Some(Box::new(predicate));
        self
    }

    fn is_rejected(&self, key: &str) -> bool {
        self.reject.as_ref().is_some_and(|reject| reject(key))
    }

    /// Allocates a key of `length` characters.
    ///
    /// With a `seed`, the candidate sequence is deterministic: the same seed and
    /// length always try the same keys in the same order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] if `length` is zero.
    /// Returns [`AppError::KeyExhaustion`] if every attempt collided.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn allocate(&self, length: usize, seed: Option<u64>) -> Result<String, AppError> {
        if length == 0 {
            return Err(AppError::configuration(
                "Key length must be at least 1",
                json!({ "field": "key_length" }),
            ));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let attempts = retry_bound(length);
        for attempt in 1..=attempts {
            let key = generate_key(&mut rng, length);

            if self.is_rejected(&key) {
                debug!("Rejected key on attempt {}/{}: {}", attempt, attempts, key);
                continue;
            }

            if !self.repository.key_exists(&key).await? {
                return Ok(key);
            }

            debug!("Key collision on attempt {}/{}: {}", attempt, attempts, key);
        }

        Err(AppError::key_exhaustion(
            "Failed to allocate a unique short link key",
            json!({ "length": length, "attempts": attempts }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockShortLinkRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn free_store() -> MockShortLinkRepository {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_key_exists().returning(|_| Ok(false));
        repo
    }

    #[test]
    fn test_retry_bound() {
        assert_eq!(retry_bound(1), 62);
        assert_eq!(retry_bound(2), MAX_ATTEMPTS);
        assert_eq!(retry_bound(64), MAX_ATTEMPTS);
    }

    #[test]
    fn test_generate_key_uses_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        let key = generate_key(&mut rng, 32);

        assert_eq!(key.len(), 32);
        assert!(key.bytes().all(|b| KEY_ALPHABET.contains(&b)));
    }

    #[tokio::test]
    async fn test_allocate_returns_requested_length() {
        let allocator = KeyAllocator::new(Arc::new(free_store()));

        for length in [1, 5, 12] {
            let key = allocator.allocate(length, None).await.unwrap();
            assert_eq!(key.len(), length);
        }
    }

    #[tokio::test]
    async fn test_allocate_with_seed_is_deterministic() {
        let allocator = KeyAllocator::new(Arc::new(free_store()));

        let first = allocator.allocate(8, Some(42)).await.unwrap();
        let second = allocator.allocate(8, Some(42)).await.unwrap();
        let other = allocator.allocate(8, Some(43)).await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_allocate_retries_on_collision() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut repo = MockShortLinkRepository::new();
        repo.expect_key_exists()
            .returning(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst) < 2));

        let allocator = KeyAllocator::new(Arc::new(repo));
        let key = allocator.allocate(5, Some(1)).await.unwrap();

        assert_eq!(key.len(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_allocate_seeded_retry_skips_taken_candidate() {
        let mut rng = StdRng::seed_from_u64(99);
        let taken = generate_key(&mut rng, 6);
        let next = generate_key(&mut rng, 6);

        let mut repo = MockShortLinkRepository::new();
        let taken_clone = taken.clone();
        repo.expect_key_exists()
            .returning(move |key| Ok(key == taken_clone));

        let allocator = KeyAllocator::new(Arc::new(repo));
        let key = allocator.allocate(6, Some(99)).await.unwrap();

        assert_ne!(key, taken);
        assert_eq!(key, next);
    }

    #[tokio::test]
    async fn test_allocate_skips_rejected_candidate() {
        let mut rng = StdRng::seed_from_u64(5);
        let rejected = generate_key(&mut rng, 3);
        let next = generate_key(&mut rng, 3);

        let mut repo = MockShortLinkRepository::new();
        repo.expect_key_exists().times(1).returning(|_| Ok(false));

        let blocked = rejected.clone();
        let allocator = KeyAllocator::new(Arc::new(repo)).reject_if(move |key| key == blocked);
        let key = allocator.allocate(3, Some(5)).await.unwrap();

        assert_eq!(key, next);
    }

    #[tokio::test]
    async fn test_allocate_exhaustion() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_key_exists().times(62).returning(|_| Ok(true));

        let allocator = KeyAllocator::new(Arc::new(repo));
        let result = allocator.allocate(1, None).await;

        assert!(matches!(result, Err(AppError::KeyExhaustion { .. })));
    }

    #[tokio::test]
    async fn test_allocate_zero_length_is_configuration_error() {
        let repo = MockShortLinkRepository::new();
        let allocator = KeyAllocator::new(Arc::new(repo));

        let result = allocator.allocate(0, None).await;
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_allocate_propagates_store_errors() {
        let mut repo = MockShortLinkRepository::new();
        repo.expect_key_exists()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let allocator = KeyAllocator::new(Arc::new(repo));
        let result = allocator.allocate(5, None).await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }
}
