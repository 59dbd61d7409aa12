use super::{CorrelationKey, RandSource, ThreadRandom};

/// The symbols keys are drawn from: `a-z`, `A-Z`, then `0-9`.
pub const ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Key length used when none is configured.
pub const DEFAULT_KEY_LENGTH: usize = 5;

/// Produces the correlation key for each submission.
///
/// The dispatcher only needs "give me the next key", so anything from a random
/// generator to a fixed sequence (useful for forcing collisions in tests) can
/// be plugged in.
pub trait KeySource: Send + Sync {
    fn generate(&self) -> CorrelationKey;
}

/// Random fixed-length key generator over [`ALPHABET`].
///
/// Every character is chosen independently and uniformly (up to a negligible
/// modulo bias) from a non-cryptographic source. No uniqueness is enforced: at
/// the default length of 5 there are 62^5 (about 9.2e8) keys, so collisions
/// under sustained concurrent load are rare but possible.
#[derive(Clone, Debug)]
pub struct KeyGenerator<R = ThreadRandom>
where
    R: RandSource<u64>,
{
    length: usize,
    rand: R,
}

impl KeyGenerator<ThreadRandom> {
    /// Creates a generator backed by the thread-local RNG.
    pub const fn new(length: usize) -> Self {
        Self {
            length,
            rand: ThreadRandom,
        }
    }
}

impl Default for KeyGenerator<ThreadRandom> {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_LENGTH)
    }
}

impl<R> KeyGenerator<R>
where
    R: RandSource<u64>,
{
    /// Creates a generator with a custom random source.
    pub const fn with_rand(length: usize, rand: R) -> Self {
        Self { length, rand }
    }

    /// Length of the keys produced by [`KeySource::generate`].
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Produces a key of exactly `length` characters.
    pub fn generate_with_length(&self, length: usize) -> CorrelationKey {
        let key: String = (0..length)
            .map(|_| {
                let idx = (self.rand.rand() % ALPHABET.len() as u64) as usize;
                ALPHABET[idx] as char
            })
            .collect();
        CorrelationKey::from(key)
    }
}

impl<R> KeySource for KeyGenerator<R>
where
    R: RandSource<u64> + Send + Sync,
{
    fn generate(&self) -> CorrelationKey {
        self.generate_with_length(self.length)
    }
}
