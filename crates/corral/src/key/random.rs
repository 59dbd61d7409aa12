use rand::{Rng, rng};

/// Entropy behind [`KeyGenerator`](crate::KeyGenerator).
///
/// Each key character consumes one value, reduced modulo the alphabet size.
/// Swap in a deterministic source to get predictable keys.
///
/// # Example
/// ```
/// use corral::{KeyGenerator, RandSource};
///
/// struct FirstSymbol;
/// impl RandSource<u64> for FirstSymbol {
///     fn rand(&self) -> u64 {
///         0
///     }
/// }
///
/// let keys = KeyGenerator::with_rand(3, FirstSymbol);
/// assert_eq!(keys.generate_with_length(3).as_str(), "aaa");
/// ```
pub trait RandSource<T> {
    /// Returns the next raw value.
    fn rand(&self) -> T;
}

/// A `RandSource` that uses the thread-local RNG (`rand::rng()`).
///
/// Each OS thread has its own RNG instance, so calls from submitters running on
/// different runtime threads are contention-free. This type does **not** store
/// the RNG itself; it accesses the thread-local generator on each call, which
/// keeps it `Send + Sync`.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource<u64> for ThreadRandom {
    fn rand(&self) -> u64 {
        rng().random()
    }
}
