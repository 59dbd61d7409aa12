use crate::{ALPHABET, CorrelationKey, DEFAULT_KEY_LENGTH, KeyGenerator, KeySource, RandSource};
use core::cell::Cell;
use std::collections::HashSet;

struct FixedRand(u64);

impl RandSource<u64> for FixedRand {
    fn rand(&self) -> u64 {
        self.0
    }
}

struct CountingRand {
    next: Cell<u64>,
}

impl RandSource<u64> for CountingRand {
    fn rand(&self) -> u64 {
        let n = self.next.get();
        self.next.set(n + 1);
        n
    }
}

#[test]
fn default_generator_produces_five_characters() {
    let keys = KeyGenerator::default();
    assert_eq!(keys.length(), DEFAULT_KEY_LENGTH);

    let key = keys.generate();
    assert_eq!(key.len(), DEFAULT_KEY_LENGTH);
}

#[test]
fn generated_keys_only_use_the_alphabet() {
    let keys = KeyGenerator::new(32);
    for _ in 0..256 {
        let key = keys.generate();
        assert_eq!(key.len(), 32);
        assert!(key.as_str().bytes().all(|b| ALPHABET.contains(&b)), "{key}");
    }
}

#[test]
fn generate_with_length_ignores_configured_length() {
    let keys = KeyGenerator::new(5);
    assert_eq!(keys.generate_with_length(12).len(), 12);
    assert!(keys.generate_with_length(0).is_empty());
}

#[test]
fn fixed_rand_maps_to_alphabet_positions() {
    assert_eq!(
        KeyGenerator::with_rand(5, FixedRand(0)).generate(),
        CorrelationKey::from("aaaaa")
    );
    assert_eq!(
        KeyGenerator::with_rand(3, FixedRand(61)).generate(),
        CorrelationKey::from("999")
    );
    // Wraps modulo the alphabet size.
    assert_eq!(
        KeyGenerator::with_rand(2, FixedRand(62 + 26)).generate(),
        CorrelationKey::from("AA")
    );
}

#[test]
fn each_character_draws_independently() {
    let keys = KeyGenerator::with_rand(4, CountingRand { next: Cell::new(0) });
    assert_eq!(keys.generate_with_length(4).as_str(), "abcd");
    assert_eq!(keys.generate_with_length(4).as_str(), "efgh");
}

#[test]
fn every_symbol_eventually_appears() {
    let keys = KeyGenerator::new(64);
    let mut seen = HashSet::new();
    for _ in 0..512 {
        seen.extend(keys.generate().as_str().bytes());
    }
    assert_eq!(seen.len(), ALPHABET.len());
}

#[test]
fn generator_is_shareable_across_threads() {
    let keys = std::sync::Arc::new(KeyGenerator::default());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let keys = std::sync::Arc::clone(&keys);
            std::thread::spawn(move || (0..100).map(|_| keys.generate()).collect::<Vec<_>>())
        })
        .collect();

    for handle in handles {
        let batch = handle.join().unwrap();
        assert!(batch.iter().all(|k| k.len() == DEFAULT_KEY_LENGTH));
    }
}
