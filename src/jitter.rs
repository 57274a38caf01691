// 🎲 Deterministic Jitter - string hash + LCG
// Same name → same horizontal offset on every redraw

// ============================================================================
// STRING HASH
// ============================================================================

/// Rolling polynomial hash: `hash = (hash << 5) - hash + unit`.
///
/// Walks the UTF-16 code units of `text` and wraps to 32 bits at every
/// step, so the result matches any implementation with two's-complement
/// 32-bit wraparound.
pub fn string_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

// ============================================================================
// LINEAR CONGRUENTIAL GENERATOR
// ============================================================================

const LCG_A: u64 = 1_664_525;
const LCG_C: u64 = 1_013_904_223;
const LCG_M: u64 = 1 << 32;

/// Numerical Recipes LCG (a = 1664525, c = 1013904223, m = 2^32).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Negative seeds are reduced modulo 2^32 first so every draw is in [0, 1).
    pub fn new(seed: i64) -> Self {
        Lcg {
            state: seed.rem_euclid(LCG_M as i64) as u64,
        }
    }

    /// Advance the state and return `state / 2^32`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (LCG_A * self.state + LCG_C) % LCG_M;
        self.state as f64 / LCG_M as f64
    }
}

impl Iterator for Lcg {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}

/// First LCG draw seeded with `string_hash(text)`.
pub fn random_from_string(text: &str) -> f64 {
    Lcg::new(i64::from(string_hash(text))).next_f64()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hash_known_values() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        assert_eq!(string_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_hash_wraps_to_32_bits() {
        let long = "Ada Lovelace, Countess of Lovelace".repeat(8);
        let expected = long.encode_utf16().fold(0i64, |hash, unit| {
            let next = hash * 31 + i64::from(unit);
            i64::from(next as i32)
        });
        assert_eq!(i64::from(string_hash(&long)), expected);
    }

    #[test]
    fn test_hash_uses_utf16_units() {
        // U+1F600 is a surrogate pair: 0xD83D 0xDE00
        let expected = (0xD83Di32).wrapping_mul(31).wrapping_add(0xDE00);
        assert_eq!(string_hash("\u{1F600}"), expected);
    }

    #[test]
    fn test_lcg_first_draw() {
        let mut lcg = Lcg::new(97);
        let expected = ((1_664_525u64 * 97 + 1_013_904_223) % (1u64 << 32)) as f64
            / 4_294_967_296.0;
        assert_relative_eq!(lcg.next_f64(), expected);
    }

    #[test]
    fn test_lcg_sequences_are_reproducible() {
        let a: Vec<f64> = Lcg::new(42).take(16).collect();
        let b: Vec<f64> = Lcg::new(42).take(16).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_negative_seed_stays_in_unit_interval() {
        let seed = i64::from(string_hash("Ada Lovelace, Countess of Lovelace"));
        let mut lcg = Lcg::new(seed.min(-1));
        for _ in 0..100 {
            let v = lcg.next_f64();
            assert!((0.0..1.0).contains(&v), "draw {} out of range", v);
        }
    }

    #[test]
    fn test_random_from_string_is_deterministic() {
        let first = random_from_string("Ada Lovelace");
        let second = random_from_string("Ada Lovelace");
        assert_eq!(first.to_bits(), second.to_bits());
        assert_ne!(first, random_from_string("Alan Turing"));
    }
}
