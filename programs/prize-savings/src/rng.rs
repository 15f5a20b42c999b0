//! Deterministic pseudo-random sequence for winner selection.
//!
//! The 64-bit oracle seed is expanded with SHA-256 into the 128-bit state of
//! a xorshift128+ generator. Identical seeds always yield identical
//! sequences, so a draw can be replayed and audited from its seed alone.

use sha2::{Digest, Sha256};

/// Domain separator mixed into the seed expansion.
const SEED_DOMAIN: &[u8] = b"prize-savings:select-winners";

/// xorshift128+ generator seeded from a SHA-256 expansion.
#[derive(Debug, Clone)]
pub struct SeededRng {
    s0: u64,
    s1: u64,
}

impl SeededRng {
    /// Create a generator from an oracle seed.
    pub fn from_seed(seed: u64) -> Self {
        let digest = Sha256::new()
            .chain_update(SEED_DOMAIN)
            .chain_update(seed.to_le_bytes())
            .finalize();

        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        lo.copy_from_slice(&digest[0..8]);
        hi.copy_from_slice(&digest[8..16]);

        let s0 = u64::from_le_bytes(lo);
        let mut s1 = u64::from_le_bytes(hi);
        // All-zero state is a fixed point of xorshift
        if s0 == 0 && s1 == 0 {
            s1 = 1;
        }
        Self { s0, s1 }
    }

    /// Next 64 bits of the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.s0;
        let y = self.s1;
        let result = x.wrapping_add(y);
        self.s0 = y;
        x ^= x << 23;
        self.s1 = x ^ y ^ (x >> 17) ^ (y >> 26);
        result
    }

    /// Next 128 bits of the sequence.
    pub fn next_u128(&mut self) -> u128 {
        let hi = u128::from(self.next_u64());
        let lo = u128::from(self.next_u64());
        (hi << 64) | lo
    }

    /// Uniform value in `[0, bound)`; zero when `bound` is zero.
    ///
    /// Uses rejection sampling so large bounds carry no modulo bias.
    pub fn next_below(&mut self, bound: u128) -> u128 {
        if bound == 0 {
            return 0;
        }
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let value = self.next_u128();
            if value >= threshold {
                return value % bound;
            }
        }
    }
}
