// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Four classical string hashes evaluated in lockstep.
//!
//! A filter needs `k` independent hash values per key. Rather than running
//! `k` separate functions, keys are hashed in rounds of four: one pass over
//! the key bytes updates the DJB, DEK, FNV and JS accumulators
//! simultaneously and yields four hash slots. Rounds after the first prefix
//! the key with an 8-byte salt folded out of the previous round, so every
//! round produces a fresh, deterministic set of four values. All
//! accumulators are 64-bit with wrapping arithmetic; the resulting slot
//! values are part of the on-disk format and must never change.

/// Hash slots produced per mixing round.
const HASHES_PER_ROUND: usize = 4;

const DJB_SEED: u64 = 5381;
const JS_SEED: u64 = 1_315_423_911;
const FNV_PRIME: u64 = 0x811C9DC5;

/// One round's worth of accumulators, updated a byte at a time.
struct Round {
    djb: u64,
    dek: u64,
    fnv: u64,
    js: u64,
}

impl Round {
    fn new(dek_seed: u64) -> Self {
        Round {
            djb: DJB_SEED,
            dek: dek_seed,
            fnv: 0,
            js: JS_SEED,
        }
    }

    #[inline]
    fn mix(&mut self, byte: u8) {
        let b = u64::from(byte);

        // djb = ((djb << 5) + djb) + b
        self.djb = (self.djb << 5).wrapping_add(self.djb).wrapping_add(b);

        // dek = ((dek << 6) ^ (dek >> 27)) ^ b
        self.dek = ((self.dek << 6) ^ (self.dek >> 27)) ^ b;

        // fnv = (fnv * prime) ^ b
        self.fnv = self.fnv.wrapping_mul(FNV_PRIME) ^ b;

        // js ^= (js << 5) + b + (js >> 2)
        self.js ^= (self.js << 5).wrapping_add(b).wrapping_add(self.js >> 2);
    }

    /// Folds the four accumulators into the salt for the next round.
    fn salt(&self) -> u64 {
        self.djb ^ self.dek ^ self.fnv ^ self.js
    }

    fn slots(&self) -> [u64; HASHES_PER_ROUND] {
        [self.djb, self.dek, self.fnv, self.js]
    }
}

/// Computes `k` hash values for `key`.
///
/// Round 0 seeds DEK with the key length and mixes the key bytes alone.
/// Each later round seeds DEK with the key length plus the 8 salt bytes,
/// mixes the salt little-endian first and then the key. Slots beyond `k`
/// in the last round are discarded.
pub(crate) fn key_hashes(key: &[u8], k: usize) -> Vec<u64> {
    let mut out = Vec::with_capacity(k);
    let mut salt = 0u64;

    let rounds = k.div_ceil(HASHES_PER_ROUND);
    for round in 0..rounds {
        let mut acc = if round == 0 {
            Round::new(key.len() as u64)
        } else {
            Round::new((key.len() as u64).wrapping_add(8))
        };
        if round > 0 {
            for byte in salt.to_le_bytes() {
                acc.mix(byte);
            }
        }
        for &byte in key {
            acc.mix(byte);
        }
        salt = acc.salt();

        for slot in acc.slots() {
            if out.len() == k {
                break;
            }
            out.push(slot);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::key_hashes;

    #[test]
    fn test_deterministic() {
        assert_eq!(key_hashes(b"test", 8), key_hashes(b"test", 8));
        assert_ne!(key_hashes(b"test", 4), key_hashes(b"tesu", 4));
    }

    #[test]
    fn test_slot_count() {
        for k in 1..=12 {
            assert_eq!(key_hashes(b"abc", k).len(), k);
        }
    }

    #[test]
    fn test_prefix_stable_across_k() {
        // Raising k only appends rounds, it never changes earlier slots.
        let wide = key_hashes(b"stable", 11);
        for k in 1..11 {
            assert_eq!(key_hashes(b"stable", k), wide[..k]);
        }
    }

    #[test]
    fn test_rounds_differ() {
        let hashes = key_hashes(b"salted", 8);
        assert_ne!(hashes[..4], hashes[4..]);
    }

    #[test]
    fn test_four_accumulators_independent() {
        let hashes = key_hashes(b"independent", 4);
        for i in 0..4 {
            for j in i + 1..4 {
                assert_ne!(hashes[i], hashes[j]);
            }
        }
    }

    #[test]
    fn test_empty_key() {
        // An empty key still yields the seeds, mixed only by salt rounds.
        let hashes = key_hashes(b"", 8);
        assert_eq!(hashes[0], 5381);
        assert_eq!(hashes[1], 0);
        assert_eq!(hashes[2], 0);
        assert_eq!(hashes[3], 1_315_423_911);
        assert_ne!(hashes[4..8], hashes[0..4]);
    }
}
