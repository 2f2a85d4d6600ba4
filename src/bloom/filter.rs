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

use byteorder::ByteOrder;
use byteorder::LE;

use crate::bitmap::Bitmap;
use crate::error::Error;
use crate::hash;

/// Bytes reserved at the end of the bitmap for filter metadata:
/// `count` (little-endian u64) followed by `k` (little-endian u32).
pub const HEADER_BYTES: usize = 12;

/// A fixed-capacity, partitioned k-hash Bloom filter over a [`Bitmap`].
///
/// See the [module docs](crate::bloom) for the storage layout and the
/// reopening rules. Use [`BloomFilter::for_capacity`] for a self-sizing
/// in-memory filter, or [`BloomFilter::new`] over a file-backed bitmap for
/// a persistent one.
#[derive(Debug)]
pub struct BloomFilter {
    bitmap: Bitmap,
    /// Number of hash functions; authoritative copy lives in the header.
    k: u32,
    /// Bits available for key storage, excluding the header.
    storage_bits: u64,
    /// Width of each per-hash bit partition, `storage_bits / k`.
    offset: u64,
    /// Successful adds so far. Written back to the header on flush.
    count: u64,
}

impl BloomFilter {
    /// Constructs a filter over `bitmap` using `k` hash functions.
    ///
    /// If the region already holds a filter (stored `k` is nonzero), the
    /// stored parameters win and the `k` argument is ignored; `count` is
    /// restored from the header. A fresh region gets the caller's `k`
    /// written through immediately.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the bitmap is too small to hold the header,
    /// when `k` is zero, or when `k` exceeds the available bits (which
    /// would leave a zero-width partition).
    pub fn new(bitmap: Bitmap, k: u32) -> Result<BloomFilter, Error> {
        if k < 1 {
            return Err(Error::invalid_argument("k must be at least 1"));
        }
        if bitmap.size_bytes() <= HEADER_BYTES {
            return Err(
                Error::invalid_argument("bitmap cannot hold the filter header")
                    .with_context("size_bytes", bitmap.size_bytes())
                    .with_context("header_bytes", HEADER_BYTES),
            );
        }
        let storage_bits = 8 * (bitmap.size_bytes() - HEADER_BYTES) as u64;

        let mut filter = BloomFilter {
            bitmap,
            k,
            storage_bits,
            offset: 0,
            count: 0,
        };

        let (stored_count, stored_k) = filter.read_header()?;
        filter.count = stored_count;
        if stored_k != 0 {
            filter.k = stored_k;
        }
        if u64::from(filter.k) > storage_bits {
            return Err(Error::invalid_argument("k exceeds available bits")
                .with_context("k", filter.k)
                .with_context("storage_bits", storage_bits));
        }
        filter.offset = storage_bits / u64::from(filter.k);

        if stored_k == 0 {
            // Fresh region: install the requested parameters durably before
            // any key lands in the bit storage.
            filter.write_header()?;
            filter.bitmap.flush()?;
        }
        Ok(filter)
    }

    /// Creates an anonymous filter sized for `capacity` keys at false
    /// positive probability `prob`.
    pub fn for_capacity(capacity: u64, prob: f64) -> Result<BloomFilter, Error> {
        if capacity == 0 {
            return Err(Error::invalid_argument("capacity must be positive"));
        }
        if !(prob > 0.0 && prob < 1.0) {
            return Err(Error::invalid_argument(
                "probability must be in (0, 1) exclusive",
            )
            .with_context("prob", prob));
        }
        let (bytes, k) = Self::params_for_capacity(capacity, prob);
        let bitmap = Bitmap::anonymous(bytes as usize)?;
        Self::new(bitmap, k)
    }

    /// Tests whether `key` is possibly in the set.
    ///
    /// `true` means possibly present (or a false positive); `false` means
    /// definitely absent.
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        let hashes = hash::key_hashes(key.as_ref(), self.k as usize);
        hashes
            .iter()
            .enumerate()
            .all(|(slot, h)| self.bitmap.get(self.bit_index(slot, *h)))
    }

    /// Adds `key` to the set, returning whether anything was recorded.
    ///
    /// With `check_first`, a key the filter already reports as present is
    /// skipped and `false` is returned, leaving `count` untouched.
    /// Otherwise the k partition bits are set (idempotently), `count` is
    /// incremented and `true` is returned — so without `check_first`,
    /// duplicate keys inflate `count` past the true cardinality.
    pub fn add(&mut self, key: impl AsRef<[u8]>, check_first: bool) -> bool {
        let key = key.as_ref();
        if check_first && self.contains(key) {
            return false;
        }
        let hashes = hash::key_hashes(key, self.k as usize);
        for (slot, h) in hashes.iter().enumerate() {
            self.bitmap.set(self.bit_index(slot, *h), true);
        }
        self.count += 1;
        true
    }

    /// Maps hash slot `slot` into its own bit partition.
    ///
    /// Partitions are disjoint and `offset` bits wide, so distinct hash
    /// functions can never collide on a bit.
    fn bit_index(&self, slot: usize, hash: u64) -> usize {
        (slot as u64 * self.offset + hash % self.offset) as usize
    }

    /// Returns the number of successful adds.
    pub fn len(&self) -> u64 {
        self.count
    }

    /// Returns whether nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of hash functions in use.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Returns the bits available for key storage, header excluded.
    pub fn storage_bits(&self) -> u64 {
        self.storage_bits
    }

    /// Returns the total size of the underlying bitmap in bytes.
    pub fn bitmap_bytes(&self) -> usize {
        self.bitmap.size_bytes()
    }

    /// Writes `count` into the header and flushes the bitmap
    /// (msync + fsync for shared file-backed storage).
    pub fn flush(&mut self) -> Result<(), Error> {
        if !self.bitmap.is_open() {
            return Ok(());
        }
        self.write_header()?;
        self.bitmap.flush()
    }

    /// Flushes and closes the underlying bitmap. Idempotent.
    pub fn close(&mut self) -> Result<(), Error> {
        if !self.bitmap.is_open() {
            return Ok(());
        }
        self.write_header()?;
        self.bitmap.close(true)
    }

    fn header_base(&self) -> usize {
        self.bitmap.size_bytes() - HEADER_BYTES
    }

    fn read_header(&self) -> Result<(u64, u32), Error> {
        let base = self.header_base();
        let raw = self.bitmap.get_slice(base, base + HEADER_BYTES)?;
        Ok((LE::read_u64(&raw[..8]), LE::read_u32(&raw[8..])))
    }

    fn write_header(&mut self) -> Result<(), Error> {
        let mut raw = [0u8; HEADER_BYTES];
        LE::write_u64(&mut raw[..8], self.count);
        LE::write_u32(&mut raw[8..], self.k);
        let base = self.header_base();
        self.bitmap.set_slice(base, base + HEADER_BYTES, &raw)
    }
}

impl BloomFilter {
    /// Returns the bits needed to hold `capacity` keys at false positive
    /// probability `prob`.
    ///
    /// Formula: `m = ceil(-n * ln(p) / ln(2)^2)`.
    pub fn required_bits(capacity: u64, prob: f64) -> u64 {
        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;
        (-(capacity as f64) * prob.ln() / ln2_squared).ceil() as u64
    }

    /// Same as [`required_bits`](Self::required_bits), rounded up to bytes.
    pub fn required_bytes(capacity: u64, prob: f64) -> u64 {
        Self::required_bits(capacity, prob).div_ceil(8)
    }

    /// Returns the false positive probability expected of a filter with
    /// `bits` bits of storage holding `capacity` keys.
    ///
    /// Formula: `p = e^(-(m/n) * ln(2)^2)`.
    pub fn expected_probability(bits: u64, capacity: u64) -> f64 {
        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;
        (-(bits as f64 / capacity as f64) * ln2_squared).exp()
    }

    /// Returns how many keys `bits` bits of storage can hold at false
    /// positive probability `prob`, truncated.
    ///
    /// Formula: `n = -m / ln(p) * ln(2)^2`.
    pub fn expected_capacity(bits: u64, prob: f64) -> u64 {
        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;
        (-(bits as f64) / prob.ln() * ln2_squared) as u64
    }

    /// Returns the optimal (fractional) number of hash functions for a
    /// filter of `bits` bits holding `capacity` keys.
    ///
    /// Formula: `k = ln(2) * m / n`.
    pub fn ideal_k(bits: u64, capacity: u64) -> f64 {
        std::f64::consts::LN_2 * bits as f64 / capacity as f64
    }

    /// Returns `(total_bytes, k)` for a filter holding `capacity` keys at
    /// false positive probability `prob`.
    ///
    /// `total_bytes` includes the trailing header; `k` is the ideal count
    /// for the byte-rounded storage size, rounded up.
    pub fn params_for_capacity(capacity: u64, prob: f64) -> (u64, u32) {
        let bytes = Self::required_bytes(capacity, prob);
        let k = Self::ideal_k(bytes * 8, capacity).ceil() as u32;
        (bytes + HEADER_BYTES as u64, k.max(1))
    }

    /// Returns the bytes of bitmap storage the filter reserves for its own
    /// metadata, i.e. the bytes unavailable to key storage.
    pub const fn extra_buffer() -> usize {
        HEADER_BYTES
    }
}
