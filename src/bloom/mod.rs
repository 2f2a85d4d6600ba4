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

//! Fixed-capacity Bloom filters over memory-mapped bitmaps.
//!
//! A Bloom filter answers set-membership queries probabilistically:
//!
//! - **No false negatives**: if a key was added, [`BloomFilter::contains`]
//!   always returns `true`.
//! - **Tunable false positives**: `contains` may return `true` for a key
//!   never added, with a probability fixed at sizing time.
//!
//! # Storage
//!
//! The filter owns a [`Bitmap`](crate::bitmap::Bitmap) and stores everything
//! in it, so a file-backed bitmap makes the whole filter persistent. The
//! last [`HEADER_BYTES`] bytes of the region hold the filter's metadata:
//! the number of successful adds (`count`, little-endian u64) followed by
//! the number of hash functions (`k`, little-endian u32). A region whose
//! stored `k` is zero is treated as fresh and initialised with the caller's
//! parameters; otherwise the stored `k` is authoritative, so a filter
//! reopened with the wrong argument still hashes exactly as it was written.
//!
//! The remaining bits are split into `k` disjoint partitions of equal
//! width, one per hash function. Partitioning keeps the per-hash bit ranges
//! independent, which is what the scaling analysis in
//! [`scaling`](crate::scaling) relies on.
//!
//! # Usage
//!
//! ```rust
//! use blooming::bloom::BloomFilter;
//!
//! // Sized for 1000 keys at a 1% false-positive rate, anonymous storage.
//! let mut filter = BloomFilter::for_capacity(1000, 0.01)?;
//!
//! filter.add("apple", false);
//! assert!(filter.contains("apple"));
//! assert!(!filter.contains("grape"));
//! # Ok::<(), blooming::error::Error>(())
//! ```
//!
//! For a persistent filter, open a file-backed bitmap sized with
//! [`BloomFilter::params_for_capacity`] and hand it to
//! [`BloomFilter::new`]:
//!
//! ```rust,no_run
//! use blooming::bitmap::Bitmap;
//! use blooming::bloom::BloomFilter;
//!
//! let (bytes, k) = BloomFilter::params_for_capacity(1000, 0.01);
//! let bitmap = Bitmap::open("filter.mmap", bytes as usize)?;
//! let mut filter = BloomFilter::new(bitmap, k)?;
//! filter.add("apple", false);
//! filter.close()?;
//! # Ok::<(), blooming::error::Error>(())
//! ```

mod filter;

pub use self::filter::BloomFilter;
pub use self::filter::HEADER_BYTES;
