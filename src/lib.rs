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

//! # Memory-mapped Bloom filters
//!
//! This library provides probabilistic set-membership data structures whose
//! storage is a memory-mapped file, so a filter can be orders of magnitude
//! larger than available RAM and survives process restarts byte-for-byte.
//!
//! Three layers, each built on the one below:
//!
//! - [`bitmap::Bitmap`] — a bit-addressable view over a fixed-size byte
//!   region, anonymous or file-backed, with explicit durability
//!   (`msync` + `fsync`).
//! - [`bloom::BloomFilter`] — a fixed-capacity, partitioned k-hash Bloom
//!   filter over a `Bitmap`, with its `count` and `k` embedded in the mapped
//!   region so reopening a file restores the filter exactly.
//! - [`scaling::ScalingBloomFilter`] — an ordered stack of Bloom filters
//!   that grows geometrically as layers saturate while keeping the aggregate
//!   false-positive probability under the configured target.
//!
//! ```rust
//! use blooming::bloom::BloomFilter;
//!
//! let mut filter = BloomFilter::for_capacity(1000, 0.01)?;
//! assert!(!filter.contains("apple"));
//! filter.add("apple", false);
//! assert!(filter.contains("apple"));
//! assert_eq!(filter.len(), 1);
//! # Ok::<(), blooming::error::Error>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod bitmap;
pub mod bloom;
pub mod error;
mod hash;
pub mod scaling;
