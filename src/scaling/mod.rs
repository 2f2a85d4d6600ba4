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

//! Scalable Bloom filters with a bounded aggregate error rate.
//!
//! A classic Bloom filter must be sized up front; once its capacity is
//! exceeded, the false-positive rate degrades without bound. A
//! [`ScalingBloomFilter`] instead keeps an ordered stack of classic
//! filters. Only the newest layer accepts writes; when it reaches its
//! capacity, a new layer is appended with `scale_size` times the capacity
//! and a `scale_prob`-tightened false-positive target. Lookups probe the
//! layers newest first.
//!
//! # The probability budget
//!
//! A key absent from every layer can false-positive in any of them, so the
//! aggregate error rate is bounded by the sum of the per-layer targets.
//! With layer `i` targeting `p0 * r^i` (`r = scale_prob < 1`) the series
//! sums to `p0 / (1 - r)`; choosing `p0 = prob * (1 - r)` therefore keeps
//! the total at or below `prob` no matter how many layers accumulate
//! (Almeida et al., "Scalable Bloom Filters", 2007). With the default
//! `r = 0.9`, the first layer runs at a tenth of the requested rate.
//!
//! # Usage
//!
//! ```rust
//! use blooming::scaling::ScalingBloomFilter;
//!
//! let mut filter = ScalingBloomFilter::builder(1000, 0.01).build()?;
//! for i in 0..2000u32 {
//!     filter.add(format!("key{i}"))?;
//! }
//! assert_eq!(filter.len(), 2000);
//! assert!(filter.layers() >= 2);
//! assert!(filter.contains("key0"));
//! # Ok::<(), blooming::error::Error>(())
//! ```
//!
//! Layers are anonymous by default. To persist them, supply a factory that
//! names the backing file for each new layer:
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use blooming::scaling::ScalingBloomFilter;
//!
//! let mut n = 0;
//! let mut filter = ScalingBloomFilter::builder(1000, 0.01)
//!     .bitmap_factory(move || {
//!         n += 1;
//!         PathBuf::from(format!("layer.{n:03}.mmap"))
//!     })
//!     .build()?;
//! filter.add("key")?;
//! filter.close()?;
//! # Ok::<(), blooming::error::Error>(())
//! ```

mod builder;
mod filter;

pub use self::builder::BitmapFactory;
pub use self::builder::ScalingBloomFilterBuilder;
pub use self::filter::ScalingBloomFilter;
