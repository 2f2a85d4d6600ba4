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

use super::builder::BitmapFactory;
use super::builder::ScalingBloomFilterBuilder;
use crate::bitmap::Bitmap;
use crate::bloom::BloomFilter;
use crate::error::Error;

/// One classic filter inside the stack, with the capacity and probability
/// target it was sized for.
#[derive(Debug)]
pub(super) struct Layer {
    pub(super) filter: BloomFilter,
    pub(super) capacity: u64,
    pub(super) prob: f64,
}

/// A Bloom filter that grows to fit its keys while holding the aggregate
/// false-positive probability under the configured target.
///
/// Writes always land in the newest layer; older layers are read-only.
/// See the [module docs](crate::scaling) for the growth discipline and the
/// probability budget.
pub struct ScalingBloomFilter {
    /// Oldest first; never empty.
    pub(super) layers: Vec<Layer>,
    pub(super) scale_size: u64,
    pub(super) scale_prob: f64,
    pub(super) factory: Option<BitmapFactory>,
}

impl std::fmt::Debug for ScalingBloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalingBloomFilter")
            .field("layers", &self.layers)
            .field("scale_size", &self.scale_size)
            .field("scale_prob", &self.scale_prob)
            .field("factory", &self.factory.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl ScalingBloomFilter {
    /// Starts building a filter that holds `initial_capacity` keys in its
    /// first layer and keeps the aggregate false-positive probability at or
    /// below `prob` as it grows.
    pub fn builder(initial_capacity: u64, prob: f64) -> ScalingBloomFilterBuilder {
        ScalingBloomFilterBuilder::new(initial_capacity, prob)
    }

    /// Adds `key`, growing the stack if the newest layer just filled up.
    ///
    /// Returns `false` when the newest layer already reports the key and
    /// nothing was recorded. Older layers are not consulted: a duplicate
    /// that only lives in an older layer is counted again. Growth happens
    /// after the triggering add, so the key itself lands in the old layer.
    ///
    /// # Errors
    ///
    /// `Io` when a new layer's backing bitmap cannot be created.
    pub fn add(&mut self, key: impl AsRef<[u8]>) -> Result<bool, Error> {
        let newest = self.newest_mut();
        if !newest.filter.add(key.as_ref(), true) {
            return Ok(false);
        }

        let newest = self.newest();
        if newest.filter.len() >= newest.capacity {
            let capacity = newest.capacity * self.scale_size;
            let prob = newest.prob * self.scale_prob;
            self.push_layer(capacity, prob)?;
        }
        Ok(true)
    }

    /// Tests whether any layer possibly contains `key`, probing newest to
    /// oldest — recent keys live in the newest layer.
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        let key = key.as_ref();
        self.layers.iter().rev().any(|l| l.filter.contains(key))
    }

    /// Returns the total number of successful adds across all layers.
    pub fn len(&self) -> u64 {
        self.layers.iter().map(|l| l.filter.len()).sum()
    }

    /// Returns whether nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|l| l.filter.is_empty())
    }

    /// Returns the summed capacity of all layers.
    pub fn total_capacity(&self) -> u64 {
        self.layers.iter().map(|l| l.capacity).sum()
    }

    /// Returns the number of layers in the stack.
    pub fn layers(&self) -> usize {
        self.layers.len()
    }

    /// Returns the summed size of the layers' bitmaps in bytes.
    pub fn total_bitmap_bytes(&self) -> u64 {
        self.layers.iter().map(|l| l.filter.bitmap_bytes() as u64).sum()
    }

    /// Flushes every layer.
    pub fn flush(&mut self) -> Result<(), Error> {
        for layer in &mut self.layers {
            layer.filter.flush()?;
        }
        Ok(())
    }

    /// Flushes and closes every layer. Idempotent.
    pub fn close(&mut self) -> Result<(), Error> {
        for layer in &mut self.layers {
            layer.filter.close()?;
        }
        Ok(())
    }

    /// Appends a layer sized for `capacity` keys at probability `prob`,
    /// backed by the factory's next file or an anonymous bitmap.
    pub(super) fn push_layer(&mut self, capacity: u64, prob: f64) -> Result<(), Error> {
        let (bytes, k) = BloomFilter::params_for_capacity(capacity, prob);
        let bitmap = match &mut self.factory {
            Some(factory) => Bitmap::open(factory(), bytes as usize)?,
            None => Bitmap::anonymous(bytes as usize)?,
        };
        let filter = BloomFilter::new(bitmap, k)?;
        self.layers.push(Layer {
            filter,
            capacity,
            prob,
        });
        Ok(())
    }

    fn newest(&self) -> &Layer {
        self.layers.last().expect("scaling filter always has a layer")
    }

    fn newest_mut(&mut self) -> &mut Layer {
        self.layers
            .last_mut()
            .expect("scaling filter always has a layer")
    }
}

#[cfg(test)]
mod tests {
    use super::ScalingBloomFilter;
    use crate::error::ErrorKind;

    #[test]
    fn test_first_layer_probability() {
        // scale_prob 0.9 leaves the first layer a tenth of the budget.
        let filter = ScalingBloomFilter::builder(1000, 0.01).build().unwrap();
        assert!((filter.layers[0].prob - 0.001).abs() < 1e-12);
        assert_eq!(filter.layers[0].capacity, 1000);
    }

    #[test]
    fn test_probability_series_stays_within_budget() {
        let prob = 0.01;
        let filter = ScalingBloomFilter::builder(1000, prob).build().unwrap();
        let r = filter.scale_prob;
        let p0 = filter.layers[0].prob;

        // Sum p0 * r^i over far more layers than could ever exist.
        let mut total = 0.0;
        let mut p = p0;
        for _ in 0..1000 {
            total += p;
            p *= r;
        }
        assert!(total <= prob + 1e-12);
    }

    #[test]
    fn test_layer_parameters_follow_growth() {
        let mut filter = ScalingBloomFilter::builder(100, 0.01)
            .scale_size(4)
            .build()
            .unwrap();
        for i in 0..500u32 {
            filter.add(format!("key{i}")).unwrap();
        }
        assert!(filter.layers() >= 2);
        assert_eq!(filter.layers[1].capacity, 400);
        assert!((filter.layers[1].prob - 0.001 * 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_growth_happens_after_the_triggering_add() {
        let mut filter = ScalingBloomFilter::builder(100, 0.01).build().unwrap();
        for i in 0..99u32 {
            filter.add(format!("key{i}")).unwrap();
        }
        assert_eq!(filter.layers(), 1);

        // The 100th key fills layer 0 and only then appends layer 1.
        filter.add("key99").unwrap();
        assert_eq!(filter.layers(), 2);
        assert_eq!(filter.layers[0].filter.len(), 100);
        assert_eq!(filter.layers[1].filter.len(), 0);
    }

    #[test]
    fn test_duplicate_in_newest_layer_not_recounted() {
        let mut filter = ScalingBloomFilter::builder(100, 0.01).build().unwrap();
        assert!(filter.add("dup").unwrap());
        assert!(!filter.add("dup").unwrap());
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn test_bad_parameters() {
        for builder in [
            ScalingBloomFilter::builder(0, 0.01),
            ScalingBloomFilter::builder(100, 0.0),
            ScalingBloomFilter::builder(100, 1.0),
            ScalingBloomFilter::builder(100, 0.01).scale_size(1),
            ScalingBloomFilter::builder(100, 0.01).scale_prob(0.0),
            ScalingBloomFilter::builder(100, 0.01).scale_prob(1.0),
        ] {
            let err = builder.build().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }
}
