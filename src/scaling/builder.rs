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

use std::path::PathBuf;

use super::filter::Layer;
use super::filter::ScalingBloomFilter;
use crate::bloom::BloomFilter;
use crate::error::Error;

/// Callback producing the backing-file path for each new layer.
///
/// The filter calls it with no arguments, once per layer (the first layer
/// included), and creates a shared file-backed bitmap of the computed size
/// at the returned path. Stateful closures are the norm here — a counter
/// producing `layer.000.mmap`, `layer.001.mmap`, … — so the trait is
/// `FnMut`.
pub type BitmapFactory = Box<dyn FnMut() -> PathBuf>;

/// Builder for [`ScalingBloomFilter`] instances.
///
/// Created via [`ScalingBloomFilter::builder`]. The defaults grow capacity
/// 4x per layer and tighten the per-layer probability by 0.9.
pub struct ScalingBloomFilterBuilder {
    initial_capacity: u64,
    prob: f64,
    scale_size: u64,
    scale_prob: f64,
    factory: Option<BitmapFactory>,
    filters: Vec<BloomFilter>,
}

impl ScalingBloomFilterBuilder {
    pub(super) fn new(initial_capacity: u64, prob: f64) -> Self {
        ScalingBloomFilterBuilder {
            initial_capacity,
            prob,
            scale_size: 4,
            scale_prob: 0.9,
            factory: None,
            filters: Vec::new(),
        }
    }

    /// Sets the geometric capacity growth factor (default 4).
    pub fn scale_size(mut self, scale_size: u64) -> Self {
        self.scale_size = scale_size;
        self
    }

    /// Sets the per-layer probability tightening factor (default 0.9).
    pub fn scale_prob(mut self, scale_prob: f64) -> Self {
        self.scale_prob = scale_prob;
        self
    }

    /// Supplies the factory that names the backing file for each layer.
    /// Without one, layers use anonymous bitmaps.
    pub fn bitmap_factory(mut self, factory: impl FnMut() -> PathBuf + 'static) -> Self {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Seeds the filter with previously persisted layers, oldest first.
    ///
    /// Each layer's capacity and probability target are re-derived from its
    /// bitmap size and position, reproducing what construction-time growth
    /// would have assigned. Counts and `k` come from the stored headers.
    pub fn filters(mut self, filters: Vec<BloomFilter>) -> Self {
        self.filters = filters;
        self
    }

    /// Builds the filter, creating the first layer immediately unless
    /// existing layers were supplied.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a zero capacity, a probability outside (0, 1),
    /// a growth factor below 2 or a tightening factor outside (0, 1); `Io`
    /// when a factory-backed first layer cannot be created.
    pub fn build(self) -> Result<ScalingBloomFilter, Error> {
        if self.initial_capacity == 0 {
            return Err(Error::invalid_argument("initial capacity must be positive"));
        }
        if !(self.prob > 0.0 && self.prob < 1.0) {
            return Err(
                Error::invalid_argument("probability must be in (0, 1) exclusive")
                    .with_context("prob", self.prob),
            );
        }
        if self.scale_size < 2 {
            return Err(Error::invalid_argument("scale size must be at least 2")
                .with_context("scale_size", self.scale_size));
        }
        if !(self.scale_prob > 0.0 && self.scale_prob < 1.0) {
            return Err(Error::invalid_argument(
                "probability reduction must be in (0, 1) exclusive",
            )
            .with_context("scale_prob", self.scale_prob));
        }

        // First-layer target: the per-layer series p0 * r^i sums to
        // p0 / (1 - r), so p0 = prob * (1 - r) keeps the total within prob.
        let p0 = self.prob * (1.0 - self.scale_prob);

        let mut filter = ScalingBloomFilter {
            layers: Vec::with_capacity(self.filters.len().max(1)),
            scale_size: self.scale_size,
            scale_prob: self.scale_prob,
            factory: self.factory,
        };

        if self.filters.is_empty() {
            filter.push_layer(self.initial_capacity, p0)?;
        } else {
            let mut prob = p0;
            for layer in self.filters {
                let capacity = BloomFilter::expected_capacity(layer.storage_bits(), prob);
                filter.layers.push(Layer {
                    filter: layer,
                    capacity,
                    prob,
                });
                prob *= self.scale_prob;
            }
        }

        Ok(filter)
    }
}
