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

use blooming::bitmap::Bitmap;
use blooming::bloom::BloomFilter;
use blooming::bloom::HEADER_BYTES;
use googletest::assert_that;
use googletest::prelude::le;

#[test]
fn test_for_capacity() {
    let mut filter = BloomFilter::for_capacity(1000, 0.01).unwrap();

    assert!(!filter.contains("test"));
    filter.add("test", false);
    assert!(filter.contains("test"));
    assert_eq!(filter.len(), 1);
}

#[test]
fn test_false_positive_rate_within_design() {
    let mut filter = BloomFilter::for_capacity(1000, 0.01).unwrap();
    for i in 0..1000u32 {
        filter.add(format!("key{i}"), false);
    }

    // Every inserted key must be reported.
    for i in 0..1000u32 {
        assert!(filter.contains(format!("key{i}")));
    }

    // Non-members should false-positive at roughly the design rate; allow
    // 2x for statistical noise.
    let false_positives = (0..10_000u32)
        .filter(|i| filter.contains(format!("absent{i}")))
        .count();
    let rate = false_positives as f64 / 10_000.0;
    assert_that!(rate, le(0.02));
}

#[test]
fn test_header_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bloom.mmap");
    let (bytes, k) = BloomFilter::params_for_capacity(1000, 0.01);
    assert_eq!(k, 7);

    let bitmap = Bitmap::open(&path, bytes as usize).unwrap();
    let mut filter = BloomFilter::new(bitmap, k).unwrap();
    filter.add("foo", false);
    filter.flush().unwrap();
    filter.close().unwrap();

    // Reopen with a bogus k: the stored parameters must win.
    let bitmap = Bitmap::open(&path, bytes as usize).unwrap();
    let filter = BloomFilter::new(bitmap, 1).unwrap();
    assert_eq!(filter.k(), 7);
    assert_eq!(filter.len(), 1);
    assert!(filter.contains("foo"));
}

#[test]
fn test_membership_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.mmap");
    let (bytes, k) = BloomFilter::params_for_capacity(500, 0.001);

    let bitmap = Bitmap::open(&path, bytes as usize).unwrap();
    let mut filter = BloomFilter::new(bitmap, k).unwrap();
    for i in 0..500u32 {
        filter.add(format!("key{i}"), true);
    }
    let count = filter.len();
    filter.close().unwrap();

    let bitmap = Bitmap::open(&path, bytes as usize).unwrap();
    let reopened = BloomFilter::new(bitmap, k).unwrap();
    assert_eq!(reopened.len(), count);
    assert_eq!(reopened.k(), k);
    for i in 0..500u32 {
        assert!(reopened.contains(format!("key{i}")));
    }
}

#[test]
fn test_close_without_flush_still_persists_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("close.mmap");
    let (bytes, k) = BloomFilter::params_for_capacity(100, 0.01);

    let bitmap = Bitmap::open(&path, bytes as usize).unwrap();
    let mut filter = BloomFilter::new(bitmap, k).unwrap();
    filter.add("persisted", false);
    filter.close().unwrap();

    let bitmap = Bitmap::open(&path, bytes as usize).unwrap();
    let filter = BloomFilter::new(bitmap, k).unwrap();
    assert_eq!(filter.len(), 1);
    assert!(filter.contains("persisted"));
}

#[test]
fn test_fresh_region_takes_requested_k() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.mmap");

    let bitmap = Bitmap::open(&path, 1024 + HEADER_BYTES).unwrap();
    let filter = BloomFilter::new(bitmap, 3).unwrap();
    assert_eq!(filter.k(), 3);
    assert_eq!(filter.len(), 0);
}

#[test]
fn test_sizing_helpers_agree() {
    let (bytes, _) = BloomFilter::params_for_capacity(1000, 0.01);
    let storage_bits = (bytes - HEADER_BYTES as u64) * 8;
    assert_that!(
        BloomFilter::expected_probability(storage_bits, 1000),
        le(0.01)
    );
    assert!(BloomFilter::expected_capacity(storage_bits, 0.01) >= 1000);
    assert_eq!(BloomFilter::extra_buffer(), HEADER_BYTES);
}
