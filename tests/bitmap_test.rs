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

use std::fs;
use std::io::Write;

use blooming::bitmap::Bitmap;

#[test]
fn test_anonymous_basic() {
    let mut bitmap = Bitmap::anonymous(32).unwrap();
    assert_eq!(bitmap.len_bits(), 256);

    bitmap.set(5, true);
    assert!(bitmap.get(5));
    assert!(!bitmap.get(4));
}

#[test]
fn test_file_backed_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.mmap");

    let mut bitmap = Bitmap::open(&path, 4096).unwrap();
    bitmap.set(1000, true);
    bitmap.close(true).unwrap();

    let bitmap = Bitmap::open(&path, 4096).unwrap();
    assert!(bitmap.get(1000));
    assert!(!bitmap.get(999));
    assert!(!bitmap.get(1001));
}

#[test]
fn test_byte_layout_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layout.mmap");

    let mut bitmap = Bitmap::open(&path, 16).unwrap();
    // Bit 12 = byte 1, position 7 - 4 = 3.
    bitmap.set(12, true);
    bitmap.close(true).unwrap();

    let raw = fs::read(&path).unwrap();
    assert_eq!(raw.len(), 16);
    assert_eq!(raw[1], 1 << 3);
    assert!(raw.iter().enumerate().all(|(i, &b)| i == 1 || b == 0));
}

#[test]
fn test_short_file_zero_extended() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.mmap");

    let mut file = fs::File::create(&path).unwrap();
    file.write_all(&[0xFF; 10]).unwrap();
    drop(file);

    let bitmap = Bitmap::open(&path, 300_000).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 300_000);

    // Existing content survives, the extension reads as zeros.
    assert_eq!(bitmap.get_slice(0, 10).unwrap(), &[0xFF; 10]);
    assert!(bitmap.get_slice(10, 300_000).unwrap().iter().all(|&b| b == 0));
}

#[test]
fn test_longer_file_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.mmap");
    fs::write(&path, vec![0u8; 128]).unwrap();

    let bitmap = Bitmap::open(&path, 64).unwrap();
    assert_eq!(bitmap.size_bytes(), 64);
    assert_eq!(fs::metadata(&path).unwrap().len(), 128);
}

#[test]
fn test_private_map_never_writes_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cow.mmap");

    let mut bitmap = Bitmap::open(&path, 64).unwrap();
    bitmap.set(0, true);
    bitmap.close(true).unwrap();

    let mut private = Bitmap::open_private(&path, 64).unwrap();
    assert!(private.get(0));
    private.set(100, true);
    private.flush().unwrap();
    private.close(true).unwrap();

    let shared = Bitmap::open(&path, 64).unwrap();
    assert!(shared.get(0));
    assert!(!shared.get(100));
}

#[test]
fn test_flush_then_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flush.mmap");

    let mut bitmap = Bitmap::open(&path, 64).unwrap();
    bitmap.set(7, true);
    bitmap.flush().unwrap();
    bitmap.close(false).unwrap();

    let bitmap = Bitmap::open(&path, 64).unwrap();
    assert!(bitmap.get(7));
}

#[test]
fn test_double_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("double.mmap");

    let mut bitmap = Bitmap::open(&path, 64).unwrap();
    bitmap.close(true).unwrap();
    bitmap.close(true).unwrap();
    bitmap.flush().unwrap();
}
