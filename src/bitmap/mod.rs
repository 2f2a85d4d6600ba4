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

//! Bit-addressable memory-mapped regions.
//!
//! A [`Bitmap`] wraps a fixed-size mmap region and exposes it bit by bit.
//! The region is either anonymous (private to the process, lost on drop) or
//! backed by a file, in which case the on-disk representation is the raw
//! byte sequence itself: no magic, no header. Bit `i` lives in byte
//! `i >> 3` at position `7 - (i % 8)`, most-significant bit first, and that
//! formula *is* the file format.
//!
//! ```rust
//! use blooming::bitmap::Bitmap;
//!
//! let mut bitmap = Bitmap::anonymous(32)?;
//! assert_eq!(bitmap.len_bits(), 256);
//! bitmap.set(5, true);
//! assert!(bitmap.get(5));
//! assert!(!bitmap.get(4));
//! # Ok::<(), blooming::error::Error>(())
//! ```

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;

use memmap2::MmapMut;
use memmap2::MmapOptions;

use crate::error::Error;

/// Largest number of zero bytes appended per write while growing a short
/// file up to its mapped length.
const EXTEND_CHUNK: usize = 100_000;

/// A fixed-size, bit-addressable view over a memory-mapped byte region.
///
/// The mapping is created once, at construction, and never grows. Writes go
/// straight to the mapped pages; [`flush`](Bitmap::flush) makes them durable
/// for shared file-backed maps. Dropping a bitmap without flushing may lose
/// writes that only exist in dirty pages.
#[derive(Debug)]
pub struct Bitmap {
    map: Option<MmapMut>,
    file: Option<File>,
    size: usize,
}

impl Bitmap {
    /// Creates an anonymous bitmap of `size_bytes` bytes, zero-initialised.
    ///
    /// Anonymous maps are always private to the process: they cannot be
    /// flushed anywhere and their contents vanish on close.
    pub fn anonymous(size_bytes: usize) -> Result<Bitmap, Error> {
        Self::check_size(size_bytes)?;
        let map = MmapOptions::new().len(size_bytes).map_anon()?;
        Ok(Bitmap {
            map: Some(map),
            file: None,
            size: size_bytes,
        })
    }

    /// Opens (creating if needed) `path` and maps its first `size_bytes`
    /// bytes as a shared, writable region.
    ///
    /// A file shorter than `size_bytes` is zero-extended before mapping, in
    /// chunks of at most 100 000 bytes; mapping past the end of a short file
    /// is not portable. A longer file is left as is and only its prefix is
    /// mapped.
    pub fn open(path: impl AsRef<Path>, size_bytes: usize) -> Result<Bitmap, Error> {
        Self::check_size(size_bytes)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        zero_extend(&mut file, size_bytes as u64)?;
        let map = unsafe { MmapOptions::new().len(size_bytes).map_mut(&file)? };
        Ok(Bitmap {
            map: Some(map),
            file: Some(file),
            size: size_bytes,
        })
    }

    /// Like [`open`](Bitmap::open), but maps the file copy-on-write.
    ///
    /// Reads see the file contents; writes land in private pages and are
    /// never carried back to the file, so [`flush`](Bitmap::flush) is a
    /// no-op for this mode.
    pub fn open_private(path: impl AsRef<Path>, size_bytes: usize) -> Result<Bitmap, Error> {
        Self::check_size(size_bytes)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        zero_extend(&mut file, size_bytes as u64)?;
        let map = unsafe { MmapOptions::new().len(size_bytes).map_copy(&file)? };
        // The fd is not retained: a copy-on-write map never writes back, so
        // there is nothing to msync or fsync against.
        Ok(Bitmap {
            map: Some(map),
            file: None,
            size: size_bytes,
        })
    }

    fn check_size(size_bytes: usize) -> Result<(), Error> {
        if size_bytes == 0 {
            return Err(Error::invalid_argument("bitmap size must be positive"));
        }
        Ok(())
    }

    /// Returns the number of addressable bits, `8 * size_bytes`.
    pub fn len_bits(&self) -> usize {
        8 * self.size
    }

    /// Returns the size of the region in bytes.
    pub fn size_bytes(&self) -> usize {
        self.size
    }

    /// Returns whether the region is still mapped.
    ///
    /// All bit and byte accessors panic once the bitmap has been closed;
    /// [`flush`](Bitmap::flush) and [`close`](Bitmap::close) stay callable.
    pub fn is_open(&self) -> bool {
        self.map.is_some()
    }

    fn data(&self) -> &[u8] {
        match &self.map {
            Some(map) => map,
            None => panic!("bitmap is closed"),
        }
    }

    fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.map {
            Some(map) => map,
            None => panic!("bitmap is closed"),
        }
    }

    /// Returns the value of bit `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= len_bits()` or the bitmap is closed; both are
    /// programmer errors.
    pub fn get(&self, idx: usize) -> bool {
        assert!(idx < self.len_bits(), "bit index {idx} out of range");
        (self.data()[idx >> 3] >> (7 - (idx & 7))) & 1 == 1
    }

    /// Sets bit `idx` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= len_bits()` or the bitmap is closed.
    pub fn set(&mut self, idx: usize, value: bool) {
        assert!(idx < self.len_bits(), "bit index {idx} out of range");
        let mask = 1u8 << (7 - (idx & 7));
        let byte = &mut self.data_mut()[idx >> 3];
        if value {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }

    /// Returns the bytes in `[i, j)`.
    ///
    /// Requires `i < j <= size_bytes()`, otherwise an `IndexOutOfRange`
    /// error is returned.
    pub fn get_slice(&self, i: usize, j: usize) -> Result<&[u8], Error> {
        self.check_range(i, j)?;
        Ok(&self.data()[i..j])
    }

    /// Overwrites the bytes in `[i, j)` with `bytes`.
    ///
    /// Requires `i < j <= size_bytes()` and `bytes.len() == j - i`.
    pub fn set_slice(&mut self, i: usize, j: usize, bytes: &[u8]) -> Result<(), Error> {
        self.check_range(i, j)?;
        if bytes.len() != j - i {
            return Err(Error::index_out_of_range("slice length mismatch")
                .with_context("expected", j - i)
                .with_context("actual", bytes.len()));
        }
        self.data_mut()[i..j].copy_from_slice(bytes);
        Ok(())
    }

    fn check_range(&self, i: usize, j: usize) -> Result<(), Error> {
        if i >= j || j > self.size {
            return Err(Error::index_out_of_range("byte range out of bounds")
                .with_context("start", i)
                .with_context("end", j)
                .with_context("size_bytes", self.size));
        }
        Ok(())
    }

    /// Flushes the region to disk.
    ///
    /// For a shared file-backed map this is a synchronous `msync` of the
    /// mapped pages followed by an `fsync` of the descriptor; when it
    /// returns `Ok`, every prior write is durable. Anonymous and
    /// copy-on-write maps return `Ok` without issuing any syscall.
    pub fn flush(&self) -> Result<(), Error> {
        if let (Some(map), Some(file)) = (&self.map, &self.file) {
            map.flush()?;
            file.sync_all()?;
        }
        Ok(())
    }

    /// Unmaps the region and closes the backing file, optionally flushing
    /// first. Calling `close` again is a no-op.
    pub fn close(&mut self, flush: bool) -> Result<(), Error> {
        if self.map.is_none() {
            return Ok(());
        }
        if flush {
            self.flush()?;
        }
        self.map = None;
        self.file = None;
        Ok(())
    }

    /// Returns a new anonymous bitmap holding the byte-wise OR of the two
    /// regions. The sizes must match.
    pub fn union(&self, other: &Bitmap) -> Result<Bitmap, Error> {
        self.merged(other, |a, b| a | b)
    }

    /// Returns a new anonymous bitmap holding the byte-wise AND of the two
    /// regions. The sizes must match.
    pub fn intersect(&self, other: &Bitmap) -> Result<Bitmap, Error> {
        self.merged(other, |a, b| a & b)
    }

    fn merged(&self, other: &Bitmap, combine: fn(u8, u8) -> u8) -> Result<Bitmap, Error> {
        if self.size != other.size {
            return Err(Error::invalid_argument("bitmap sizes do not match")
                .with_context("left", self.size)
                .with_context("right", other.size));
        }
        let mut out = Bitmap::anonymous(self.size)?;
        let dst = out.data_mut();
        for ((d, a), b) in dst.iter_mut().zip(self.data()).zip(other.data()) {
            *d = combine(*a, *b);
        }
        Ok(out)
    }
}

/// Appends zero bytes until the file is at least `len` bytes long.
///
/// The size is re-checked from the file after every write, exactly the way
/// the region will later be observed through the mapping.
fn zero_extend(file: &mut File, len: u64) -> Result<(), Error> {
    let zeros = vec![0u8; EXTEND_CHUNK];
    loop {
        let current = file.metadata()?.len();
        if current >= len {
            return Ok(());
        }
        let diff = (len - current) as usize;
        file.seek(SeekFrom::End(0))?;
        file.write_all(&zeros[..diff.min(EXTEND_CHUNK)])?;
        file.flush()?;
    }
}
