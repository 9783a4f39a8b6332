// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Derivation of the band (row pattern) of a key.

use crate::{field::FieldElement, params::OkvsParams, Column};
use rand::{CryptoRng, RngCore};

const POSITION_CONTEXT: &str = "okvs 2024-01-01 band position";
const BAND_CONTEXT: &str = "okvs 2024-01-01 band mask";

/// The nonzero pattern of the row of a key: a window of `width` columns starting at `position`,
/// and a bit mask over that window. Bit `j` of the mask (most significant bit of byte 0 first)
/// is set iff column `position + j` of the row is 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Band {
    position: Column,
    width: usize,
    mask: Vec<u8>,
}

impl Band {
    /// Builds a band from a mask given as bytes. The mask is truncated or zero-padded to
    /// `width` bits.
    pub fn from_mask(position: Column, width: usize, mut mask: Vec<u8>) -> Self {
        mask.resize(width.div_ceil(8), 0);
        let trailing_bits = width % 8;
        if trailing_bits != 0 {
            if let Some(last) = mask.last_mut() {
                *last &= 0xFFu8 << (8 - trailing_bits);
            }
        }
        Self {
            position,
            width,
            mask,
        }
    }

    /// Builds a band whose mask is `bits`, one entry per column.
    pub fn from_bits(position: Column, bits: &[bool]) -> Self {
        let mut mask = vec![0u8; bits.len().div_ceil(8)];
        for (offset, bit) in bits.iter().enumerate() {
            if *bit {
                mask[offset / 8] |= 0x80 >> (offset % 8);
            }
        }
        Self {
            position,
            width: bits.len(),
            mask,
        }
    }

    /// The first column of the band.
    pub fn position(&self) -> Column {
        self.position
    }

    /// The number of columns in the band.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The mask bytes.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Returns true iff the mask bit at `offset` (relative to `position`) is set.
    pub fn is_set_at_offset(&self, offset: usize) -> bool {
        offset < self.width && (self.mask[offset / 8] >> (7 - offset % 8)) & 1 == 1
    }

    /// Returns true iff the row is 1 at absolute `column`.
    pub fn is_set(&self, column: Column) -> bool {
        column
            .checked_sub(self.position)
            .is_some_and(|offset| self.is_set_at_offset(offset))
    }

    /// Iterates over the set offsets, relative to `position`.
    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.width).filter(|offset| self.is_set_at_offset(*offset))
    }

    /// Iterates over the absolute columns at which the row is 1.
    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.offsets().map(|offset| self.position + offset)
    }
}

/// Derives the band of a key. Implementations must be deterministic in `(key, params)`,
/// and must derive the position and the mask from independent hash invocations.
pub trait RowHasher {
    /// Returns the first column of the band of `key`, in `0..params.hash_range()`.
    fn position(&self, key: FieldElement, params: &OkvsParams) -> Column;

    /// Returns the band of `key` placed at `position`.
    fn band(&self, position: Column, key: FieldElement, params: &OkvsParams) -> Band;

    /// Returns the band of `key`.
    fn row(&self, key: FieldElement, params: &OkvsParams) -> Band {
        let position = self.position(key, params);
        self.band(position, key, params)
    }
}

/// A 32-byte seed keying a `Blake3RowHasher`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HashSeed([u8; 32]);

impl HashSeed {
    /// Samples a fresh seed.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        Self(seed)
    }

    /// The seed bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for HashSeed {
    fn from(seed: [u8; 32]) -> Self {
        Self(seed)
    }
}

/// A `RowHasher` built on keyed BLAKE3. Positions and masks are computed under two
/// subkeys derived from the seed with distinct contexts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blake3RowHasher {
    seed: HashSeed,
    position_key: [u8; 32],
    band_key: [u8; 32],
}

impl Blake3RowHasher {
    /// Returns the hasher keyed by `seed`.
    pub fn new(seed: HashSeed) -> Self {
        Self {
            seed,
            position_key: blake3::derive_key(POSITION_CONTEXT, seed.as_bytes()),
            band_key: blake3::derive_key(BAND_CONTEXT, seed.as_bytes()),
        }
    }

    /// Returns a hasher keyed by a fresh random seed.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::new(HashSeed::random(rng))
    }

    /// The seed this hasher was built from.
    pub fn seed(&self) -> HashSeed {
        self.seed
    }
}

impl Default for Blake3RowHasher {
    fn default() -> Self {
        Self::new(HashSeed::default())
    }
}

impl RowHasher for Blake3RowHasher {
    fn position(&self, key: FieldElement, params: &OkvsParams) -> Column {
        let digest = blake3::Hasher::new_keyed(&self.position_key)
            .update(&key.to_be_bytes())
            .finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        // The remainder is below `hash_range`, which is a `usize`.
        (u64::from_be_bytes(prefix) % params.hash_range() as u64) as Column
    }

    fn band(&self, position: Column, key: FieldElement, params: &OkvsParams) -> Band {
        let width = params.band_width();
        let mut mask = vec![0u8; width.div_ceil(8)];
        blake3::Hasher::new_keyed(&self.band_key)
            .update(&key.to_be_bytes())
            .finalize_xof()
            .fill(&mut mask);
        Band::from_mask(position, width, mask)
    }
}
