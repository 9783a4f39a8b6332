// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Parameters of an OKVS instance.
//!
//! The usual choice is `M = (1 + epsilon) * N` and `W = O(lambda / epsilon + log N)`,
//! where `epsilon` is the expansion rate and `lambda` the statistical security parameter
//! bounding the probability that encoding fails.

use crate::{field::PrimeField, OkvsError};

/// The validated, immutable parameters `(N, M, W, Q)` of an OKVS instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OkvsParams {
    num_pairs: usize,
    encoded_len: usize,
    band_width: usize,
    field: PrimeField,
}

impl OkvsParams {
    /// Validates and returns the parameters for storing `num_pairs` pairs in a vector of
    /// `encoded_len` elements of the field of integers modulo `modulus`, using bands of
    /// `band_width` columns.
    pub fn new(
        num_pairs: usize,
        encoded_len: usize,
        band_width: usize,
        modulus: u64,
    ) -> Result<Self, OkvsError> {
        if num_pairs == 0 {
            return Err(OkvsError::InvalidConfiguration(
                "the number of pairs must be positive".into(),
            ));
        }
        if band_width == 0 {
            return Err(OkvsError::InvalidConfiguration(
                "the band width must be positive".into(),
            ));
        }
        if encoded_len <= band_width {
            return Err(OkvsError::InvalidConfiguration(format!(
                "the encoded length ({}) must exceed the band width ({})",
                encoded_len, band_width
            )));
        }
        let field = PrimeField::new(modulus)?;

        log::debug!(
            "OkvsParams::new -- N = {}, M = {}, W = {}, Q = {}",
            num_pairs,
            encoded_len,
            band_width,
            modulus
        );

        Ok(Self {
            num_pairs,
            encoded_len,
            band_width,
            field,
        })
    }

    /// Like `new`, with `M = round((1 + expansion) * N)`.
    pub fn with_expansion(
        num_pairs: usize,
        expansion: f64,
        band_width: usize,
        modulus: u64,
    ) -> Result<Self, OkvsError> {
        if !(expansion.is_finite() && expansion >= 0.0) {
            return Err(OkvsError::InvalidConfiguration(format!(
                "invalid expansion rate {}",
                expansion
            )));
        }
        let encoded_len = (num_pairs as f64 * (1.0 + expansion)).round() as usize;
        Self::new(num_pairs, encoded_len, band_width, modulus)
    }

    /// The number of key/value pairs `N`.
    pub fn num_pairs(&self) -> usize {
        self.num_pairs
    }

    /// The length `M` of the encoded vector.
    pub fn encoded_len(&self) -> usize {
        self.encoded_len
    }

    /// The band width `W`.
    pub fn band_width(&self) -> usize {
        self.band_width
    }

    /// The field over which pairs are stored.
    pub fn field(&self) -> PrimeField {
        self.field
    }

    /// The number of possible band positions, `M - W`.
    pub fn hash_range(&self) -> usize {
        self.encoded_len - self.band_width
    }
}
