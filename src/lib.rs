// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! An implementation of a banded Oblivious Key-Value Store (OKVS).
//!
//! An OKVS encodes `N` key/value pairs of prime-field elements into a vector `P` of `M`
//! field elements. Each key is hashed to a band of `W` consecutive columns and a pseudorandom
//! bit mask inside that band; the value for the key is the sum of the masked entries of `P`.
//! Encoding solves the resulting sparse linear system with banded Gaussian elimination.
//!
//! ```
//! use okvs::{KeyValuePair, OkvsParams};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let params = OkvsParams::with_expansion(100, 0.1, 64, 4294967291)?;
//! let mut rng = StdRng::seed_from_u64(0);
//! let pairs = KeyValuePair::random_distinct(&params, &mut rng)?;
//!
//! let okvs = okvs::encode_with_retries(params, &pairs, 4, &mut rng)?;
//! for pair in &pairs {
//!     assert_eq!(okvs.decode(pair.key), pair.value);
//! }
//! # Ok::<(), okvs::OkvsError>(())
//! ```

#![warn(clippy::cargo, clippy::doc_markdown, missing_docs, rustdoc::all)]

use rand::{CryptoRng, RngCore};
use std::collections::HashSet;
use std::num::TryFromIntError;
use thiserror::Error;

pub mod codec;
pub mod encoder;
pub mod field;
pub mod hashing;
pub mod params;
pub mod store;
pub mod system;

#[cfg(test)]
mod test_utils;

pub use encoder::EncodedVector;
pub use field::{FieldElement, PrimeField};
pub use hashing::{Band, Blake3RowHasher, HashSeed, RowHasher};
pub use params::OkvsParams;
pub use store::{encode_with_retries, EncodedOkvs, Okvs};

/// A column index into the encoded vector `P`.
pub type Column = usize;

/// A key/value pair to be stored in an OKVS. Both components are elements of the configured field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct KeyValuePair {
    /// The key.
    pub key: FieldElement,
    /// The value associated with `key`.
    pub value: FieldElement,
}

impl KeyValuePair {
    /// Pairs `key` with `value`.
    pub fn new(key: FieldElement, value: FieldElement) -> Self {
        Self { key, value }
    }

    /// Samples `N` pairs with distinct uniformly random keys and uniformly random values.
    /// The output order depends only on `rng`.
    pub fn random_distinct<R: RngCore + CryptoRng>(
        params: &OkvsParams,
        rng: &mut R,
    ) -> Result<Vec<Self>, OkvsError> {
        let field = params.field();
        if params.num_pairs() as u64 > field.modulus() {
            return Err(OkvsError::InvalidConfiguration(format!(
                "cannot sample {} distinct keys modulo {}",
                params.num_pairs(),
                field.modulus()
            )));
        }

        let mut keys = HashSet::new();
        let mut pairs = Vec::with_capacity(params.num_pairs());
        while pairs.len() < params.num_pairs() {
            let key = field.random_element(rng);
            if keys.insert(key) {
                pairs.push(Self::new(key, field.random_element(rng)));
            }
        }
        Ok(pairs)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors that can arise while configuring or encoding an OKVS.
pub enum OkvsError {
    /// Arises when the number of supplied pairs differs from the configured `N`.
    #[error("Expected {expected} key/value pairs but {actual} were supplied")]
    ConfigMismatch {
        /// The configured number of pairs.
        expected: usize,
        /// The number of pairs actually supplied.
        actual: usize,
    },

    /// Arises when forward elimination finds no pivot for an equation.
    /// The instance must be discarded and rebuilt with a fresh hash seed or larger parameters.
    #[error("No pivot found for equation {row} (derived from pair {origin})")]
    EncodingFailure {
        /// Index of the failing equation after sorting by band position.
        row: usize,
        /// Index of the key/value pair the failing equation was built from.
        origin: usize,
    },

    /// Arises when a modular inverse of an element without one is requested.
    #[error("{element} has no inverse modulo {modulus}")]
    NonInvertibleElement {
        /// The element that was to be inverted.
        element: u64,
        /// The field modulus.
        modulus: u64,
    },

    /// Arises when OKVS parameters are rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Arises when a serialized encoded vector cannot be parsed.
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    /// Arises from a failed integer conversion.
    #[error("Arithmetic error encountered.")]
    IntegerConversionError(#[from] TryFromIntError),
}
