// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The lifecycle of an OKVS instance.
//!
//! An `Okvs` is a configured instance. Encoding consumes it: success yields an `EncodedOkvs`,
//! which answers queries indefinitely, and failure leaves nothing behind to reuse.

use crate::{
    encoder::{encode_vector, EncodedVector},
    field::FieldElement,
    hashing::{Blake3RowHasher, RowHasher},
    params::OkvsParams,
    KeyValuePair, OkvsError,
};
use rand::{CryptoRng, RngCore};

/// An OKVS instance that has been configured but not yet encoded.
#[derive(Clone, Debug)]
pub struct Okvs<H: RowHasher = Blake3RowHasher> {
    params: OkvsParams,
    hasher: H,
}

impl<H: RowHasher> Okvs<H> {
    /// Configures an instance with `params`, deriving bands with `hasher`.
    pub fn new(params: OkvsParams, hasher: H) -> Self {
        Self { params, hasher }
    }

    /// The instance parameters.
    pub fn params(&self) -> &OkvsParams {
        &self.params
    }

    /// Encodes exactly `N` pairs.
    pub fn encode(self, pairs: &[KeyValuePair]) -> Result<EncodedOkvs<H>, OkvsError> {
        log::debug!(
            "Okvs::encode -- N = {}, M = {}, W = {}",
            self.params.num_pairs(),
            self.params.encoded_len(),
            self.params.band_width()
        );
        let vector = encode_vector(&self.params, &self.hasher, pairs)?;
        Ok(EncodedOkvs {
            params: self.params,
            hasher: self.hasher,
            vector,
        })
    }
}

/// Encodes `pairs` with a freshly keyed `Blake3RowHasher`, re-keying after every
/// `EncodingFailure`, for up to `attempts` attempts. Any other error is returned at once.
pub fn encode_with_retries<R: RngCore + CryptoRng>(
    params: OkvsParams,
    pairs: &[KeyValuePair],
    attempts: usize,
    rng: &mut R,
) -> Result<EncodedOkvs<Blake3RowHasher>, OkvsError> {
    if attempts == 0 {
        return Err(OkvsError::InvalidConfiguration(
            "at least one encoding attempt is required".into(),
        ));
    }

    let mut attempt = 1;
    loop {
        let okvs = Okvs::new(params, Blake3RowHasher::random(rng));
        match okvs.encode(pairs) {
            Err(error @ OkvsError::EncodingFailure { .. }) if attempt < attempts => {
                log::warn!(
                    "Attempt {} of {} failed ({}); retrying with a fresh seed",
                    attempt,
                    attempts,
                    error
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// An encoded OKVS. Decoding is a total function of the key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedOkvs<H: RowHasher = Blake3RowHasher> {
    params: OkvsParams,
    hasher: H,
    vector: EncodedVector,
}

impl<H: RowHasher> EncodedOkvs<H> {
    /// Reassembles an encoded OKVS from its parts, e.g. after `vector` was received from a peer.
    pub fn from_parts(
        params: OkvsParams,
        hasher: H,
        vector: EncodedVector,
    ) -> Result<Self, OkvsError> {
        if vector.len() != params.encoded_len() {
            return Err(OkvsError::MalformedEncoding(format!(
                "expected {} elements, found {}",
                params.encoded_len(),
                vector.len()
            )));
        }
        let field = params.field();
        if let Some(column) = vector.as_slice().iter().position(|e| !field.contains(*e)) {
            return Err(OkvsError::MalformedEncoding(format!(
                "element {} is not reduced modulo {}",
                column,
                field.modulus()
            )));
        }
        Ok(Self {
            params,
            hasher,
            vector,
        })
    }

    /// Returns the value stored for `key`. For keys that were never encoded the result is an
    /// arbitrary field element.
    pub fn decode(&self, key: FieldElement) -> FieldElement {
        decode_vector(&self.params, &self.hasher, &self.vector, key)
    }

    /// Decodes every key in `keys`.
    pub fn decode_many(&self, keys: &[FieldElement]) -> Vec<FieldElement> {
        keys.iter().map(|key| self.decode(*key)).collect()
    }

    /// The instance parameters.
    pub fn params(&self) -> &OkvsParams {
        &self.params
    }

    /// The hasher the instance was encoded with.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// The encoded vector `P`.
    pub fn vector(&self) -> &EncodedVector {
        &self.vector
    }

    /// Consumes `self`, returning the encoded vector `P`.
    pub fn into_vector(self) -> EncodedVector {
        self.vector
    }
}

/// Sums the entries of `vector` selected by the band of `key`, reduced modulo `Q`.
/// Columns beyond the end of `vector` count as zero.
pub fn decode_vector<H: RowHasher + ?Sized>(
    params: &OkvsParams,
    hasher: &H,
    vector: &EncodedVector,
    key: FieldElement,
) -> FieldElement {
    let field = params.field();
    let band = hasher.row(field.element(key.value()), params);
    field.sum(
        band.columns().map(|column| vector.get(column).unwrap_or(FieldElement::ZERO)),
    )
}
