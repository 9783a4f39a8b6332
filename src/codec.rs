// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Byte layout of the encoded vector for storage or transport.
//!
//! Elements are written in column order, each as a big-endian integer of
//! `PrimeField::byte_width` bytes. There is no header: the reader must know the parameters.

use crate::{
    encoder::EncodedVector,
    field::{FieldElement, PrimeField},
    params::OkvsParams,
    OkvsError,
};

impl EncodedVector {
    /// Serializes `self` as fixed-width big-endian elements of `field`.
    ///
    /// Panics if an element is not reduced modulo the modulus of `field`.
    pub fn to_bytes(&self, field: &PrimeField) -> Vec<u8> {
        let width = field.byte_width();
        let mut bytes = Vec::with_capacity(self.len() * width);
        for element in self.as_slice() {
            assert!(field.contains(*element));
            bytes.extend_from_slice(&element.to_be_bytes()[8 - width..]);
        }
        bytes
    }

    /// Parses a vector serialized by `to_bytes` under `params`.
    pub fn from_bytes(bytes: &[u8], params: &OkvsParams) -> Result<Self, OkvsError> {
        let field = params.field();
        let width = field.byte_width();
        let expected = params.encoded_len() * width;
        if bytes.len() != expected {
            return Err(OkvsError::MalformedEncoding(format!(
                "expected {} bytes, found {}",
                expected,
                bytes.len()
            )));
        }

        let mut elements = Vec::with_capacity(params.encoded_len());
        for (column, chunk) in bytes.chunks_exact(width).enumerate() {
            let mut padded = [0u8; 8];
            padded[8 - width..].copy_from_slice(chunk);
            let element = FieldElement::from(u64::from_be_bytes(padded));
            if !field.contains(element) {
                return Err(OkvsError::MalformedEncoding(format!(
                    "element {} ({}) is not reduced modulo {}",
                    column,
                    element,
                    field.modulus()
                )));
            }
            elements.push(element);
        }
        log::debug!(
            "EncodedVector::from_bytes -- {} elements of {} bytes",
            elements.len(),
            width
        );
        Ok(Self(elements))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        encoder::EncodedVector, params::OkvsParams, store::encode_with_retries,
        test_utils::random_pairs, EncodedOkvs, FieldElement, OkvsError,
    };
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_layout_mod_257() {
        let params = OkvsParams::new(2, 3, 1, 257).unwrap();
        let field = params.field();
        let vector =
            EncodedVector::from_elements([0u16, 256, 1].map(FieldElement::from).to_vec(), &field)
                .unwrap();
        let bytes = vector.to_bytes(&field);
        assert_eq!(bytes, vec![0, 0, 1, 0, 0, 1]);
        assert_eq!(EncodedVector::from_bytes(&bytes, &params).unwrap(), vector);
    }

    #[test]
    #[should_panic]
    fn test_unreduced_element_is_not_truncated() {
        let params = OkvsParams::new(2, 3, 1, 257).unwrap();
        // 70000 needs three bytes, but elements modulo 257 are written in two.
        let vector = EncodedVector([1u32, 70000, 2].map(FieldElement::from).to_vec());
        vector.to_bytes(&params.field());
    }

    #[test]
    fn test_rejects_bad_input() {
        let params = OkvsParams::new(2, 3, 1, 257).unwrap();
        assert!(matches!(
            EncodedVector::from_bytes(&[0, 0, 1, 0, 0], &params),
            Err(OkvsError::MalformedEncoding(_))
        ));
        // 257 is not a field element.
        assert!(matches!(
            EncodedVector::from_bytes(&[0, 0, 1, 1, 0, 1], &params),
            Err(OkvsError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_transported_vector_decodes() {
        let mut rng = StdRng::seed_from_u64(0);
        let params = OkvsParams::new(100, 120, 32, 4294967291).unwrap();
        let pairs = random_pairs(&params, &mut rng);
        let okvs = encode_with_retries(params, &pairs, 32, &mut rng).unwrap();

        let bytes = okvs.vector().to_bytes(&params.field());
        assert_eq!(bytes.len(), 120 * 4);

        let received = EncodedVector::from_bytes(&bytes, &params).unwrap();
        let receiver = EncodedOkvs::from_parts(params, okvs.hasher().clone(), received).unwrap();
        for pair in &pairs {
            assert_eq!(receiver.decode(pair.key), pair.value);
        }
    }
}
