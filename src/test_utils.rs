// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Common test utilities for the `okvs` crate.

use crate::{
    hashing::{Band, RowHasher},
    params::OkvsParams,
    store::encode_with_retries,
    Column, FieldElement, KeyValuePair,
};
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use simplelog::{Config, WriteLogger};
use std::collections::HashMap;
use std::sync::Once;

static INIT: Once = Once::new();

/// Encoding attempts allowed in randomized tests before a failure is reported.
const ATTEMPTS: usize = 32;

// For use in manual testing and inspection.
pub(crate) fn init_logger() {
    INIT.call_once(|| {
        WriteLogger::init(log::LevelFilter::Info, Config::default(), std::io::stdout()).unwrap()
    })
}

/// Samples `N` pairs with distinct keys and uniformly random values.
pub(crate) fn random_pairs<R: RngCore + CryptoRng>(
    params: &OkvsParams,
    rng: &mut R,
) -> Vec<KeyValuePair> {
    KeyValuePair::random_distinct(params, rng).unwrap()
}

/// A `RowHasher` with hand-picked bands. Keys without a band fall back to a band derived
/// from the key's integer value.
#[derive(Clone, Debug)]
pub(crate) struct StubRowHasher {
    rows: HashMap<u64, (Column, Vec<bool>)>,
}

impl StubRowHasher {
    pub(crate) fn from_rows<const W: usize>(rows: &[(u64, Column, [bool; W])]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|(key, position, bits)| (*key, (*position, bits.to_vec())))
                .collect(),
        }
    }
}

impl RowHasher for StubRowHasher {
    fn position(&self, key: FieldElement, params: &OkvsParams) -> Column {
        match self.rows.get(&key.value()) {
            Some((position, _)) => *position,
            None => (key.value() % params.hash_range() as u64) as Column,
        }
    }

    fn band(&self, position: Column, key: FieldElement, params: &OkvsParams) -> Band {
        match self.rows.get(&key.value()) {
            Some((_, bits)) => Band::from_bits(position, bits),
            None => {
                let bits: Vec<bool> = (0..params.band_width())
                    .map(|offset| (key.value() >> (offset % 64)) & 1 == 1)
                    .collect();
                Band::from_bits(position, &bits)
            }
        }
    }
}

/// Encodes random pairs under the given parameters and checks that every key decodes to its value.
pub(crate) fn test_round_trip(
    num_pairs: usize,
    encoded_len: usize,
    band_width: usize,
    modulus: u64,
) {
    init_logger();
    let mut rng = StdRng::seed_from_u64(0);
    let params = OkvsParams::new(num_pairs, encoded_len, band_width, modulus).unwrap();
    let pairs = random_pairs(&params, &mut rng);

    let okvs = encode_with_retries(params, &pairs, ATTEMPTS, &mut rng).unwrap();
    assert_eq!(okvs.vector().len(), encoded_len);
    for (index, pair) in pairs.iter().enumerate() {
        assert_eq!(okvs.decode(pair.key), pair.value, "{index}");
    }
}

macro_rules! create_round_trip_test {
    ($num_pairs: expr, $encoded_len: expr, $band_width: expr, $modulus: expr) => {
        paste::paste! {
            #[test]
            fn [<test_round_trip_ $num_pairs _ $encoded_len _ $band_width _ $modulus>]() {
                crate::test_utils::test_round_trip($num_pairs, $encoded_len, $band_width, $modulus);
            }
        }
    };
}

macro_rules! create_round_trip_tests {
    () => {
        crate::test_utils::create_round_trip_test!(1, 2, 1, 2);
        crate::test_utils::create_round_trip_test!(1, 5, 4, 257);
        crate::test_utils::create_round_trip_test!(10, 20, 8, 257);
        crate::test_utils::create_round_trip_test!(100, 120, 32, 257);
        crate::test_utils::create_round_trip_test!(100, 120, 32, 65537);
        crate::test_utils::create_round_trip_test!(200, 220, 64, 4294967291);
        // Bands wider than 64 bits, over a 64-bit field.
        crate::test_utils::create_round_trip_test!(300, 330, 100, 18446744073709551557);
    };
}

pub(crate) use create_round_trip_test;
pub(crate) use create_round_trip_tests;
