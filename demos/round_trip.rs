// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Encodes random pairs over a random 32-bit prime field, then checks that every key decodes
//! to its value.

extern crate okvs;

use okvs::field::random_prime;
use okvs::{Blake3RowHasher, KeyValuePair, Okvs, OkvsError, OkvsParams, RowHasher};
use rand::rngs::OsRng;
use simplelog::{Config, SimpleLogger};
use std::time::Instant;

const NUM_PAIRS: usize = 1000;
const EXPANSION: f64 = 0.03;
const BAND_WIDTH: usize = 360;
const MODULUS_BITS: u32 = 32;

fn main() -> Result<(), OkvsError> {
    SimpleLogger::init(log::LevelFilter::Info, Config::default())
        .expect("no other logger is installed");
    let mut rng = OsRng;

    let modulus = random_prime(MODULUS_BITS, &mut rng)?;
    let params = OkvsParams::with_expansion(NUM_PAIRS, EXPANSION, BAND_WIDTH, modulus)?;
    let field = params.field();
    let pairs: Vec<KeyValuePair> = (0..NUM_PAIRS)
        .map(|_| {
            KeyValuePair::new(field.random_element(&mut rng), field.random_element(&mut rng))
        })
        .collect();
    log::info!(
        "N = {}, M = {}, W = {}, Q = {}",
        params.num_pairs(),
        params.encoded_len(),
        params.band_width(),
        modulus
    );

    let start = Instant::now();
    let okvs = Okvs::new(params, Blake3RowHasher::random(&mut rng)).encode(&pairs)?;
    log::info!("Encoded {} pairs in {:?}", NUM_PAIRS, start.elapsed());

    let start = Instant::now();
    let mut mismatches = 0;
    for pair in &pairs {
        let decoded = okvs.decode(pair.key);
        if decoded != pair.value {
            log::error!(
                "Key {} decoded to {}, expected {}",
                pair.key,
                decoded,
                pair.value
            );
            mismatches += 1;
        }
    }
    log::info!(
        "Decoded {} keys in {:?}, {} mismatches",
        NUM_PAIRS,
        start.elapsed(),
        mismatches
    );

    let band = okvs.hasher().row(pairs[0].key, okvs.params());
    println!(
        "Key {} occupies columns {}..{} ({} set)",
        pairs[0].key,
        band.position(),
        band.position() + band.width(),
        band.columns().count()
    );
    Ok(())
}
