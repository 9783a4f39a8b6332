// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! A simple interactive demonstration of an OKVS.

use okvs::{encode_with_retries, FieldElement, KeyValuePair, OkvsParams};
use rand::rngs::OsRng;
use rustyline::history::FileHistory;
use rustyline::Editor;

const MODULUS: u64 = 4294967291;
const ATTEMPTS: usize = 8;

fn parse_number(
    prompt: &str,
    rl: &mut Editor<(), FileHistory>,
) -> Result<u64, Box<dyn std::error::Error>> {
    Ok(loop {
        println!("{}", prompt);
        println!();
        let readline: String = rl.readline("> ")?;
        let number_parse = readline.parse::<u64>();
        match number_parse {
            Ok(number) => break number,
            Err(_) => {
                println!("Expected a number. Try again.");
                continue;
            }
        }
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = OsRng;

    let mut rl = Editor::<(), _>::new()?;

    let num_pairs: usize = parse_number("How many pairs would you like to store?", &mut rl)?
        .try_into()?;
    let band_width = num_pairs.max(8);
    let params = OkvsParams::with_expansion(num_pairs, 1.0, band_width, MODULUS)
        .or_else(|_| OkvsParams::new(num_pairs, num_pairs + band_width, band_width, MODULUS))?;
    let field = params.field();

    let mut pairs = Vec::with_capacity(num_pairs);
    while pairs.len() < num_pairs {
        let key = field.element(parse_number(
            &format!("Key {} of {}?", pairs.len() + 1, num_pairs),
            &mut rl,
        )?);
        if pairs.iter().any(|pair: &KeyValuePair| pair.key == key) {
            println!("Key {} was already stored. Try again.", key);
            continue;
        }
        let value = field.element(parse_number("Value?", &mut rl)?);
        pairs.push(KeyValuePair::new(key, value));
    }

    let okvs = encode_with_retries(params, &pairs, ATTEMPTS, &mut rng)?;
    let encoded: Vec<String> = okvs
        .vector()
        .as_slice()
        .iter()
        .map(|element| element.to_string())
        .collect();
    println!("Encoded vector: [{}]", encoded.join(", "));

    loop {
        let key = parse_number("Which key would you like to look up?", &mut rl)?;
        let key: FieldElement = field.element(key);
        println!("Key {} decodes to {}.", key, okvs.decode(key));
    }
}
