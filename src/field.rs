// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Arithmetic over prime fields with moduli of up to 64 bits.

use crate::OkvsError;
use duplicate::duplicate_item;
use rand::{CryptoRng, Rng, RngCore};
use std::fmt;

/// Witnesses for which Miller-Rabin is deterministic on every `u64`.
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// An element of a prime field.
///
/// A `FieldElement` does not carry its modulus; the `PrimeField` that produced it does.
/// Elements returned by `PrimeField` methods are always reduced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldElement(u64);

impl FieldElement {
    /// The additive identity of every field.
    pub const ZERO: FieldElement = FieldElement(0);
    /// The multiplicative identity of every field.
    pub const ONE: FieldElement = FieldElement(1);

    /// Returns the integer representative of `self`.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Returns true iff `self` is zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// The canonical byte encoding of `self` used for hashing: 8 bytes, big-endian.
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

// The integer is taken as-is. Use `PrimeField::element` to obtain a reduced element.
#[duplicate_item(
    int_type;
    [u8];
    [u16];
    [u32];
    [u64];
)]
impl From<int_type> for FieldElement {
    fn from(value: int_type) -> Self {
        FieldElement(value.into())
    }
}

impl From<FieldElement> for u64 {
    fn from(element: FieldElement) -> Self {
        element.0
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The field of integers modulo a prime `modulus`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrimeField {
    modulus: u64,
}

impl PrimeField {
    /// Returns the field of integers modulo `modulus`, which must be prime.
    pub fn new(modulus: u64) -> Result<Self, OkvsError> {
        if !is_prime(modulus) {
            return Err(OkvsError::InvalidConfiguration(format!(
                "field modulus {} is not prime",
                modulus
            )));
        }
        Ok(Self { modulus })
    }

    /// Returns the field modulus.
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Reduces `value` into the field.
    pub fn element(&self, value: u64) -> FieldElement {
        FieldElement(value % self.modulus)
    }

    /// Returns true iff `element` is a reduced representative.
    pub fn contains(&self, element: FieldElement) -> bool {
        element.0 < self.modulus
    }

    /// Returns `a + b`.
    pub fn add(&self, a: FieldElement, b: FieldElement) -> FieldElement {
        let sum = (a.0 as u128 + b.0 as u128) % self.modulus as u128;
        FieldElement(sum as u64)
    }

    /// Returns `a - b`.
    pub fn sub(&self, a: FieldElement, b: FieldElement) -> FieldElement {
        let q = self.modulus as u128;
        let difference = (a.0 as u128 % q + q - b.0 as u128 % q) % q;
        FieldElement(difference as u64)
    }

    /// Returns `-a`.
    pub fn neg(&self, a: FieldElement) -> FieldElement {
        self.sub(FieldElement::ZERO, a)
    }

    /// Returns `a * b`.
    pub fn mul(&self, a: FieldElement, b: FieldElement) -> FieldElement {
        FieldElement(mul_mod(a.0, b.0, self.modulus))
    }

    /// Returns `base` raised to `exponent`.
    pub fn pow(&self, base: FieldElement, exponent: u64) -> FieldElement {
        FieldElement(pow_mod(base.0, exponent, self.modulus))
    }

    /// Returns the multiplicative inverse of `a`, or `NonInvertibleElement` if there is none.
    pub fn try_invert(&self, a: FieldElement) -> Result<FieldElement, OkvsError> {
        // Extended Euclid keeps the check honest even if the modulus were composite.
        let modulus = self.modulus as i128;
        let (mut old_r, mut r) = (a.0 as i128 % modulus, modulus);
        let (mut old_s, mut s) = (1i128, 0i128);
        while r != 0 {
            let quotient = old_r / r;
            (old_r, r) = (r, old_r - quotient * r);
            (old_s, s) = (s, old_s - quotient * s);
        }
        if old_r != 1 {
            return Err(OkvsError::NonInvertibleElement {
                element: a.0,
                modulus: self.modulus,
            });
        }
        Ok(FieldElement(u64::try_from(old_s.rem_euclid(modulus))?))
    }

    /// Sums `elements`.
    pub fn sum<I: IntoIterator<Item = FieldElement>>(&self, elements: I) -> FieldElement {
        elements
            .into_iter()
            .fold(FieldElement::ZERO, |acc, e| self.add(acc, e))
    }

    /// Samples a uniformly random element.
    pub fn random_element<R: RngCore + ?Sized>(&self, rng: &mut R) -> FieldElement {
        FieldElement(rng.gen_range(0..self.modulus))
    }

    /// The number of bits needed to represent every element.
    pub fn bit_width(&self) -> u32 {
        u64::BITS - (self.modulus - 1).leading_zeros()
    }

    /// The number of bytes needed to represent every element.
    pub fn byte_width(&self) -> usize {
        // `bit_width` is at most 64, so this cannot truncate.
        (self.bit_width() as usize + 7) / 8
    }
}

fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    ((a as u128 * b as u128) % modulus as u128) as u64
}

fn pow_mod(base: u64, mut exponent: u64, modulus: u64) -> u64 {
    let mut result = 1 % modulus;
    let mut base = base % modulus;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = mul_mod(result, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exponent >>= 1;
    }
    result
}

/// Returns true iff `n` is prime. Deterministic over the whole `u64` range.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in MILLER_RABIN_BASES {
        if n % p == 0 {
            return n == p;
        }
    }

    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }

    'witness: for a in MILLER_RABIN_BASES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Samples a uniformly random prime of exactly `bits` bits, for `2 <= bits <= 64`.
pub fn random_prime<R: RngCore + CryptoRng>(bits: u32, rng: &mut R) -> Result<u64, OkvsError> {
    if !(2..=u64::BITS).contains(&bits) {
        return Err(OkvsError::InvalidConfiguration(format!(
            "cannot sample a prime of {} bits",
            bits
        )));
    }

    let low = 1u64 << (bits - 1);
    let high = if bits == u64::BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    };

    loop {
        let candidate = rng.gen_range(low..=high);
        if is_prime(candidate) {
            return Ok(candidate);
        }
    }
}
