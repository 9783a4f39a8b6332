// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Solves for the encoded vector with Gaussian elimination confined to bands.

use crate::{
    field::{FieldElement, PrimeField},
    hashing::RowHasher,
    params::OkvsParams,
    system::{build_systems, Equation},
    Column, KeyValuePair, OkvsError,
};

/// The encoded vector `P`: the public output of an OKVS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedVector(pub(crate) Vec<FieldElement>);

impl EncodedVector {
    /// Wraps `elements`, checking that each is reduced modulo the modulus of `field`.
    pub fn from_elements(
        elements: Vec<FieldElement>,
        field: &PrimeField,
    ) -> Result<Self, OkvsError> {
        if let Some(column) = elements.iter().position(|e| !field.contains(*e)) {
            return Err(OkvsError::MalformedEncoding(format!(
                "element {} is not reduced modulo {}",
                column,
                field.modulus()
            )));
        }
        Ok(Self(elements))
    }

    /// The number of elements `M`.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true iff the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The element at `column`, if in range.
    pub fn get(&self, column: Column) -> Option<FieldElement> {
        self.0.get(column).copied()
    }

    /// The elements, in column order.
    pub fn as_slice(&self) -> &[FieldElement] {
        &self.0
    }

    /// Consumes `self`, returning its elements.
    pub fn into_elements(self) -> Vec<FieldElement> {
        self.0
    }
}

/// Encodes `pairs` into a vector `P` such that the band sum of every key is its value.
///
/// Fails with `ConfigMismatch` if `pairs.len()` is not `N`, and with `EncodingFailure` if
/// the system is not solvable by banded elimination. No partial result is returned.
pub fn encode_vector<H: RowHasher + ?Sized>(
    params: &OkvsParams,
    hasher: &H,
    pairs: &[KeyValuePair],
) -> Result<EncodedVector, OkvsError> {
    if pairs.len() != params.num_pairs() {
        return Err(OkvsError::ConfigMismatch {
            expected: params.num_pairs(),
            actual: pairs.len(),
        });
    }

    let field = params.field();
    let mut systems = build_systems(pairs, params, hasher);
    systems.sort_by_key(|equation| equation.position);

    let pivots = eliminate(&mut systems, field)?;
    back_substitute(&systems, &pivots, params)
}

/// Forward elimination. Returns the pivot column of every equation.
///
/// `systems` must be sorted by position.
fn eliminate(systems: &mut [Equation], field: PrimeField) -> Result<Vec<Column>, OkvsError> {
    let mut pivots = Vec::with_capacity(systems.len());
    let mut row_operations: u64 = 0;

    for i in 0..systems.len() {
        let (processed, remaining) = systems.split_at_mut(i + 1);
        let pivot_row = &processed[i];

        let pivot = match pivot_row.first_nonzero_column() {
            Some(column) => column,
            None => {
                log::warn!(
                    "Encoding failed -- no pivot for equation {} (pair {}) at position {}",
                    i,
                    pivot_row.origin,
                    pivot_row.position
                );
                return Err(OkvsError::EncodingFailure {
                    row: i,
                    origin: pivot_row.origin,
                });
            }
        };
        let pivot_inverse = field.try_invert(pivot_row.coefficient(pivot))?;
        let pivot_offset = pivot - pivot_row.position;

        for row in remaining.iter_mut() {
            // Bands are sorted, so no later row reaches the pivot column either.
            if row.position > pivot {
                break;
            }
            let leading = row.coefficient(pivot);
            if leading.is_zero() {
                continue;
            }

            let factor = field.mul(pivot_inverse, leading);
            // The pivot row is zero left of `pivot`, and its band ends no later than `row`'s,
            // so every column touched here lies inside `row`'s segment.
            for (offset, coefficient) in pivot_row
                .coefficients
                .iter()
                .enumerate()
                .skip(pivot_offset)
            {
                if coefficient.is_zero() {
                    continue;
                }
                let target = pivot_row.position + offset - row.position;
                row.coefficients[target] =
                    field.sub(row.coefficients[target], field.mul(factor, *coefficient));
            }
            row.value = field.sub(row.value, field.mul(factor, pivot_row.value));
            row_operations += 1;
        }

        pivots.push(pivot);
    }

    log::debug!(
        "Forward elimination -- {} equations, {} row operations",
        systems.len(),
        row_operations
    );
    Ok(pivots)
}

/// Back substitution over equations in reverse order. Columns that are nobody's pivot stay zero.
fn back_substitute(
    systems: &[Equation],
    pivots: &[Column],
    params: &OkvsParams,
) -> Result<EncodedVector, OkvsError> {
    let field = params.field();
    let mut solution = vec![FieldElement::ZERO; params.encoded_len()];

    for (equation, &pivot) in systems.iter().zip(pivots).rev() {
        let residual = field.sum(
            equation
                .nonzero_terms()
                .filter(|(column, _)| *column != pivot)
                .map(|(column, coefficient)| field.mul(coefficient, solution[column])),
        );
        let pivot_inverse = field.try_invert(equation.coefficient(pivot))?;
        solution[pivot] = field.mul(field.sub(equation.value, residual), pivot_inverse);
    }

    Ok(EncodedVector(solution))
}
