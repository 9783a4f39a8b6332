// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! Materializes the linear system whose solution is the encoded vector.

use crate::{
    field::FieldElement, hashing::RowHasher, params::OkvsParams, Column, KeyValuePair,
};

/// One linear equation `sum_j coefficients[j] * P[position + j] = value`.
///
/// Only the `W` columns starting at `position` are stored; every other coefficient is zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equation {
    /// Index of the pair this equation was built from.
    pub origin: usize,
    /// The first column of the band.
    pub position: Column,
    /// The dense band segment, of length `W`.
    pub coefficients: Vec<FieldElement>,
    /// The right-hand side.
    pub value: FieldElement,
}

impl Equation {
    /// The coefficient at absolute `column`.
    pub fn coefficient(&self, column: Column) -> FieldElement {
        column
            .checked_sub(self.position)
            .and_then(|offset| self.coefficients.get(offset))
            .copied()
            .unwrap_or(FieldElement::ZERO)
    }

    /// The first column with a nonzero coefficient, if any.
    pub fn first_nonzero_column(&self) -> Option<Column> {
        self.coefficients
            .iter()
            .position(|c| !c.is_zero())
            .map(|offset| self.position + offset)
    }

    /// Iterates over `(column, coefficient)` for every nonzero coefficient.
    pub fn nonzero_terms(&self) -> impl Iterator<Item = (Column, FieldElement)> + '_ {
        self.coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_zero())
            .map(|(offset, c)| (self.position + offset, *c))
    }
}

/// Builds one equation per pair, in input order. Keys and values are reduced modulo `Q` first,
/// so keys that are congruent modulo `Q` yield identical rows.
pub fn build_systems<H: RowHasher + ?Sized>(
    pairs: &[KeyValuePair],
    params: &OkvsParams,
    hasher: &H,
) -> Vec<Equation> {
    let field = params.field();
    let width = params.band_width();
    pairs
        .iter()
        .enumerate()
        .map(|(origin, pair)| {
            let band = hasher.row(field.element(pair.key.value()), params);
            debug_assert_eq!(band.width(), width);
            debug_assert!(band.position() + width <= params.encoded_len());

            let coefficients = (0..width)
                .map(|offset| {
                    if band.is_set_at_offset(offset) {
                        FieldElement::ONE
                    } else {
                        FieldElement::ZERO
                    }
                })
                .collect();

            Equation {
                origin,
                position: band.position(),
                coefficients,
                value: field.element(pair.value.value()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{build_systems, Equation};
    use crate::{
        params::OkvsParams,
        test_utils::{random_pairs, StubRowHasher},
        Blake3RowHasher, FieldElement, RowHasher,
    };
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_equation_accessors() {
        let equation = Equation {
            origin: 0,
            position: 3,
            coefficients: [0u8, 2, 0, 5].map(FieldElement::from).to_vec(),
            value: FieldElement::ZERO,
        };
        assert_eq!(equation.coefficient(2), FieldElement::ZERO);
        assert_eq!(equation.coefficient(4), FieldElement::from(2u8));
        assert_eq!(equation.coefficient(6), FieldElement::from(5u8));
        assert_eq!(equation.coefficient(7), FieldElement::ZERO);
        assert_eq!(equation.first_nonzero_column(), Some(4));
        assert_eq!(
            equation.nonzero_terms().collect::<Vec<_>>(),
            vec![(4, FieldElement::from(2u8)), (6, FieldElement::from(5u8))]
        );
    }

    #[test]
    fn test_build_systems_matches_bands() {
        let params = OkvsParams::new(50, 60, 16, 257).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let pairs = random_pairs(&params, &mut rng);
        let hasher = Blake3RowHasher::default();

        let systems = build_systems(&pairs, &params, &hasher);
        assert_eq!(systems.len(), pairs.len());
        for (equation, pair) in systems.iter().zip(&pairs) {
            let band = hasher.row(pair.key, &params);
            assert_eq!(equation.position, band.position());
            assert_eq!(equation.value, pair.value);
            assert_eq!(equation.coefficients.len(), 16);
            for column in 0..params.encoded_len() {
                let expected = if band.is_set(column) {
                    FieldElement::ONE
                } else {
                    FieldElement::ZERO
                };
                assert_eq!(equation.coefficient(column), expected);
            }
        }
    }

    #[test]
    fn test_duplicate_keys_give_identical_rows() {
        let params = OkvsParams::new(2, 8, 3, 257).unwrap();
        let hasher = StubRowHasher::from_rows(&[(1, 2, [true, true, false])]);
        let key = FieldElement::from(1u8);
        let pairs = [
            crate::KeyValuePair::new(key, FieldElement::from(10u8)),
            crate::KeyValuePair::new(key, FieldElement::from(20u8)),
        ];

        let systems = build_systems(&pairs, &params, &hasher);
        assert_eq!(systems[0].coefficients, systems[1].coefficients);
        assert_eq!(systems[0].position, 2);
        assert_eq!((systems[0].origin, systems[1].origin), (0, 1));
    }
    #[test]
    fn test_unreduced_pairs_are_reduced() {
        let params = OkvsParams::new(2, 40, 16, 257).unwrap();
        let hasher = Blake3RowHasher::default();
        let pairs = [
            crate::KeyValuePair::new(FieldElement::from(300u16), FieldElement::from(1000u16)),
            crate::KeyValuePair::new(FieldElement::from(43u8), FieldElement::from(229u8)),
        ];

        let systems = build_systems(&pairs, &params, &hasher);
        assert_eq!(systems[0].position, systems[1].position);
        assert_eq!(systems[0].coefficients, systems[1].coefficients);
        assert_eq!(systems[0].value, FieldElement::from(229u8));
    }
}
