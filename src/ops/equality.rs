//! Whole-matrix equality
//!
//! Equality compares the diagonals first (the cheap exit), then merges each
//! pair of off-diagonal rows with the same two-pointer sweep the combine
//! engine uses. A column present on only one side must hold zero there;
//! explicitly stored zeros are therefore equal to absent cells.

use crate::kind::{IndexValue, Scalar};
use crate::storage::yale::YaleStorage;

/// Is the off-diagonal part of a row empty for comparison purposes?
///
/// A row with stored slots still counts as empty when every stored value is
/// zero.
fn ndrow_is_empty<T, I>(s: &YaleStorage<T, I>, lo: usize, hi: usize) -> bool
where
    T: Scalar,
    I: IndexValue,
{
    s.a[lo..hi].iter().all(|&v| v == T::zero())
}

/// Compares two non-empty off-diagonal rows
fn ndrow_eq_ndrow<T, I>(
    left: &YaleStorage<T, I>,
    right: &YaleStorage<T, I>,
    l_range: (usize, usize),
    r_range: (usize, usize),
) -> bool
where
    T: Scalar,
    I: IndexValue,
{
    let (mut lp, l_end) = l_range;
    let (mut rp, r_end) = r_range;

    while lp < l_end && rp < r_end {
        let lj = left.ija[lp].to_usize();
        let rj = right.ija[rp].to_usize();

        if lj == rj {
            if left.a[lp] != right.a[rp] {
                return false;
            }
            lp += 1;
            rp += 1;
        } else if lj < rj {
            // column stored only on the left; must be zero there
            if left.a[lp] != T::zero() {
                return false;
            }
            lp += 1;
        } else {
            if right.a[rp] != T::zero() {
                return false;
            }
            rp += 1;
        }
    }

    while lp < l_end {
        if left.a[lp] != T::zero() {
            return false;
        }
        lp += 1;
    }
    while rp < r_end {
        if right.a[rp] != T::zero() {
            return false;
        }
        rp += 1;
    }

    true
}

/// Whether two same-shape matrices hold identical cell values
///
/// Short-circuits on the first mismatch.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn storages_equal<T, I>(left: &YaleStorage<T, I>, right: &YaleStorage<T, I>) -> bool
where
    T: Scalar,
    I: IndexValue,
{
    assert_eq!(
        left.shape(),
        right.shape(),
        "matrix shapes must match for equality comparison"
    );

    // Diagonals first.
    for i in 0..left.rows() {
        if left.a[i] != right.a[i] {
            return false;
        }
    }

    for i in 0..left.rows() {
        let l_range = left.row_range(i);
        let r_range = right.row_range(i);

        let l_empty = ndrow_is_empty(left, l_range.0, l_range.1);
        let r_empty = ndrow_is_empty(right, r_range.0, r_range.1);

        match (l_empty, r_empty) {
            (true, true) => continue,
            (true, false) | (false, true) => return false,
            (false, false) => {
                if !ndrow_eq_ndrow(left, right, l_range, r_range) {
                    return false;
                }
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_cells(shape: (usize, usize), cells: &[(usize, usize, i64)]) -> YaleStorage<i64> {
        let mut m = YaleStorage::new(shape).unwrap();
        for &(i, j, v) in cells {
            m.set(i, j, v).unwrap();
        }
        m
    }

    #[test]
    fn test_equal_reflexive() {
        let m = from_cells((3, 3), &[(0, 0, 1), (0, 2, 2), (2, 1, 3)]);
        assert!(storages_equal(&m, &m));
    }

    #[test]
    fn test_any_single_cell_difference_detected() {
        let cells = [(0, 0, 1), (0, 2, 2), (2, 1, 3), (1, 1, 4)];
        let m = from_cells((3, 3), &cells);

        for i in 0..3 {
            for j in 0..3 {
                let mut other = from_cells((3, 3), &cells);
                other.set(i, j, m.get(i, j) + 1).unwrap();
                assert!(
                    !storages_equal(&m, &other),
                    "difference at ({}, {}) not detected",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn test_stored_zero_equals_absent() {
        let mut a = from_cells((2, 3), &[(0, 1, 5)]);
        a.set(0, 1, 0).unwrap(); // slot stays, value is zero
        assert_eq!(a.ndnz(), 1);

        let b = YaleStorage::<i64>::new((2, 3)).unwrap();
        assert!(storages_equal(&a, &b));
        assert!(storages_equal(&b, &a));
    }

    #[test]
    fn test_differing_structure_same_values() {
        let a = from_cells((2, 3), &[(0, 1, 5), (1, 2, 6)]);
        let b = from_cells((2, 3), &[(0, 1, 5)]);
        assert!(!storages_equal(&a, &b));
    }

    #[test]
    fn test_mixed_stored_zero_and_value() {
        let mut a = from_cells((2, 4), &[(0, 1, 0), (0, 3, 7)]);
        a.set(0, 1, 0).unwrap();
        let b = from_cells((2, 4), &[(0, 3, 7)]);
        assert!(storages_equal(&a, &b));
    }
}
