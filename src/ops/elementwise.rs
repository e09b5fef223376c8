//! Element-wise combination of two matrices
//!
//! Both operands keep their rows in ascending column order, so each output
//! row is produced by a linear two-pointer merge over the two sorted
//! sub-ranges, with no searching. The diagonal regions combine directly,
//! slot by slot.

use crate::error::Result;
use crate::kind::{IndexValue, Scalar};
use crate::storage::yale::YaleStorage;

/// The supported element-wise operators
///
/// Comparison operators exist at the dynamic surface but are deliberately
/// unimplemented for this storage format; they never reach this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EwOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl EwOp {
    /// Applies the operator to one pair of elements
    pub fn apply<T: Scalar>(self, l: T, r: T) -> T {
        match self {
            EwOp::Add => l + r,
            EwOp::Sub => l - r,
            EwOp::Mul => l * r,
            EwOp::Div => l / r,
        }
    }

    /// Whether an operand paired with an implicit zero is definitionally
    /// zero, letting the merge skip one-sided columns entirely
    fn annihilates_with_zero(self) -> bool {
        matches!(self, EwOp::Mul)
    }
}

/// Combines two same-shape matrices element by element into a fresh one
///
/// Zero results are elided from the output, and for multiplication the
/// columns present on only one side are skipped without evaluating the
/// operator at all. The result is shrunk to exactly its used size.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn combine<T, I>(
    op: EwOp,
    left: &YaleStorage<T, I>,
    right: &YaleStorage<T, I>,
) -> Result<YaleStorage<T, I>>
where
    T: Scalar,
    I: IndexValue,
{
    assert_eq!(
        left.shape(),
        right.shape(),
        "matrix shapes must match for element-wise combination"
    );

    let rows = left.rows();
    let init_capacity = left.ndnz() + right.ndnz() + rows + 1;
    let mut dest = YaleStorage::with_capacity(left.shape(), init_capacity)?;

    // Diagonals combine directly, slot by slot; the sentinel stays zero.
    for i in 0..rows {
        dest.a[i] = op.apply(left.a[i], right.a[i]);
    }

    // Merge the off-diagonal rows.
    let mut cursor = rows + 1;
    for i in 0..rows {
        dest.ija[i] = I::from_usize(cursor);

        let (mut lp, l_end) = left.row_range(i);
        let (mut rp, r_end) = right.row_range(i);

        while lp < l_end && rp < r_end {
            let lj = left.ija[lp].to_usize();
            let rj = right.ija[rp].to_usize();

            if lj == rj {
                let v = op.apply(left.a[lp], right.a[rp]);
                if v != T::zero() {
                    dest.ija[cursor] = I::from_usize(lj);
                    dest.a[cursor] = v;
                    cursor += 1;
                }
                lp += 1;
                rp += 1;
            } else if lj < rj {
                if !op.annihilates_with_zero() {
                    let v = op.apply(left.a[lp], T::zero());
                    if v != T::zero() {
                        dest.ija[cursor] = I::from_usize(lj);
                        dest.a[cursor] = v;
                        cursor += 1;
                    }
                }
                lp += 1;
            } else {
                if !op.annihilates_with_zero() {
                    let v = op.apply(T::zero(), right.a[rp]);
                    if v != T::zero() {
                        dest.ija[cursor] = I::from_usize(rj);
                        dest.a[cursor] = v;
                        cursor += 1;
                    }
                }
                rp += 1;
            }
        }

        // At most one of these tails is non-empty. Multiplication skips
        // them: everything left pairs with an implicit zero.
        if !op.annihilates_with_zero() {
            while lp < l_end {
                let v = op.apply(left.a[lp], T::zero());
                if v != T::zero() {
                    dest.ija[cursor] = I::from_usize(left.ija[lp].to_usize());
                    dest.a[cursor] = v;
                    cursor += 1;
                }
                lp += 1;
            }
            while rp < r_end {
                let v = op.apply(T::zero(), right.a[rp]);
                if v != T::zero() {
                    dest.ija[cursor] = I::from_usize(right.ija[rp].to_usize());
                    dest.a[cursor] = v;
                    cursor += 1;
                }
                rp += 1;
            }
        }
    }
    dest.ija[rows] = I::from_usize(cursor);
    dest.ndnz = cursor - rows - 1;

    // Shrink the result to exactly its used size.
    dest.resize_capacity(cursor);

    Ok(dest)
}
