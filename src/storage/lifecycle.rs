//! Storage lifecycle: copying between value kinds and index widths
//!
//! Every copy allocates a fresh pair of arrays; two live matrices never
//! share storage. Plain deep copies use the derived `Clone`; the functions
//! here change the element type or the index width while preserving the
//! structure byte for byte.

use crate::error::{Result, StorageError};
use crate::kind::{CastFrom, IndexValue, Scalar};
use crate::storage::yale::YaleStorage;

impl<T, I> YaleStorage<T, I>
where
    T: Scalar,
    I: IndexValue,
{
    /// Copies this matrix with every stored value converted to `U`
    ///
    /// The structure (row pointers and column indices) is copied unchanged;
    /// only the used prefix of the value array is converted. Conversion
    /// follows `as`-cast semantics.
    pub fn cast_copy<U>(&self) -> YaleStorage<U, I>
    where
        U: Scalar + CastFrom<T>,
    {
        let size = self.size();
        let mut a = vec![U::zero(); self.capacity()];
        for (dst, &src) in a.iter_mut().zip(self.a.iter()).take(size) {
            *dst = U::cast_from(src);
        }

        YaleStorage {
            shape: self.shape,
            ndnz: self.ndnz,
            a,
            ija: self.ija.clone(),
        }
    }

    /// Copies this matrix with its indices stored at a different width
    ///
    /// Fails with a capacity error when the target width cannot address the
    /// layout's theoretical maximum size.
    pub fn with_index_kind<J>(&self) -> Result<YaleStorage<T, J>>
    where
        J: IndexValue,
    {
        let max = self.max_size();
        if J::try_from_usize(max).is_none() {
            return Err(StorageError::CapacityExhausted {
                needed: max,
                max: J::MAX_USIZE,
            });
        }

        let ija = self
            .ija
            .iter()
            .map(|&x| J::from_usize(x.to_usize()))
            .collect();

        Ok(YaleStorage {
            shape: self.shape,
            ndnz: self.ndnz,
            a: self.a.clone(),
            ija,
        })
    }
}
