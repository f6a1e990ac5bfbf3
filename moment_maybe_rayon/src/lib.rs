//! Thin, feature-gated wrapper around `rayon`. With the `parallel` feature
//! disabled, every trait below falls back to a serial implementation with
//! identical method names, so call sites do not need `#[cfg(feature = ...)]`
//! of their own.

#[cfg(feature = "parallel")]
pub use rayon::current_num_threads;
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
pub fn current_num_threads() -> usize {
    1
}

/// Serial fallback for `rayon::iter::IntoParallelIterator`.
#[cfg(not(feature = "parallel"))]
pub trait IntoParallelIterator {
    type Item;
    type Iter: Iterator<Item = Self::Item>;
    fn into_par_iter(self) -> Self::Iter;
}

#[cfg(not(feature = "parallel"))]
impl<T: IntoIterator> IntoParallelIterator for T {
    type Item = T::Item;
    type Iter = T::IntoIter;
    fn into_par_iter(self) -> Self::Iter {
        self.into_iter()
    }
}

/// Serial fallback for `rayon::iter::ParallelIterator`.
#[cfg(not(feature = "parallel"))]
pub trait ParallelIterator: Iterator + Sized {
    fn par_bridge(self) -> Self {
        self
    }
}

#[cfg(not(feature = "parallel"))]
impl<T: Iterator> ParallelIterator for T {}

/// Serial fallback for `rayon::iter::IndexedParallelIterator`/slice helpers;
/// only the subset moment_core actually uses (`par_iter`, `par_iter_mut`)
/// is provided.
#[cfg(not(feature = "parallel"))]
pub trait MaybeParIter<'data> {
    type Item: 'data;
    type Iter: Iterator<Item = &'data Self::Item>;
    fn par_iter(&'data self) -> Self::Iter;
}

#[cfg(not(feature = "parallel"))]
impl<'data, T: 'data> MaybeParIter<'data> for [T] {
    type Item = T;
    type Iter = std::slice::Iter<'data, T>;
    fn par_iter(&'data self) -> Self::Iter {
        self.iter()
    }
}

#[cfg(feature = "parallel")]
pub trait MaybeParIter<'data> {
    type Item: 'data;
    type Iter: rayon::iter::ParallelIterator<Item = &'data Self::Item>;
    fn par_iter(&'data self) -> Self::Iter;
}

#[cfg(feature = "parallel")]
impl<'data, T: 'data + Sync> MaybeParIter<'data> for [T] {
    type Item = T;
    type Iter = rayon::slice::Iter<'data, T>;
    fn par_iter(&'data self) -> Self::Iter {
        rayon::prelude::ParallelSlice::par_iter(self)
    }
}

/// Serial fallback for mutable slice iteration, the write-side companion
/// to `MaybeParIter` used by bulk per-cell work (symbol refresh,
/// explicit-value-rule synthesis) where each element is updated
/// independently of its neighbors.
#[cfg(not(feature = "parallel"))]
pub trait MaybeParIterMut<'data> {
    type Item: 'data;
    type Iter: Iterator<Item = &'data mut Self::Item>;
    fn par_iter_mut(&'data mut self) -> Self::Iter;
}

#[cfg(not(feature = "parallel"))]
impl<'data, T: 'data> MaybeParIterMut<'data> for [T] {
    type Item = T;
    type Iter = std::slice::IterMut<'data, T>;
    fn par_iter_mut(&'data mut self) -> Self::Iter {
        self.iter_mut()
    }
}

#[cfg(feature = "parallel")]
pub trait MaybeParIterMut<'data> {
    type Item: 'data;
    type Iter: rayon::iter::ParallelIterator<Item = &'data mut Self::Item>;
    fn par_iter_mut(&'data mut self) -> Self::Iter;
}

#[cfg(feature = "parallel")]
impl<'data, T: 'data + Send> MaybeParIterMut<'data> for [T] {
    type Item = T;
    type Iter = rayon::slice::IterMut<'data, T>;
    fn par_iter_mut(&'data mut self) -> Self::Iter {
        rayon::prelude::ParallelSliceMut::par_iter_mut(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_or_parallel_par_iter_visits_all_elements() {
        let data = vec![1, 2, 3, 4];
        let sum: i32 = data.par_iter().sum();
        assert_eq!(sum, 10);
    }

    #[test]
    fn current_num_threads_is_at_least_one() {
        assert!(current_num_threads() >= 1);
    }

    #[test]
    fn serial_or_parallel_par_iter_mut_visits_all_elements() {
        let mut data = vec![1, 2, 3, 4];
        data.par_iter_mut().for_each(|x| *x *= 2);
        assert_eq!(data, vec![2, 4, 6, 8]);
    }
}
