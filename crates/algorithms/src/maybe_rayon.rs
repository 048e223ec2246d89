//! Parallel iteration facade for the statistics kernels.
//!
//! With the default `parallel` feature this is rayon's prelude. With the
//! feature off, `into_par_iter()` still exists but hands back the plain
//! sequential iterator, so every call site compiles unchanged and the
//! downstream `.map()`/`.collect()` chain resolves through [`Iterator`].

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Single-threaded substitute for rayon's conversion trait. Only the
    /// `into_par_iter` entry point is mimicked; the chained adapters come
    /// from the standard iterator machinery.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
