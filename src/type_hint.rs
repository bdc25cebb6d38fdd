use std::marker::PhantomData;

/// Zero-sized marker that pins a type parameter an operator does not store.
///
/// Unlike a bare `PhantomData<T>` it is `Clone`/`Default` for every `T` and
/// carries no drop-check or auto-trait obligations for `T`.
pub struct TypeHint<T>(PhantomData<fn() -> T>);

impl<T> TypeHint<T> {
  #[inline]
  pub fn new() -> Self { TypeHint(PhantomData) }
}

impl<T> Default for TypeHint<T> {
  #[inline]
  fn default() -> Self { Self::new() }
}

impl<T> Clone for TypeHint<T> {
  #[inline]
  fn clone(&self) -> Self { Self::new() }
}

impl<T> Copy for TypeHint<T> {}
