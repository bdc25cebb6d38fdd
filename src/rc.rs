use std::{
  cell::{Ref, RefCell, RefMut},
  rc::{Rc, Weak},
};

/// Shared mutable state for single-threaded pipelines.
///
/// Every operator that needs state visible from more than one place (an
/// observer and its subscription, two inner observers of a combinator, a
/// scheduled task) keeps it behind a `MutRc`.
pub struct MutRc<T>(Rc<RefCell<T>>);

/// Non-owning counterpart of [`MutRc`].
pub struct WeakRc<T>(Weak<RefCell<T>>);

impl<T> MutRc<T> {
  #[inline]
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }

  #[inline]
  pub fn rc_deref(&self) -> Ref<'_, T> { self.0.borrow() }

  #[inline]
  pub fn rc_deref_mut(&self) -> RefMut<'_, T> { self.0.borrow_mut() }

  #[inline]
  pub fn downgrade(&self) -> WeakRc<T> { WeakRc(Rc::downgrade(&self.0)) }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl<T> WeakRc<T> {
  #[inline]
  pub fn upgrade(&self) -> Option<MutRc<T>> { self.0.upgrade().map(MutRc) }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Clone for WeakRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Default> Default for MutRc<T> {
  fn default() -> Self { Self::own(T::default()) }
}

impl<T> From<T> for MutRc<T> {
  fn from(t: T) -> Self { Self::own(t) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn weak_does_not_keep_alive() {
    let rc = MutRc::own(1);
    let weak = rc.downgrade();
    assert_eq!(weak.upgrade().map(|r| *r.rc_deref()), Some(1));
    drop(rc);
    assert!(weak.upgrade().is_none());
  }

  #[test]
  fn clones_share_state() {
    let a = MutRc::own(vec![1]);
    let b = a.clone();
    b.rc_deref_mut().push(2);
    assert_eq!(*a.rc_deref(), vec![1, 2]);
    assert!(a.ptr_eq(&b));
  }
}
