use crate::rc::MutRc;
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};

mod boxed;
mod slot;
mod tuple;
pub use boxed::*;
pub use slot::*;
pub use tuple::*;

/// Subscription returned from `Observable::actual_subscribe` to allow
/// unsubscribing.
///
/// `unsubscribe` consumes the handle; clonable handles share their state, so
/// unsubscribing any clone closes all of them and releases resources once.
pub trait Subscription {
  /// Stop receiving notifications and release every resource this
  /// subscription owns.
  fn unsubscribe(self);

  fn is_closed(&self) -> bool;

  /// Activates "RAII" behavior for this subscription: `unsubscribe()` is
  /// called as soon as the returned guard goes out of scope.
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard(Some(self))
  }
}

impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<U: Subscription> Subscription for Option<U> {
  fn unsubscribe(self) {
    if let Some(u) = self {
      u.unsubscribe()
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().map_or(true, |u| u.is_closed()) }
}

/// A shared optional subscription. Unsubscribing takes the inner value out
/// before releasing it, so re-entrant calls see an empty cell.
impl<U: Subscription> Subscription for MutRc<Option<U>> {
  fn unsubscribe(self) {
    let inner = self.rc_deref_mut().take();
    if let Some(u) = inner {
      u.unsubscribe()
    }
  }

  fn is_closed(&self) -> bool { self.rc_deref().as_ref().map_or(true, |u| u.is_closed()) }
}

/// Runs a closure once when unsubscribed.
pub struct ClosureSubscription<F: FnOnce()>(pub F);

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  #[inline]
  fn unsubscribe(self) { (self.0)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// A composite subscription: a list of teardowns released together.
///
/// Adding to an already closed `LocalSubscription` unsubscribes the added
/// value immediately.
#[derive(Clone, Default)]
pub struct LocalSubscription(MutRc<Inner>);

#[derive(Default)]
struct Inner {
  closed: bool,
  teardown: SmallVec<[BoxedSubscription; 2]>,
}

impl LocalSubscription {
  pub fn add<U: Subscription + 'static>(&self, subscription: U) {
    let mut inner = self.0.rc_deref_mut();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.teardown.retain(|u| !u.is_closed());
      inner.teardown.push(BoxedSubscription::new(subscription));
    }
  }

  pub fn teardown_size(&self) -> usize { self.0.rc_deref().teardown.len() }
}

impl Subscription for LocalSubscription {
  fn unsubscribe(self) {
    let teardown = {
      let mut inner = self.0.rc_deref_mut();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    for u in teardown {
      u.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl Debug for LocalSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LocalSubscription")
      .field("closed", &self.is_closed())
      .field("teardown_count", &self.teardown_size())
      .finish()
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Give the subscription back without unsubscribing it.
  pub fn into_inner(mut self) -> Option<T> { self.0.take() }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  fn drop(&mut self) {
    if let Some(u) = self.0.take() {
      u.unsubscribe()
    }
  }
}
