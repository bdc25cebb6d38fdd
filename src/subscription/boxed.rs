use super::Subscription;

/// Object-safe form of [`Subscription`], since `unsubscribe(self)` needs
/// `Sized`.
pub trait DynSubscription {
  fn boxed_unsubscribe(self: Box<Self>);
  fn boxed_is_closed(&self) -> bool;
}

impl<T: Subscription> DynSubscription for T {
  #[inline]
  fn boxed_unsubscribe(self: Box<Self>) { (*self).unsubscribe() }

  #[inline]
  fn boxed_is_closed(&self) -> bool { self.is_closed() }
}

/// A type-erased subscription.
///
/// Subscriptions are control handles kept by operators, subjects and
/// scheduled tasks long after the call that produced them, so the boxed form
/// is `'static`.
pub struct BoxedSubscription(Box<dyn DynSubscription>);

impl BoxedSubscription {
  pub fn new(subscription: impl Subscription + 'static) -> Self {
    BoxedSubscription(Box::new(subscription))
  }
}

impl Subscription for BoxedSubscription {
  #[inline]
  fn unsubscribe(self) { self.0.boxed_unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { self.0.boxed_is_closed() }
}

impl Default for BoxedSubscription {
  fn default() -> Self { BoxedSubscription::new(()) }
}
