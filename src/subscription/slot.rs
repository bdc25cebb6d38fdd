use super::{BoxedSubscription, Subscription};
use crate::rc::MutRc;

/// A cell holding at most one subscription at a time.
///
/// Operators hand a clone of the slot to their observer before subscribing
/// upstream, so the observer can cut the upstream off (`take`, `first`,
/// errors from an inner stream) even while the upstream is still inside its
/// own `actual_subscribe` call. A subscription stored into a closed slot is
/// unsubscribed immediately.
#[derive(Clone, Default)]
pub struct SubscriptionSlot(MutRc<SlotState>);

#[derive(Default)]
enum SlotState {
  #[default]
  Empty,
  Holding(BoxedSubscription),
  Closed,
}

impl SubscriptionSlot {
  /// Store `subscription`, unsubscribing whatever was held before.
  pub fn replace(&self, subscription: impl Subscription + 'static) {
    let mut state = self.0.rc_deref_mut();
    if let SlotState::Closed = *state {
      drop(state);
      subscription.unsubscribe();
      return;
    }
    let new = SlotState::Holding(BoxedSubscription::new(subscription));
    let prev = std::mem::replace(&mut *state, new);
    drop(state);
    if let SlotState::Holding(u) = prev {
      u.unsubscribe()
    }
  }

  /// Forget the held subscription without unsubscribing it. Used once the
  /// held stream has terminated on its own.
  pub fn clear(&self) {
    let mut state = self.0.rc_deref_mut();
    if let SlotState::Holding(_) = *state {
      *state = SlotState::Empty;
    }
  }
}

impl Subscription for SubscriptionSlot {
  fn unsubscribe(self) {
    let prev = std::mem::replace(&mut *self.0.rc_deref_mut(), SlotState::Closed);
    if let SlotState::Holding(u) = prev {
      u.unsubscribe()
    }
  }

  fn is_closed(&self) -> bool { matches!(*self.0.rc_deref(), SlotState::Closed) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::ClosureSubscription;
  use std::{cell::Cell, rc::Rc};

  fn counted(hits: &Rc<Cell<usize>>) -> impl Subscription + 'static {
    let c = hits.clone();
    ClosureSubscription(move || c.set(c.get() + 1))
  }

  #[test]
  fn replace_releases_previous() {
    let hits = Rc::new(Cell::new(0));
    let slot = SubscriptionSlot::default();
    slot.replace(counted(&hits));
    slot.replace(counted(&hits));
    assert_eq!(hits.get(), 1);
    slot.clone().unsubscribe();
    assert_eq!(hits.get(), 2);
    assert!(slot.is_closed());
  }

  #[test]
  fn closed_slot_rejects_new_subscriptions() {
    let hits = Rc::new(Cell::new(0));
    let slot = SubscriptionSlot::default();
    slot.clone().unsubscribe();
    slot.replace(counted(&hits));
    assert_eq!(hits.get(), 1);
  }

  #[test]
  fn clear_forgets_without_release() {
    let hits = Rc::new(Cell::new(0));
    let slot = SubscriptionSlot::default();
    slot.replace(counted(&hits));
    slot.clear();
    slot.unsubscribe();
    assert_eq!(hits.get(), 0);
  }
}
