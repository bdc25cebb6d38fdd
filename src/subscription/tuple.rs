use super::Subscription;

/// Two subscriptions released together, in order.
pub struct TupleSubscription<U1, U2> {
  unsub1: U1,
  unsub2: U2,
}

impl<U1, U2> TupleSubscription<U1, U2> {
  pub fn new(unsub1: U1, unsub2: U2) -> Self { TupleSubscription { unsub1, unsub2 } }
}

impl<U1, U2> Subscription for TupleSubscription<U1, U2>
where
  U1: Subscription,
  U2: Subscription,
{
  fn unsubscribe(self) {
    self.unsub1.unsubscribe();
    self.unsub2.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.unsub1.is_closed() && self.unsub2.is_closed() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::ClosureSubscription;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn releases_both_in_order() {
    let order = Rc::new(RefCell::new(vec![]));
    let (o1, o2) = (order.clone(), order.clone());
    let tuple = TupleSubscription::new(
      ClosureSubscription(move || o1.borrow_mut().push(1)),
      ClosureSubscription(move || o2.borrow_mut().push(2)),
    );
    tuple.unsubscribe();
    assert_eq!(*order.borrow(), vec![1, 2]);
  }

  #[test]
  fn closed_only_when_both_closed() {
    assert!(TupleSubscription::new((), ()).is_closed());
    let open = TupleSubscription::new((), ClosureSubscription(|| {}));
    assert!(!open.is_closed());
  }
}
