use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subscription::{LocalSubscription, Subscription, SubscriptionSlot},
};
use std::rc::Rc;

/// Mirrors whichever source notifies first (value, error or completion) and
/// unsubscribes all the others at that moment. Sources not yet subscribed
/// when a winner is known are never subscribed.
#[derive(Clone)]
pub struct RaceOp<S> {
  pub(crate) sources: Vec<S>,
}

/// Race every observable yielded by `sources`.
pub fn race<I>(sources: I) -> RaceOp<I::Item>
where
  I: IntoIterator,
{
  RaceOp { sources: sources.into_iter().collect() }
}

pub struct RaceObserver<O> {
  index: usize,
  observer: MutRc<Option<O>>,
  winner: MutRc<Option<usize>>,
  slots: Rc<[SubscriptionSlot]>,
}

impl<O> RaceObserver<O> {
  /// Returns whether this source is, or just became, the winner.
  fn commit(&self) -> bool {
    let mut winner = self.winner.rc_deref_mut();
    match *winner {
      Some(w) => w == self.index,
      None => {
        *winner = Some(self.index);
        drop(winner);
        for (idx, slot) in self.slots.iter().enumerate() {
          if idx != self.index {
            slot.clone().unsubscribe();
          }
        }
        true
      }
    }
  }
}

impl<Item, Err, O, S> Observable<Item, Err, O> for RaceOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, RaceObserver<O>>,
  S::Unsub: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subscription = LocalSubscription::default();
    if self.sources.is_empty() {
      observer.complete();
      subscription.clone().unsubscribe();
      return subscription;
    }
    let slots: Rc<[SubscriptionSlot]> = (0..self.sources.len()).map(|_| SubscriptionSlot::default()).collect();
    for slot in slots.iter() {
      subscription.add(slot.clone());
    }
    let observer = MutRc::own(Some(observer));
    let winner = MutRc::own(None);
    for (index, source) in self.sources.into_iter().enumerate() {
      if winner.rc_deref().is_some() {
        break;
      }
      let race = RaceObserver { index, observer: observer.clone(), winner: winner.clone(), slots: slots.clone() };
      slots[index].replace(source.actual_subscribe(race));
    }
    subscription
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for RaceOp<S> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O> Observer<Item, Err> for RaceObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.commit() {
      self.observer.next(value)
    }
  }

  fn error(self, err: Err) {
    if self.commit() {
      self.observer.error(err)
    }
  }

  fn complete(self) {
    if self.commit() {
      self.observer.complete()
    }
  }

  fn is_closed(&self) -> bool {
    let lost = self.winner.rc_deref().map_or(false, |w| w != self.index);
    lost || Observer::<Item, Err>::is_closed(&self.observer)
  }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn fastest_source_wins() {
    let scheduler = TestScheduler::new();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    let slow = observable::interval(Duration::from_millis(20), scheduler.clone()).map(|_| "slow");
    let fast = observable::interval(Duration::from_millis(5), scheduler.clone()).map(|_| "fast");
    observable::race(vec![slow.box_it(), fast.box_it()])
      .take(3)
      .subscribe(move |v| o.borrow_mut().push(v));
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*out.borrow(), vec!["fast", "fast", "fast"]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn losers_are_unsubscribed() {
    let a = Subject::<i32, Infallible>::new();
    let b = Subject::<i32, Infallible>::new();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    a.clone().race_with(b.clone()).subscribe(move |v| o.borrow_mut().push(v));
    assert_eq!(a.observer_count() + b.observer_count(), 2);
    b.next(1);
    assert_eq!(a.observer_count(), 0);
    a.next(100);
    b.next(2);
    assert_eq!(*out.borrow(), vec![1, 2]);
  }

  #[test]
  fn synchronous_winner_skips_later_sources() {
    let subscribed = Rc::new(RefCell::new(false));
    let s = subscribed.clone();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    observable::race(vec![
      observable::from_iter(vec![1, 2]).box_it(),
      observable::defer(move || {
        *s.borrow_mut() = true;
        observable::from_iter(vec![3])
      })
      .box_it(),
    ])
    .subscribe(move |v| o.borrow_mut().push(v));
    assert_eq!(*out.borrow(), vec![1, 2]);
    assert!(!*subscribed.borrow());
  }
}
