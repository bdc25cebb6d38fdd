use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subscription::{LocalSubscription, Subscription, SubscriptionSlot},
  type_hint::TypeHint,
};

/// Projects a value into an inner observable only while no inner observable
/// is running. Values arriving in the meantime are dropped without calling
/// the projection.
#[derive(Clone)]
pub struct ExhaustMapOp<S, F, Item> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) _hint: TypeHint<Item>,
}

#[derive(Default)]
struct ExhaustBook {
  inner_active: bool,
  outer_done: bool,
}

#[doc(hidden)]
pub struct ExhaustCtx<O> {
  observer: MutRc<Option<O>>,
  book: MutRc<ExhaustBook>,
  subscription: LocalSubscription,
}

impl<O> Clone for ExhaustCtx<O> {
  fn clone(&self) -> Self {
    ExhaustCtx { observer: self.observer.clone(), book: self.book.clone(), subscription: self.subscription.clone() }
  }
}

impl<O> ExhaustCtx<O> {
  fn fail<Out, Err>(self, err: Err)
  where
    O: Observer<Out, Err>,
  {
    self.observer.error(err);
    self.subscription.unsubscribe();
  }

  fn finish<Out, Err>(self)
  where
    O: Observer<Out, Err>,
  {
    Observer::<Out, Err>::complete(self.observer);
    self.subscription.unsubscribe();
  }
}

#[doc(hidden)]
pub struct ExhaustMapOuter<O, F, Out> {
  ctx: ExhaustCtx<O>,
  func: F,
  _hint: TypeHint<Out>,
}

#[doc(hidden)]
pub struct ExhaustMapInner<O> {
  ctx: ExhaustCtx<O>,
  slot: SubscriptionSlot,
}

impl<Item, Out, Err, O, S, F, Inner> Observable<Out, Err, O> for ExhaustMapOp<S, F, Item>
where
  O: Observer<Out, Err>,
  S: Observable<Item, Err, ExhaustMapOuter<O, F, Out>>,
  S::Unsub: 'static,
  F: FnMut(Item) -> Inner,
  Inner: Observable<Out, Err, ExhaustMapInner<O>>,
  Inner::Unsub: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let ctx = ExhaustCtx {
      observer: MutRc::own(Some(observer)),
      book: MutRc::own(ExhaustBook::default()),
      subscription: LocalSubscription::default(),
    };
    let subscription = ctx.subscription.clone();
    let outer_slot = SubscriptionSlot::default();
    subscription.add(outer_slot.clone());
    outer_slot.replace(self.source.actual_subscribe(ExhaustMapOuter { ctx, func: self.func, _hint: TypeHint::new() }));
    subscription
  }
}

impl<Item, Out, Err, S, F, Inner> ObservableExt<Out, Err> for ExhaustMapOp<S, F, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(Item) -> Inner,
  Inner: ObservableExt<Out, Err>,
{
}

impl<Item, Out, Err, O, F, Inner> Observer<Item, Err> for ExhaustMapOuter<O, F, Out>
where
  O: Observer<Out, Err>,
  F: FnMut(Item) -> Inner,
  Inner: Observable<Out, Err, ExhaustMapInner<O>>,
  Inner::Unsub: 'static,
{
  fn next(&mut self, value: Item) {
    {
      let mut book = self.ctx.book.rc_deref_mut();
      if book.inner_active {
        return;
      }
      book.inner_active = true;
    }
    let inner = (self.func)(value);
    let slot = SubscriptionSlot::default();
    self.ctx.subscription.add(slot.clone());
    let unsub = inner.actual_subscribe(ExhaustMapInner { ctx: self.ctx.clone(), slot: slot.clone() });
    slot.replace(unsub);
  }

  fn error(self, err: Err) { self.ctx.fail::<Out, Err>(err) }

  fn complete(self) {
    let idle = {
      let mut book = self.ctx.book.rc_deref_mut();
      book.outer_done = true;
      !book.inner_active
    };
    if idle {
      self.ctx.finish::<Out, Err>();
    }
  }

  fn is_closed(&self) -> bool { Observer::<Out, Err>::is_closed(&self.ctx.observer) }
}

impl<Out, Err, O> Observer<Out, Err> for ExhaustMapInner<O>
where
  O: Observer<Out, Err>,
{
  #[inline]
  fn next(&mut self, value: Out) { self.ctx.observer.next(value) }

  fn error(self, err: Err) { self.ctx.fail::<Out, Err>(err) }

  fn complete(self) {
    self.slot.unsubscribe();
    let finished = {
      let mut book = self.ctx.book.rc_deref_mut();
      book.inner_active = false;
      book.outer_done
    };
    if finished {
      self.ctx.finish::<Out, Err>();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { Observer::<Out, Err>::is_closed(&self.ctx.observer) }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn drops_values_while_busy() {
    let scheduler = TestScheduler::new();
    let clicks = Subject::<u32, Infallible>::new();
    let projected = Rc::new(RefCell::new(vec![]));
    let out = Rc::new(RefCell::new(vec![]));
    let (p, o) = (projected.clone(), out.clone());
    let s = scheduler.clone();
    clicks
      .clone()
      .exhaust_map(move |v| {
        p.borrow_mut().push(v);
        observable::timer(Duration::from_millis(10), s.clone()).map(move |_| v)
      })
      .subscribe(move |v| o.borrow_mut().push(v));

    clicks.next(1);
    scheduler.advance_by(Duration::from_millis(5));
    clicks.next(2);
    scheduler.advance_by(Duration::from_millis(5));
    clicks.next(3);
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*projected.borrow(), vec![1, 3]);
    assert_eq!(*out.borrow(), vec![1, 3]);
  }

  #[test]
  fn completes_when_outer_and_inner_are_done() {
    let mut out = vec![];
    let mut completed = false;
    observable::from_iter([1, 2])
      .exhaust_map(|v| observable::from_iter(vec![v; 2]))
      .subscribe_all(|v| out.push(v), |_| {}, || completed = true);
    assert_eq!(out, vec![1, 1, 2, 2]);
    assert!(completed);
  }
}
