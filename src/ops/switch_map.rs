//! SwitchMap operator
//!
//! Projects each value into an inner observable and mirrors only the most
//! recent one. A new outer value unsubscribes the previous inner stream
//! before the next one is subscribed, so a stale inner stream can never
//! emit after it was replaced.
//!
//! The output completes once the outer stream completed and the current
//! inner stream (if any) completed too. Errors from either side are
//! forwarded at once and tear everything down.

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subscription::{LocalSubscription, Subscription, SubscriptionSlot},
  type_hint::TypeHint,
};

#[derive(Clone)]
pub struct SwitchMapOp<S, F, Item> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) _hint: TypeHint<Item>,
}

struct SwitchBook {
  generation: usize,
  inner_active: bool,
  outer_done: bool,
  current: SubscriptionSlot,
}

#[doc(hidden)]
pub struct SwitchCtx<O> {
  observer: MutRc<Option<O>>,
  book: MutRc<SwitchBook>,
  subscription: LocalSubscription,
}

impl<O> Clone for SwitchCtx<O> {
  fn clone(&self) -> Self {
    SwitchCtx { observer: self.observer.clone(), book: self.book.clone(), subscription: self.subscription.clone() }
  }
}

impl<O> SwitchCtx<O> {
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

  fn is_current(&self, generation: usize) -> bool { self.book.rc_deref().generation == generation }
}

#[doc(hidden)]
pub struct SwitchMapOuter<O, F, Out> {
  ctx: SwitchCtx<O>,
  func: F,
  _hint: TypeHint<Out>,
}

#[doc(hidden)]
pub struct SwitchMapInner<O> {
  ctx: SwitchCtx<O>,
  generation: usize,
}

impl<Item, Out, Err, O, S, F, Inner> Observable<Out, Err, O> for SwitchMapOp<S, F, Item>
where
  O: Observer<Out, Err>,
  S: Observable<Item, Err, SwitchMapOuter<O, F, Out>>,
  S::Unsub: 'static,
  F: FnMut(Item) -> Inner,
  Inner: Observable<Out, Err, SwitchMapInner<O>>,
  Inner::Unsub: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let ctx = SwitchCtx {
      observer: MutRc::own(Some(observer)),
      book: MutRc::own(SwitchBook {
        generation: 0,
        inner_active: false,
        outer_done: false,
        current: SubscriptionSlot::default(),
      }),
      subscription: LocalSubscription::default(),
    };
    let subscription = ctx.subscription.clone();
    let outer_slot = SubscriptionSlot::default();
    subscription.add(outer_slot.clone());
    let outer = SwitchMapOuter { ctx, func: self.func, _hint: TypeHint::new() };
    outer_slot.replace(self.source.actual_subscribe(outer));
    subscription
  }
}

impl<Item, Out, Err, S, F, Inner> ObservableExt<Out, Err> for SwitchMapOp<S, F, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(Item) -> Inner,
  Inner: ObservableExt<Out, Err>,
{
}

impl<Item, Out, Err, O, F, Inner> Observer<Item, Err> for SwitchMapOuter<O, F, Out>
where
  O: Observer<Out, Err>,
  F: FnMut(Item) -> Inner,
  Inner: Observable<Out, Err, SwitchMapInner<O>>,
  Inner::Unsub: 'static,
{
  fn next(&mut self, value: Item) {
    let inner = (self.func)(value);
    let slot = SubscriptionSlot::default();
    let (generation, previous) = {
      let mut book = self.ctx.book.rc_deref_mut();
      book.generation += 1;
      book.inner_active = true;
      (book.generation, std::mem::replace(&mut book.current, slot.clone()))
    };
    previous.unsubscribe();
    self.ctx.subscription.add(slot.clone());
    let unsub = inner.actual_subscribe(SwitchMapInner { ctx: self.ctx.clone(), generation });
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

impl<Out, Err, O> Observer<Out, Err> for SwitchMapInner<O>
where
  O: Observer<Out, Err>,
{
  fn next(&mut self, value: Out) {
    if self.ctx.is_current(self.generation) {
      self.ctx.observer.next(value)
    }
  }

  fn error(self, err: Err) {
    if self.ctx.is_current(self.generation) {
      self.ctx.fail::<Out, Err>(err)
    }
  }

  fn complete(self) {
    let finished = {
      let mut book = self.ctx.book.rc_deref_mut();
      if book.generation != self.generation {
        return;
      }
      book.inner_active = false;
      book.outer_done
    };
    if finished {
      self.ctx.finish::<Out, Err>();
    }
  }

  fn is_closed(&self) -> bool {
    !self.ctx.is_current(self.generation) || Observer::<Out, Err>::is_closed(&self.ctx.observer)
  }
}
