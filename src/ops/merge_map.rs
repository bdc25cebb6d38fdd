use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subscription::{ClosureSubscription, LocalSubscription, Subscription, SubscriptionSlot},
  type_hint::TypeHint,
};
use std::collections::VecDeque;

/// Projects every value to an inner observable and merges their outputs.
///
/// At most `concurrency` inner observables are subscribed at once; further
/// values wait in arrival order and are projected when a slot frees up.
/// `concat_map` is the `concurrency == 1` case.
#[derive(Clone)]
pub struct MergeMapOp<S, F, Item> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) concurrency: usize,
  pub(crate) _hint: TypeHint<Item>,
}

struct MergeMapBook {
  active: usize,
  pending: VecDeque<Box<dyn FnOnce()>>,
  outer_done: bool,
}

impl MergeMapBook {
  fn idle(&self) -> bool { self.outer_done && self.active == 0 && self.pending.is_empty() }
}

pub struct MergeMapCtx<O> {
  observer: MutRc<Option<O>>,
  book: MutRc<MergeMapBook>,
  subscription: LocalSubscription,
}

impl<O> Clone for MergeMapCtx<O> {
  fn clone(&self) -> Self {
    MergeMapCtx { observer: self.observer.clone(), book: self.book.clone(), subscription: self.subscription.clone() }
  }
}

impl<O> MergeMapCtx<O> {
  fn fail<Out, Err>(self, err: Err)
  where
    O: Observer<Out, Err>,
  {
    self.observer.error(err);
    self.subscription.unsubscribe();
  }

  fn complete_if_idle<Out, Err>(self)
  where
    O: Observer<Out, Err>,
  {
    let idle = self.book.rc_deref().idle();
    if idle {
      Observer::<Out, Err>::complete(self.observer);
      self.subscription.unsubscribe();
    }
  }

  fn subscribe_inner<Out, Err, Inner>(&self, inner: Inner)
  where
    Inner: Observable<Out, Err, MergeMapInner<O>>,
    Inner::Unsub: 'static,
  {
    let slot = SubscriptionSlot::default();
    self.subscription.add(slot.clone());
    let unsub = inner.actual_subscribe(MergeMapInner { ctx: self.clone(), slot: slot.clone() });
    slot.replace(unsub);
  }
}

pub struct MergeMapOuter<O, F, Out> {
  ctx: MergeMapCtx<O>,
  func: MutRc<F>,
  concurrency: usize,
  _hint: TypeHint<Out>,
}

pub struct MergeMapInner<O> {
  ctx: MergeMapCtx<O>,
  slot: SubscriptionSlot,
}

impl<Item, Out, Err, O, S, F, Inner> Observable<Out, Err, O> for MergeMapOp<S, F, Item>
where
  O: Observer<Out, Err> + 'static,
  S: Observable<Item, Err, MergeMapOuter<O, F, Out>>,
  S::Unsub: 'static,
  F: FnMut(Item) -> Inner + 'static,
  Inner: Observable<Out, Err, MergeMapInner<O>> + 'static,
  Inner::Unsub: 'static,
  Item: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let ctx = MergeMapCtx {
      observer: MutRc::own(Some(observer)),
      book: MutRc::own(MergeMapBook { active: 0, pending: VecDeque::new(), outer_done: false }),
      subscription: LocalSubscription::default(),
    };
    let subscription = ctx.subscription.clone();
    // Queued projections hold the context, so they are dropped on teardown.
    let book = ctx.book.downgrade();
    subscription.add(ClosureSubscription(move || {
      if let Some(book) = book.upgrade() {
        let pending = std::mem::take(&mut book.rc_deref_mut().pending);
        drop(pending);
      }
    }));
    let outer_slot = SubscriptionSlot::default();
    subscription.add(outer_slot.clone());
    let outer = MergeMapOuter {
      ctx,
      func: MutRc::own(self.func),
      concurrency: self.concurrency,
      _hint: TypeHint::new(),
    };
    outer_slot.replace(self.source.actual_subscribe(outer));
    subscription
  }
}

impl<Item, Out, Err, S, F, Inner> ObservableExt<Out, Err> for MergeMapOp<S, F, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(Item) -> Inner,
  Inner: ObservableExt<Out, Err>,
{
}

impl<Item, Out, Err, O, F, Inner> Observer<Item, Err> for MergeMapOuter<O, F, Out>
where
  O: Observer<Out, Err> + 'static,
  F: FnMut(Item) -> Inner + 'static,
  Inner: Observable<Out, Err, MergeMapInner<O>> + 'static,
  Inner::Unsub: 'static,
  Item: 'static,
{
  fn next(&mut self, value: Item) {
    let run_now = {
      let mut book = self.ctx.book.rc_deref_mut();
      if book.active < self.concurrency {
        book.active += 1;
        true
      } else {
        false
      }
    };
    if run_now {
      let inner = (self.func.rc_deref_mut())(value);
      self.ctx.subscribe_inner(inner);
    } else {
      let func = self.func.clone();
      let ctx = self.ctx.clone();
      let task = move || {
        let inner = (func.rc_deref_mut())(value);
        ctx.subscribe_inner(inner);
      };
      self.ctx.book.rc_deref_mut().pending.push_back(Box::new(task));
    }
  }

  fn error(self, err: Err) { self.ctx.fail::<Out, Err>(err) }

  fn complete(self) {
    self.ctx.book.rc_deref_mut().outer_done = true;
    self.ctx.complete_if_idle::<Out, Err>();
  }

  fn is_closed(&self) -> bool { Observer::<Out, Err>::is_closed(&self.ctx.observer) }
}

impl<Out, Err, O> Observer<Out, Err> for MergeMapInner<O>
where
  O: Observer<Out, Err>,
{
  fn next(&mut self, value: Out) { self.ctx.observer.next(value) }

  fn error(self, err: Err) { self.ctx.fail::<Out, Err>(err) }

  fn complete(self) {
    self.slot.unsubscribe();
    let next_task = {
      let mut book = self.ctx.book.rc_deref_mut();
      let task = book.pending.pop_front();
      if task.is_none() {
        book.active -= 1;
      }
      task
    };
    match next_task {
      Some(task) => task(),
      None => self.ctx.complete_if_idle::<Out, Err>(),
    }
  }

  fn is_closed(&self) -> bool { Observer::<Out, Err>::is_closed(&self.ctx.observer) }
}
