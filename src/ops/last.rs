use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Emits only the final value of the source, once it completes. Only the
/// most recent value is retained while waiting.
#[derive(Clone)]
pub struct LastOp<S> {
  pub(crate) source: S,
}

/// Like [`LastOp`], falling back to `default` for an empty source.
#[derive(Clone)]
pub struct LastOrOp<S, Item> {
  pub(crate) source: S,
  pub(crate) default: Item,
}

pub struct LastObserver<O, Item> {
  observer: O,
  last: Option<Item>,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for LastOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, LastObserver<O, Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(LastObserver { observer, last: None })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for LastOp<S> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O, S> Observable<Item, Err, O> for LastOrOp<S, Item>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, LastObserver<O, Item>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(LastObserver { observer, last: Some(self.default) })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for LastOrOp<S, Item> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O> Observer<Item, Err> for LastObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.last = Some(value); }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    if let Some(last) = self.last {
      self.observer.next(last);
    }
    self.observer.complete();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn emits_final_value() {
    let mut out = vec![];
    observable::from_iter(0..5).last().subscribe(|v| out.push(v));
    assert_eq!(out, vec![4]);
  }

  #[test]
  fn empty_source() {
    let mut out = vec![];
    let mut completed = false;
    observable::empty::<i32>().last().subscribe_all(|v| out.push(v), |_| {}, || completed = true);
    assert!(out.is_empty());
    assert!(completed);

    observable::empty().last_or(9).subscribe(|v| out.push(v));
    assert_eq!(out, vec![9]);
  }

  #[test]
  fn error_discards_pending_value() {
    let mut out = vec![];
    let mut failed = false;
    observable::from_iter(0..3)
      .map_err(|e: Infallible| -> &'static str { match e {} })
      .concat(observable::throw_err("x"))
      .last()
      .subscribe_all(|v| out.push(v), |_| failed = true, || {});
    assert!(out.is_empty());
    assert!(failed);
  }
}
