use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  ops::share::RefCountOp,
};
use tracing::debug;

/// A source paired with the subject it multicasts through.
///
/// Subscribing only registers with the subject; the source itself runs once
/// [`connect`](ConnectableObservable::connect) is called, and every
/// registered observer then sees the same execution.
#[derive(Clone)]
pub struct ConnectableObservable<S, Sub> {
  source: S,
  subject: Sub,
}

impl<S, Sub> ConnectableObservable<S, Sub> {
  pub fn new(source: S, subject: Sub) -> Self { ConnectableObservable { source, subject } }

  /// A handle on the shared subject, to subscribe before connecting.
  pub fn fork(&self) -> Sub
  where
    Sub: Clone,
  {
    self.subject.clone()
  }

  /// Start the source. Dropping the returned subscription's value does not
  /// disconnect; unsubscribe it to stop the shared execution.
  pub fn connect<Item, Err>(self) -> S::Unsub
  where
    S: Observable<Item, Err, Sub>,
  {
    debug!("connecting multicast source");
    self.source.actual_subscribe(self.subject)
  }

  /// Connect on the first subscriber and disconnect when the last one
  /// unsubscribes.
  pub fn ref_count(self) -> RefCountOp<S, Sub> { RefCountOp::with_subject(self.source, self.subject) }
}

impl<Item, Err, O, S, Sub> Observable<Item, Err, O> for ConnectableObservable<S, Sub>
where
  O: Observer<Item, Err>,
  Sub: Observable<Item, Err, O>,
{
  type Unsub = Sub::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.subject.actual_subscribe(observer) }
}

impl<Item, Err, S, Sub> ObservableExt<Item, Err> for ConnectableObservable<S, Sub> where S: ObservableExt<Item, Err> {}
