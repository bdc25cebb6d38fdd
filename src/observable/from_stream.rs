use crate::{
  error::RxError,
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  scheduler::TaskHandle,
};
use futures::{
  future::{abortable, FutureExt},
  task::{LocalSpawn, LocalSpawnExt},
  Stream, StreamExt,
};
use tracing::warn;

/// Converts a `Stream` into an observable that emits every item and
/// completes when the stream ends. The stream is driven by a task on
/// `spawner`.
pub fn from_stream<St, Sp>(stream: St, spawner: Sp) -> ObservableStream<St, Sp>
where
  St: Stream,
  Sp: LocalSpawn,
{
  ObservableStream { stream, spawner }
}

#[derive(Clone)]
pub struct ObservableStream<St, Sp> {
  stream: St,
  spawner: Sp,
}

impl<St, Sp, O> Observable<St::Item, RxError, O> for ObservableStream<St, Sp>
where
  St: Stream + Unpin + 'static,
  Sp: LocalSpawn,
  O: Observer<St::Item, RxError> + 'static,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let observer = MutRc::own(Some(observer));
    let handle = TaskHandle::new();
    let (mut o, h) = (observer.clone(), handle.clone());
    let mut stream = self.stream;
    let (task, abort) = abortable(async move {
      while let Some(value) = stream.next().await {
        if !h.begin() || Observer::<St::Item, RxError>::is_closed(&o) {
          return;
        }
        o.next(value);
        h.suspend();
      }
      if h.begin() {
        o.complete();
        h.finish();
      }
    });
    handle.set_abort(abort);
    if let Err(e) = self.spawner.spawn_local(task.map(|_| ())) {
      warn!(error = %e, "from_stream could not spawn its task");
      handle.finish();
      observer.error(RxError::from(e));
    }
    handle
  }
}

impl<St: Stream, Sp> ObservableExt<St::Item, RxError> for ObservableStream<St, Sp> {}
