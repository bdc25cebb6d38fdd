//! Prelude module for convenient imports

pub use crate::{
  error::{ConfigError, EmptyError, RxError},
  observable::{
    self, BoxOp, CloneBoxOp, ConnectableObservable, Create, Emitter, IntoBoxOp, IntoCloneBoxOp, Observable,
    ObservableExt,
  },
  observer::{BoxedObserver, Observer},
  ops::{
    group_by::GroupedObservable,
    retry::{RetryConfig, RetryPolicy},
    throttle_time::ThrottleEdge,
  },
  scheduler::{Duration, Scheduler, TaskHandle, TaskStatus, TestScheduler},
  strategy::{
    AggregateArg, AggregateStrategy, BroadcastArg, BroadcastStrategy, CombineStrategy, DelayArg, DelayStrategy,
    FilterStrategy, GroupStrategy, MergeStrategy, PaceStrategy, RecoverArg, RecoverStrategy, SelectStrategy,
    SwitchStrategy, TakeStrategy, TransformArg, TransformStrategy,
  },
  subject::*,
  subscription::*,
};
pub use std::convert::Infallible;

#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
