//! # rxcore: a push-based reactive stream engine
//!
//! Observables are lazy descriptions of a sequence; subscribing runs them and
//! returns a [`Subscription`] that cancels the run. Operators wrap their
//! source and the downstream observer, subjects multicast one execution, and
//! every time-based operator takes an explicit [`Scheduler`].
//!
//! ## Quick Start
//!
//! ```rust
//! use rxcore::prelude::*;
//! use std::{cell::RefCell, rc::Rc};
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let s = seen.clone();
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(move |v| s.borrow_mut().push(v));
//! assert_eq!(*seen.borrow(), vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Subscribes an observer, returning its subscription |
//! | [`ObservableExt`] | The operator surface |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Scheduler`] | Decides when deferred work runs |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `futures::executor::LocalSpawner` as a
//!   real-clock scheduler, with `futures-time` timers.
//! - **`tokio-scheduler`**: a scheduler running on the current tokio
//!   `LocalSet`.
//!
//! [`Observable`]: observable::Observable
//! [`ObservableExt`]: observable::ObservableExt
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler

pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod strategy;
pub mod subject;
pub mod subscription;
pub mod type_hint;

pub use prelude::*;
