use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subject::{Subject, SubjectSubscription},
};
use std::{collections::HashMap, hash::Hash};

/// One group emitted by `group_by`: the key, plus a hot stream of the source
/// values that map to it.
///
/// Values reach only the observers subscribed at the time they arrive; the
/// group itself is emitted before its first value, so subscribing inside the
/// downstream `next` sees every value of the group.
#[derive(Clone)]
pub struct GroupedObservable<Key, Item, Err> {
  pub key: Key,
  subject: Subject<Item, Err>,
}

impl<Key, Item, Err, O> Observable<Item, Err, O> for GroupedObservable<Key, Item, Err>
where
  O: Observer<Item, Err> + 'static,
  Err: Clone,
{
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.subject.actual_subscribe(observer) }
}

impl<Key, Item, Err> ObservableExt<Item, Err> for GroupedObservable<Key, Item, Err> {}

#[derive(Clone)]
pub struct GroupByOp<S, F> {
  pub(crate) source: S,
  pub(crate) key: F,
}

pub struct GroupByObserver<O, F, Key, Item, Err> {
  observer: O,
  key: F,
  groups: HashMap<Key, Subject<Item, Err>>,
}

impl<Item, Err, O, S, F, Key> Observable<GroupedObservable<Key, Item, Err>, Err, O> for GroupByOp<S, F>
where
  O: Observer<GroupedObservable<Key, Item, Err>, Err>,
  S: Observable<Item, Err, GroupByObserver<O, F, Key, Item, Err>>,
  F: FnMut(&Item) -> Key,
  Key: Hash + Eq + Clone,
  Item: Clone,
  Err: Clone,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(GroupByObserver { observer, key: self.key, groups: HashMap::new() })
  }
}

impl<Item, Err, S, F, Key> ObservableExt<GroupedObservable<Key, Item, Err>, Err> for GroupByOp<S, F>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(&Item) -> Key,
{
}

impl<Item, Err, O, F, Key> Observer<Item, Err> for GroupByObserver<O, F, Key, Item, Err>
where
  O: Observer<GroupedObservable<Key, Item, Err>, Err>,
  F: FnMut(&Item) -> Key,
  Key: Hash + Eq + Clone,
  Item: Clone,
  Err: Clone,
{
  fn next(&mut self, value: Item) {
    let key = (self.key)(&value);
    let subject = match self.groups.get(&key) {
      Some(subject) => subject.clone(),
      None => {
        let subject = Subject::new();
        self.groups.insert(key.clone(), subject.clone());
        self.observer.next(GroupedObservable { key, subject: subject.clone() });
        subject
      }
    };
    subject.next(value);
  }

  fn error(self, err: Err) {
    for subject in self.groups.values() {
      subject.emit_error(err.clone());
    }
    self.observer.error(err);
  }

  fn complete(self) {
    for subject in self.groups.values() {
      subject.emit_complete();
    }
    self.observer.complete();
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, collections::HashMap, rc::Rc};

  #[derive(Clone, Debug, PartialEq)]
  struct Produce {
    c: &'static str,
    name: &'static str,
  }

  #[test]
  fn groups_collect_in_source_order() {
    let items = vec![
      Produce { c: "fruit", name: "apple" },
      Produce { c: "fruit", name: "pear" },
      Produce { c: "veg", name: "leek" },
    ];
    let groups = Rc::new(RefCell::new(HashMap::new()));
    let g = groups.clone();
    observable::from_iter(items)
      .group_by(|p: &Produce| p.c)
      .merge_map(|group| {
        let key = group.key;
        group.to_vec().map(move |values| (key, values))
      })
      .subscribe(move |(key, values)| {
        g.borrow_mut().insert(key, values);
      });

    let groups = groups.borrow();
    assert_eq!(groups.len(), 2);
    let fruit: Vec<_> = groups["fruit"].iter().map(|p| p.name).collect();
    assert_eq!(fruit, vec!["apple", "pear"]);
    assert_eq!(groups["veg"].len(), 1);
  }

  #[test]
  fn error_reaches_every_group() {
    let source = Subject::<i32, &'static str>::new();
    let errors = Rc::new(RefCell::new(0));
    let e = errors.clone();
    source
      .clone()
      .group_by(|v: &i32| v % 2)
      .subscribe_all(
        move |group| {
          let e = e.clone();
          group.subscribe_all(|_| {}, move |_| *e.borrow_mut() += 1, || {});
        },
        |_| {},
        || {},
      );
    source.next(1);
    source.next(2);
    source.error("boom");
    assert_eq!(*errors.borrow(), 2);
  }
}
