use smallvec::SmallVec;

/// Observers of a subject, in subscription order, each under a unique id.
pub struct Subscribers<Ob> {
  entries: SmallVec<[(usize, Ob); 2]>,
  next_id: usize,
}

impl<Ob> Default for Subscribers<Ob> {
  fn default() -> Self { Self { entries: SmallVec::new(), next_id: 0 } }
}

impl<Ob> Subscribers<Ob> {
  /// Add an observer and return its unique ID.
  pub fn add(&mut self, observer: Ob) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.entries.push((id, observer));
    id
  }

  pub fn remove(&mut self, id: usize) -> Option<Ob> {
    let idx = self.entries.iter().position(|(i, _)| *i == id)?;
    Some(self.entries.remove(idx).1)
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.entries.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.entries.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Take every observer out, leaving the id counter in place so ids stay
  /// unique across a broadcast.
  pub(crate) fn take_entries(&mut self) -> SmallVec<[(usize, Ob); 2]> {
    std::mem::take(&mut self.entries)
  }

  /// Put back observers taken by `take_entries`, ahead of any added since.
  pub(crate) fn restore(&mut self, mut entries: SmallVec<[(usize, Ob); 2]>) {
    entries.extend(self.entries.drain(..));
    self.entries = entries;
  }

  pub(crate) fn retain(&mut self, f: impl FnMut(&mut (usize, Ob)) -> bool) { self.entries.retain(f) }
}
