use std::error::Error;
use std::fmt;
use std::fmt::Formatter;
use std::mem;
use std::ptr::NonNull;

use crate::list::{List, Node};

/// The error kinds a [`Cursor`] operation can fail with.
///
/// All of them are raised synchronously at the point of violation and none is
/// recovered from internally; the caller must adjust its usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorError {
    /// `next` or `previous` was called with no element left in that
    /// direction.
    Exhausted,
    /// `remove` or `set` was called with no current element: either no
    /// `next`/`previous` call established one, or it was already consumed
    /// by a prior `remove`, `set` or `add`.
    NoCurrentElement,
    /// The list was structurally edited through a different cursor (or
    /// through the list itself) since this cursor last synchronized. The
    /// check runs before any other precondition check or side effect, so a
    /// stale cursor never partially mutates the list.
    ConcurrentMutation,
}

impl fmt::Display for CursorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CursorError::Exhausted => write!(f, "no element left in this direction"),
            CursorError::NoCurrentElement => {
                write!(f, "no current element to remove or replace")
            }
            CursorError::ConcurrentMutation => {
                write!(f, "list was structurally edited outside this cursor")
            }
        }
    }
}

impl Error for CursorError {}

/// A bidirectional, mutation-capable cursor over a [`List`].
///
/// A `Cursor` always rests *between* two elements. `before` and `after` are
/// the ring nodes on either side of that resting point: [`next`] returns the
/// element of `after` and moves the cursor past it, [`previous`] returns the
/// element of `before` and moves the cursor in front of it. The two are exact
/// inverses: calling one and then the other returns the cursor to the
/// identical state and yields the same element both times.
///
/// Elements are handed out by value: [`next`] and [`previous`] clone the
/// element they step over (`T: Clone`). A live cursor on another handle of
/// the same list can splice any node out, so no reference into a node may
/// outlive the call that produced it.
///
/// In a list with length *n* there are *n* + 1 resting points, indexed by
/// 0, 1, ..., *n*; [`next_index`] reports the current one.
///
/// The element most recently returned by [`next`] or [`previous`] is the
/// *current* element, eligible for [`remove`] and [`set`]. It is consumed by
/// `remove`, `set` and [`add`], after which another `next`/`previous` call is
/// needed before removing or replacing again.
///
/// # Fail-fast
///
/// A cursor remembers the list version it last synchronized with. Every
/// operation first compares it against the list's current version and fails
/// with [`CursorError::ConcurrentMutation`] when they differ, i.e. when a
/// structural edit happened through a different cursor or through the list
/// itself. A cursor's own edits re-synchronize it. [`set`] does not bump the
/// version because it leaves the topology and length untouched.
///
/// # Examples
///
/// ```
/// use cursor_list::List;
/// use std::iter::FromIterator;
///
/// let list = List::from_iter(['a', 'b', 'c']);
/// let mut cursor = list.cursor();
///
/// assert_eq!(cursor.next(), Ok('a'));
/// assert_eq!(cursor.next(), Ok('b'));
/// assert_eq!(cursor.previous(), Ok('b')); // exact inverse of `next`
/// assert_eq!(cursor.remove(), Ok('b'));
///
/// assert_eq!(Vec::from_iter(list.iter()), vec!['a', 'c']);
/// ```
///
/// [`next`]: Cursor::next
/// [`previous`]: Cursor::previous
/// [`next_index`]: Cursor::next_index
/// [`remove`]: Cursor::remove
/// [`set`]: Cursor::set
/// [`add`]: Cursor::add
pub struct Cursor<'a, T: 'a> {
    /// the node just before the resting point
    before: NonNull<Node<T>>,
    /// the node just after the resting point, i.e. the next to be returned
    after: NonNull<Node<T>>,
    /// logical index of `after` among the elements
    index: usize,
    /// the node last returned by `next`/`previous`, if not yet consumed
    last: Option<NonNull<Node<T>>>,
    /// the list version this cursor last synchronized with
    observed: u64,
    list: &'a List<T>,
}

impl<'a, T: 'a> Cursor<'a, T> {
    pub(crate) fn new(list: &'a List<T>) -> Self {
        Self {
            before: list.sentinel_node(),
            after: list.front_node(),
            index: 0,
            last: None,
            observed: list.version(),
            list,
        }
    }

    fn check_sync(&self) -> Result<(), CursorError> {
        if self.observed != self.list.version() {
            return Err(CursorError::ConcurrentMutation);
        }
        Ok(())
    }

    /// Returns `true` if a `next` call would yield an element.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::ConcurrentMutation`] if the cursor is stale.
    pub fn has_next(&self) -> Result<bool, CursorError> {
        self.check_sync()?;
        Ok(self.index < self.list.len())
    }

    /// Returns `true` if a `previous` call would yield an element.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::ConcurrentMutation`] if the cursor is stale.
    pub fn has_previous(&self) -> Result<bool, CursorError> {
        self.check_sync()?;
        Ok(self.index > 0)
    }

    /// Moves the cursor past the next element and returns a clone of it.
    /// That element becomes the current one.
    ///
    /// This operation should compute in *O*(1) time, plus one clone.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::ConcurrentMutation`] if the cursor is stale,
    /// and with [`CursorError::Exhausted`] at the end of the list.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::{CursorError, List};
    /// use std::iter::FromIterator;
    ///
    /// let list = List::from_iter([1, 2]);
    /// let mut cursor = list.cursor();
    ///
    /// assert_eq!(cursor.next(), Ok(1));
    /// assert_eq!(cursor.next(), Ok(2));
    /// assert_eq!(cursor.next(), Err(CursorError::Exhausted));
    /// ```
    pub fn next(&mut self) -> Result<T, CursorError>
    where
        T: Clone,
    {
        if !self.has_next()? {
            return Err(CursorError::Exhausted);
        }
        let current = self.after;
        self.last = Some(current);
        self.before = current;
        // SAFETY: `index < len` here, so `after` is an element node, and
        // every node's `next` is valid in a closed ring.
        self.after = unsafe { current.as_ref().next };
        self.index += 1;
        let _read = self.list.read_elements();
        // SAFETY: element nodes always hold a valid element, and the read
        // guard keeps the node in place while `clone` runs.
        Ok(unsafe { current.as_ref().element.clone() })
    }

    /// Moves the cursor in front of the previous element and returns a clone
    /// of it. That element becomes the current one.
    ///
    /// `previous` is the exact inverse of [`next`]: calling one and then the
    /// other returns the cursor to its prior state and yields the same
    /// element both times.
    ///
    /// This operation should compute in *O*(1) time, plus one clone.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::ConcurrentMutation`] if the cursor is stale,
    /// and with [`CursorError::Exhausted`] at the start of the list.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::{CursorError, List};
    /// use std::iter::FromIterator;
    ///
    /// let list = List::from_iter([1, 2]);
    /// let mut cursor = list.cursor();
    ///
    /// assert_eq!(cursor.previous(), Err(CursorError::Exhausted));
    /// assert_eq!(cursor.next(), Ok(1));
    /// assert_eq!(cursor.previous(), Ok(1));
    /// ```
    ///
    /// [`next`]: Cursor::next
    pub fn previous(&mut self) -> Result<T, CursorError>
    where
        T: Clone,
    {
        if !self.has_previous()? {
            return Err(CursorError::Exhausted);
        }
        // Mirror image of `next`: the node stepped over is the old `before`.
        let current = self.before;
        self.last = Some(current);
        self.after = current;
        // SAFETY: `index > 0` here, so `before` is an element node, and
        // every node's `prev` is valid in a closed ring.
        self.before = unsafe { current.as_ref().prev };
        self.index -= 1;
        let _read = self.list.read_elements();
        // SAFETY: element nodes always hold a valid element, and the read
        // guard keeps the node in place while `clone` runs.
        Ok(unsafe { current.as_ref().element.clone() })
    }

    /// Returns the logical index of the element a `next` call would return,
    /// which equals the number of elements before the cursor.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::ConcurrentMutation`] if the cursor is stale.
    pub fn next_index(&self) -> Result<usize, CursorError> {
        self.check_sync()?;
        Ok(self.index)
    }

    /// Returns the logical index of the element a `previous` call would
    /// return, or `None` when the cursor is at the logical start.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::ConcurrentMutation`] if the cursor is stale.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let list = List::from_iter([1, 2]);
    /// let mut cursor = list.cursor();
    ///
    /// assert_eq!(cursor.previous_index(), Ok(None));
    /// cursor.next().unwrap();
    /// assert_eq!(cursor.previous_index(), Ok(Some(0)));
    /// ```
    pub fn previous_index(&self) -> Result<Option<usize>, CursorError> {
        self.check_sync()?;
        Ok(self.index.checked_sub(1))
    }

    /// Removes the current element from the list and returns it.
    ///
    /// The cursor stays between the neighbors of the removed element: when
    /// the current element was reached via `previous` the element ahead
    /// slides into the freed slot and the logical index stays put; when it
    /// was reached via `next` the index decreases by one. The removal
    /// consumes the current element and re-synchronizes this cursor, while
    /// every other live cursor becomes stale.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::ConcurrentMutation`] if the cursor is stale,
    /// and with [`CursorError::NoCurrentElement`] if there is no current
    /// element.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an element read of the same list, such
    /// as a `Clone` or `Debug` impl of `T` reached through this list.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::{CursorError, List};
    /// use std::iter::FromIterator;
    ///
    /// let list = List::from_iter([1, 2, 3]);
    /// let mut cursor = list.cursor();
    ///
    /// cursor.next().unwrap();
    /// assert_eq!(cursor.remove(), Ok(1));
    /// // The current element is consumed; removing again needs another
    /// // `next` or `previous` first.
    /// assert_eq!(cursor.remove(), Err(CursorError::NoCurrentElement));
    ///
    /// assert_eq!(Vec::from_iter(list.iter()), vec![2, 3]);
    /// ```
    pub fn remove(&mut self) -> Result<T, CursorError> {
        self.check_sync()?;
        self.list.assert_no_reads();
        let node = self.last.ok_or(CursorError::NoCurrentElement)?;
        if self.after == node {
            // Reached via `previous`: the element ahead slides into the
            // freed slot, the logical index stays put.
            // SAFETY: `node` is a linked element node (see below).
            self.after = unsafe { node.as_ref().next };
        } else {
            // Reached via `next`: everything before the cursor shrinks by one.
            debug_assert_eq!(self.before, node);
            // SAFETY: `node` is a linked element node (see below).
            self.before = unsafe { node.as_ref().prev };
            self.index -= 1;
        }
        // SAFETY: `node` was returned by `next`/`previous` of this cursor and
        // no structural edit happened since (checked above), so it is still a
        // linked, non-sentinel node of this list.
        let node = unsafe { self.list.detach_node(node) };
        self.observed = self.list.version();
        self.last = None;
        Ok(node.into_element())
    }

    /// Replaces the current element with `value` and returns the element it
    /// held before.
    ///
    /// This is not a structural edit: length, version counter and cursor
    /// position are untouched, and no other cursor is invalidated. The
    /// current element is consumed, so a second `set` without an intervening
    /// `next`/`previous` fails.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::ConcurrentMutation`] if the cursor is stale,
    /// and with [`CursorError::NoCurrentElement`] if there is no current
    /// element.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an element read of the same list, such
    /// as a `Clone` or `Debug` impl of `T` reached through this list.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::{CursorError, List};
    /// use std::iter::FromIterator;
    ///
    /// let list = List::from_iter(["a", "b", "c"]);
    /// let mut cursor = list.cursor();
    ///
    /// cursor.next().unwrap();
    /// cursor.next().unwrap();
    /// assert_eq!(cursor.set("B"), Ok("b"));
    /// assert_eq!(cursor.set("x"), Err(CursorError::NoCurrentElement));
    ///
    /// assert_eq!(Vec::from_iter(list.iter()), vec!["a", "B", "c"]);
    /// ```
    pub fn set(&mut self, value: T) -> Result<T, CursorError> {
        self.check_sync()?;
        self.list.assert_no_reads();
        let mut node = self.last.take().ok_or(CursorError::NoCurrentElement)?;
        // SAFETY: `node` was returned by `next`/`previous` of this cursor and
        // no structural edit happened since (checked above), so it is still a
        // linked, non-sentinel node of this list.
        Ok(mem::replace(unsafe { &mut node.as_mut().element }, value))
    }

    /// Inserts `value` immediately before the cursor position, so a
    /// subsequent `next` skips past it and a subsequent `previous` returns
    /// it. The logical index grows by one.
    ///
    /// The inserted element is not the current one: it consumes a pending
    /// current element instead of becoming eligible for `remove`/`set`. The
    /// insertion re-synchronizes this cursor, while every other live cursor
    /// becomes stale.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Errors
    ///
    /// Fails with [`CursorError::ConcurrentMutation`] if the cursor is stale.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an element read of the same list, such
    /// as a `Clone` or `Debug` impl of `T` reached through this list.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let list = List::new();
    /// let mut cursor = list.cursor();
    ///
    /// cursor.add("a").unwrap();
    /// cursor.add("b").unwrap();
    /// assert_eq!(cursor.next_index(), Ok(2));
    /// assert_eq!(cursor.previous(), Ok("b"));
    ///
    /// assert_eq!(Vec::from_iter(list.iter()), vec!["a", "b"]);
    /// ```
    pub fn add(&mut self, value: T) -> Result<(), CursorError> {
        self.check_sync()?;
        self.list.assert_no_reads();
        let node = Node::new_detached(value);
        // SAFETY: `before` and `after` are adjacent nodes of this list.
        unsafe { self.list.attach_node(self.before, self.after, node) };
        self.before = node;
        self.observed = self.list.version();
        self.index += 1;
        self.last = None;
        Ok(())
    }
}

impl<'a, T> Clone for Cursor<'a, T> {
    /// Cloning yields a second live cursor at the same position. A
    /// structural edit through either one invalidates the other.
    fn clone(&self) -> Self {
        Self {
            before: self.before,
            after: self.after,
            index: self.index,
            last: self.last,
            observed: self.observed,
            list: self.list,
        }
    }
}

impl<'a, T: fmt::Debug + 'a> fmt::Debug for Cursor<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("list", &self.list)
            .field("index", &self.index)
            .field("synchronized", &self.check_sync().is_ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::CursorError;
    use crate::list::List;
    use std::iter::FromIterator;

    #[test]
    fn traversal_count_matches_len() {
        for n in 0..5 {
            let list = List::from_iter(0..n);
            let mut cursor = list.cursor();
            let mut count = 0;
            while cursor.has_next().unwrap() {
                cursor.next().unwrap();
                count += 1;
            }
            assert_eq!(count, list.len());
            assert_eq!(cursor.next(), Err(CursorError::Exhausted));
        }
    }

    #[test]
    fn next_then_previous_is_identity() {
        let list = List::from_iter([1, 2, 3]);
        let mut cursor = list.cursor();

        cursor.next().unwrap();
        assert_eq!(cursor.next_index(), Ok(1));
        assert_eq!(cursor.next(), Ok(2));
        assert_eq!(cursor.previous(), Ok(2));
        assert_eq!(cursor.next_index(), Ok(1));

        // And the other way round, from the same resting point.
        assert_eq!(cursor.previous(), Ok(1));
        assert_eq!(cursor.next(), Ok(1));
        assert_eq!(cursor.next_index(), Ok(1));
    }

    #[test]
    fn add_builds_list_in_order() {
        let list = List::new();
        let mut cursor = list.cursor();
        cursor.add("a").unwrap();
        cursor.add("b").unwrap();
        cursor.add("c").unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(cursor.next_index(), Ok(3));

        let mut fresh = list.cursor();
        assert_eq!(fresh.next(), Ok("a"));
        assert_eq!(fresh.next(), Ok("b"));
        assert_eq!(fresh.next(), Ok("c"));
        assert_eq!(fresh.next(), Err(CursorError::Exhausted));

        assert_eq!(fresh.previous(), Ok("c"));
        assert_eq!(fresh.previous(), Ok("b"));
        assert_eq!(fresh.previous(), Ok("a"));
        assert_eq!(fresh.previous(), Err(CursorError::Exhausted));
    }

    #[test]
    fn add_in_the_middle() {
        let list = List::from_iter([1, 3]);
        let mut cursor = list.cursor();
        cursor.next().unwrap();
        cursor.add(2).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(cursor.next(), Ok(3));
        assert_eq!(list, List::from_iter([1, 2, 3]));
    }

    #[test]
    fn remove_after_next() {
        let list = List::from_iter(["a", "b", "c"]);
        let mut cursor = list.cursor();
        assert_eq!(cursor.next(), Ok("a"));
        assert_eq!(cursor.remove(), Ok("a"));
        assert_eq!(list.len(), 2);
        assert_eq!(cursor.previous_index(), Ok(None));
        assert_eq!(list, List::from_iter(["b", "c"]));
    }

    #[test]
    fn remove_after_previous() {
        let list = List::from_iter(["a", "b", "c"]);
        let mut cursor = list.cursor();
        cursor.next().unwrap();
        cursor.next().unwrap();
        assert_eq!(cursor.previous(), Ok("b"));
        assert_eq!(cursor.next_index(), Ok(1));

        // The element ahead slides into the freed slot: the index stays put
        // and the next element is now "c".
        assert_eq!(cursor.remove(), Ok("b"));
        assert_eq!(cursor.next_index(), Ok(1));
        assert_eq!(cursor.next(), Ok("c"));
        assert_eq!(list, List::from_iter(["a", "c"]));
    }

    #[test]
    fn remove_last_element() {
        let list = List::from_iter([42]);
        let mut cursor = list.cursor();
        cursor.next().unwrap();
        assert_eq!(cursor.remove(), Ok(42));
        assert!(list.is_empty());
        assert_eq!(cursor.has_next(), Ok(false));
        assert_eq!(cursor.has_previous(), Ok(false));
    }

    #[test]
    fn remove_and_set_require_current_element() {
        let list = List::from_iter([1, 2]);
        let mut cursor = list.cursor();
        assert_eq!(cursor.remove(), Err(CursorError::NoCurrentElement));
        assert_eq!(cursor.set(0), Err(CursorError::NoCurrentElement));

        cursor.next().unwrap();
        assert_eq!(cursor.remove(), Ok(1));
        assert_eq!(cursor.remove(), Err(CursorError::NoCurrentElement));

        cursor.next().unwrap();
        assert_eq!(cursor.set(20), Ok(2));
        assert_eq!(cursor.set(21), Err(CursorError::NoCurrentElement));

        // `add` consumes a pending current element as well.
        cursor.previous().unwrap();
        cursor.add(0).unwrap();
        assert_eq!(cursor.remove(), Err(CursorError::NoCurrentElement));
    }

    #[test]
    fn set_replaces_in_place() {
        let list = List::from_iter(["a", "b", "c"]);
        let mut cursor = list.cursor();
        cursor.next().unwrap();
        assert_eq!(cursor.next(), Ok("b"));
        assert_eq!(cursor.set("B"), Ok("b"));
        assert_eq!(list.len(), 3);
        assert_eq!(cursor.next_index(), Ok(2));
        assert_eq!(list, List::from_iter(["a", "B", "c"]));

        // `set` also works on an element reached via `previous`.
        assert_eq!(cursor.previous(), Ok("B"));
        assert_eq!(cursor.set("beta"), Ok("B"));
        assert_eq!(list, List::from_iter(["a", "beta", "c"]));
    }

    #[test]
    fn edits_through_another_cursor_invalidate() {
        let list = List::from_iter([1, 2, 3]);
        let mut alive = list.cursor();
        alive.next().unwrap();

        let mut editing = list.cursor();
        editing.next().unwrap();
        editing.remove().unwrap();

        assert_eq!(alive.next(), Err(CursorError::ConcurrentMutation));
        assert_eq!(alive.previous(), Err(CursorError::ConcurrentMutation));
        assert_eq!(alive.has_next(), Err(CursorError::ConcurrentMutation));
        assert_eq!(alive.has_previous(), Err(CursorError::ConcurrentMutation));
        assert_eq!(alive.next_index(), Err(CursorError::ConcurrentMutation));
        assert_eq!(alive.previous_index(), Err(CursorError::ConcurrentMutation));
        assert_eq!(alive.remove(), Err(CursorError::ConcurrentMutation));
        assert_eq!(alive.set(0), Err(CursorError::ConcurrentMutation));
        assert_eq!(alive.add(0), Err(CursorError::ConcurrentMutation));

        // The editing cursor re-synchronized itself and keeps working.
        assert_eq!(editing.next(), Ok(2));
    }

    #[test]
    fn add_through_another_cursor_invalidates() {
        let list = List::from_iter([1, 2, 3]);
        let mut alive = list.cursor();
        let mut editing = list.cursor();
        editing.add(0).unwrap();
        assert_eq!(alive.next(), Err(CursorError::ConcurrentMutation));
    }

    #[test]
    fn set_does_not_invalidate_other_cursors() {
        let list = List::from_iter([1, 2, 3]);
        let mut alive = list.cursor();

        let mut editing = list.cursor();
        editing.next().unwrap();
        assert_eq!(editing.set(10), Ok(1));

        assert_eq!(alive.next(), Ok(10));
    }

    #[test]
    fn stale_cursor_fails_before_any_other_check() {
        let list = List::from_iter([1]);
        let mut stale = list.cursor();
        list.cursor().add(0).unwrap();
        // Were the precondition checks run first, these would report
        // `NoCurrentElement`; staleness must win.
        assert_eq!(stale.remove(), Err(CursorError::ConcurrentMutation));
        assert_eq!(stale.set(9), Err(CursorError::ConcurrentMutation));
    }

    #[test]
    fn cloned_cursor_is_independent() {
        let list = List::from_iter([1, 2, 3]);
        let mut cursor = list.cursor();
        cursor.next().unwrap();

        let mut twin = cursor.clone();
        assert_eq!(twin.next_index(), Ok(1));
        assert_eq!(twin.next(), Ok(2));

        // A structural edit through the twin invalidates the original.
        twin.remove().unwrap();
        assert_eq!(cursor.next(), Err(CursorError::ConcurrentMutation));
        assert_eq!(twin.next(), Ok(3));
    }

    #[test]
    fn empty_list_cursor() {
        let list = List::<i32>::new();
        let mut cursor = list.cursor();
        assert_eq!(cursor.has_next(), Ok(false));
        assert_eq!(cursor.has_previous(), Ok(false));
        assert_eq!(cursor.next_index(), Ok(0));
        assert_eq!(cursor.previous_index(), Ok(None));
        assert_eq!(cursor.next(), Err(CursorError::Exhausted));
        assert_eq!(cursor.previous(), Err(CursorError::Exhausted));
    }

    #[test]
    fn indices_track_position() {
        let list = List::from_iter(10..14);
        let mut cursor = list.cursor();
        for i in 0..4 {
            assert_eq!(cursor.next_index(), Ok(i));
            assert_eq!(cursor.previous_index(), Ok(i.checked_sub(1)));
            cursor.next().unwrap();
        }
        assert_eq!(cursor.next_index(), Ok(4));
        assert_eq!(cursor.previous_index(), Ok(Some(3)));
    }

    #[test]
    fn removed_element_stays_usable() {
        // `next` hands out a value of its own, not a view into the node, so
        // it survives the node being freed.
        let list = List::from_iter([String::from("a"), String::from("b")]);
        let mut cursor = list.cursor();
        let first = cursor.next().unwrap();
        cursor.remove().unwrap();
        list.cursor().add(String::from("c")).unwrap();
        assert_eq!(first, "a");
    }

    #[test]
    fn set_leaves_earlier_reads_untouched() {
        let list = List::from_iter([1, 2]);
        let before = list.front().unwrap();

        let mut cursor = list.cursor();
        cursor.next().unwrap();
        cursor.set(9).unwrap();

        assert_eq!(before, 1);
        assert_eq!(list.front(), Some(9));
    }

    #[test]
    #[should_panic(expected = "while an element is being read")]
    fn reentrant_edit_during_element_read_panics() {
        use std::rc::Rc;

        // An element that reaches back into its own list while it is being
        // cloned out of it.
        struct Sneaky(Rc<List<Sneaky>>);
        impl Clone for Sneaky {
            fn clone(&self) -> Self {
                self.0.cursor().add(Sneaky(Rc::clone(&self.0))).unwrap();
                Sneaky(Rc::clone(&self.0))
            }
        }

        let list = Rc::new(List::new());
        list.cursor().add(Sneaky(Rc::clone(&list))).unwrap();
        let _ = list.front();
    }

    #[test]
    fn error_display() {
        assert_eq!(
            CursorError::Exhausted.to_string(),
            "no element left in this direction"
        );
        assert_eq!(
            CursorError::NoCurrentElement.to_string(),
            "no current element to remove or replace"
        );
        assert_eq!(
            CursorError::ConcurrentMutation.to_string(),
            "list was structurally edited outside this cursor"
        );
    }
}

// proptest doesn't run under miri with default config
#[cfg(all(not(miri), test))]
mod proptests {
    use super::CursorError;
    use crate::list::List;
    use proptest::prelude::*;
    use std::iter::FromIterator;
    use std::mem;

    #[derive(Clone, Debug)]
    enum Op {
        Next,
        Previous,
        Add(i32),
        Remove,
        Set(i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Next),
            3 => Just(Op::Previous),
            2 => any::<i32>().prop_map(Op::Add),
            2 => Just(Op::Remove),
            1 => any::<i32>().prop_map(Op::Set),
        ]
    }

    /// Reference model of the cursor state machine, backed by a `Vec`.
    ///
    /// `pos` is the resting point (0..=len); `last` is the index of the
    /// element last returned by `Next`/`Previous`: reached via `Next` it is
    /// `pos - 1`, reached via `Previous` it is `pos`, which makes the two
    /// removal branches collapse into "shift `pos` only when the removed
    /// index lies before it".
    struct Model {
        items: Vec<i32>,
        pos: usize,
        last: Option<usize>,
    }

    impl Model {
        fn apply(&mut self, op: &Op) -> Result<Option<i32>, CursorError> {
            match op {
                Op::Next => {
                    if self.pos == self.items.len() {
                        return Err(CursorError::Exhausted);
                    }
                    self.last = Some(self.pos);
                    self.pos += 1;
                    Ok(Some(self.items[self.pos - 1]))
                }
                Op::Previous => {
                    if self.pos == 0 {
                        return Err(CursorError::Exhausted);
                    }
                    self.pos -= 1;
                    self.last = Some(self.pos);
                    Ok(Some(self.items[self.pos]))
                }
                Op::Add(v) => {
                    self.items.insert(self.pos, *v);
                    self.pos += 1;
                    self.last = None;
                    Ok(None)
                }
                Op::Remove => match self.last.take() {
                    None => Err(CursorError::NoCurrentElement),
                    Some(i) => {
                        let removed = self.items.remove(i);
                        if i < self.pos {
                            self.pos -= 1;
                        }
                        Ok(Some(removed))
                    }
                },
                Op::Set(v) => match self.last.take() {
                    None => Err(CursorError::NoCurrentElement),
                    Some(i) => Ok(Some(mem::replace(&mut self.items[i], *v))),
                },
            }
        }
    }

    proptest! {
        #[test]
        fn cursor_agrees_with_vec_model(
            ops in proptest::collection::vec(op_strategy(), 0..200)
        ) {
            let list = List::new();
            let mut cursor = list.cursor();
            let mut model = Model {
                items: Vec::new(),
                pos: 0,
                last: None,
            };
            for op in &ops {
                let got: Result<Option<i32>, CursorError> = match op {
                    Op::Next => cursor.next().map(Some),
                    Op::Previous => cursor.previous().map(Some),
                    Op::Add(v) => cursor.add(*v).map(|_| None),
                    Op::Remove => cursor.remove().map(Some),
                    Op::Set(v) => cursor.set(*v).map(Some),
                };
                prop_assert_eq!(got, model.apply(op));
                prop_assert_eq!(cursor.next_index(), Ok(model.pos));
                prop_assert_eq!(list.len(), model.items.len());
            }
            drop(cursor);
            prop_assert_eq!(Vec::from_iter(list.iter()), model.items);
        }
    }
}
