use std::fmt;
use std::iter::{FromIterator, FusedIterator};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::list::{List, Node};

/// An iterator over the elements of a `List`, yielding a clone of each.
///
/// It uses a pair of nodes `start..end` to represent a half-open subrange
/// of the list, where `start` is inclusive and `end` is not. Items are
/// cloned out of the nodes: a live cursor may splice any node out between
/// two steps, so no reference into a node may escape a step.
///
/// The iterator borrows the list, so the `&mut` list API is unusable while
/// it is alive. Cursors, however, are created from a shared reference and
/// can structurally edit the list behind the iterator's back; like a stale
/// cursor the iterator detects this through the version counter, but having
/// no error channel it panics instead.
///
/// # Examples
///
/// ```compile_fail
/// use cursor_list::List;
/// use std::iter::FromIterator;
///
/// let mut list = List::from_iter([1, 2, 3]);
/// let mut iter = list.iter();
///
/// // Won't compile, because list is already borrowed immutably.
/// list.push_back(4);
/// println!("{:?}", iter.next());
/// ```
pub struct Iter<'a, T: 'a> {
    start: NonNull<Node<T>>,
    end: NonNull<Node<T>>,
    len: usize,
    /// the list version at creation, compared on every step
    observed: u64,
    list: &'a List<T>,
}

impl<'a, T: 'a> Iter<'a, T> {
    pub(crate) fn new(list: &'a List<T>) -> Self {
        Self {
            start: list.front_node(),
            end: list.sentinel_node(),
            len: list.len(),
            observed: list.version(),
            list,
        }
    }

    fn check_sync(&self) {
        assert_eq!(
            self.observed,
            self.list.version(),
            "list was structurally edited during iteration"
        );
    }
}

impl<'a, T: 'a> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            start: self.start,
            end: self.end,
            len: self.len,
            observed: self.observed,
            list: self.list,
        }
    }
}

impl<'a, T: fmt::Debug + 'a> fmt::Debug for Iter<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.observed != self.list.version() {
            // The node range may dangle after a structural edit; a panic is
            // not an option inside `fmt`.
            return f.write_str("Iter(<stale>)");
        }
        let _read = self.list.read_elements();
        let mut f = f.debug_tuple("Iter");
        // SAFETY: the iterator is synchronized, so `start..end` is still a
        // valid range of the list and every node before `end` is an element
        // node; the read guard keeps them in place.
        let mut ptr = self.start;
        while ptr != self.end {
            let current = unsafe { ptr.as_ref() };
            f.field(&current.element);
            ptr = current.next;
        }
        f.finish()
    }
}

impl<'a, T: Clone + 'a> Iterator for Iter<'a, T> {
    type Item = T;

    /// Clone out `*start` and reset the iterating range to
    /// `(start.next)..end`, or return `None` if `start..end` is already
    /// empty.
    fn next(&mut self) -> Option<Self::Item> {
        self.check_sync();
        if self.len == 0 {
            return None;
        }
        // SAFETY: the range is not empty here, so `start` is an element node.
        let current = unsafe { self.start.as_ref() };
        self.start = current.next;
        self.len -= 1;
        let _read = self.list.read_elements();
        Some(current.element.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn last(mut self) -> Option<Self::Item>
    where
        Self: Sized,
    {
        self.next_back()
    }
}

impl<'a, T: Clone + 'a> DoubleEndedIterator for Iter<'a, T> {
    /// Reset the iterating range to `start..(end.prev)` and clone out
    /// `*end`, or return `None` if `start..end` is already empty.
    fn next_back(&mut self) -> Option<Self::Item> {
        self.check_sync();
        if self.len == 0 {
            return None;
        }
        // SAFETY: the range is not empty here, so `end.prev` is an element
        // node.
        self.end = unsafe { self.end.as_ref().prev };
        let current = unsafe { self.end.as_ref() };
        self.len -= 1;
        let _read = self.list.read_elements();
        Some(current.element.clone())
    }
}

impl<'a, T: Clone + 'a> ExactSizeIterator for Iter<'a, T> {}

impl<'a, T: Clone + 'a> FusedIterator for Iter<'a, T> {}

/// A mutable iterator over the elements of a `List`.
///
/// `start..end` denotes a subrange of the list.
///
/// The exclusive borrow of the list rules out live cursors and any other
/// mutation path, so unlike [`Iter`] there is no staleness to detect.
///
/// # Examples
///
/// `List` is not readable after an `IterMut` is created.
/// ```compile_fail
/// use cursor_list::List;
/// use std::iter::FromIterator;
///
/// let mut list = List::from_iter([1, 2, 3]);
/// let mut iter = list.iter_mut();
/// println!("{:?}", list.back());
/// println!("{:?}", iter.next());
/// ```
pub struct IterMut<'a, T: 'a> {
    start: NonNull<Node<T>>,
    end: NonNull<Node<T>>,
    len: usize,
    _marker: PhantomData<&'a mut List<T>>,
}

impl<'a, T: 'a> IterMut<'a, T> {
    pub(crate) fn new(list: &'a mut List<T>) -> Self {
        Self {
            start: list.front_node(),
            end: list.sentinel_node(),
            len: list.len(),
            _marker: PhantomData,
        }
    }
}

impl<'a, T: fmt::Debug + 'a> fmt::Debug for IterMut<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_tuple("IterMut");
        // SAFETY: `start..end` is always a valid range of a list, so every
        // node before `end` is an element node.
        let mut ptr = self.start;
        while ptr != self.end {
            let current = unsafe { ptr.as_ref() };
            f.field(&current.element);
            ptr = current.next;
        }
        f.finish()
    }
}

impl<'a, T: 'a> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    /// Return `*start` and reset the iterating range to `(start.next)..end`,
    /// or return `None` if `start..end` is already empty.
    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: the range is not empty here, so `start` is an element node,
        // and the iterator holds the only access to the list.
        let current = unsafe { self.start.as_mut() };
        self.start = current.next;
        self.len -= 1;
        Some(&mut current.element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn last(mut self) -> Option<Self::Item>
    where
        Self: Sized,
    {
        self.next_back()
    }
}

impl<'a, T: 'a> DoubleEndedIterator for IterMut<'a, T> {
    /// Reset the iterating range to `start..(end.prev)` and return `*end`,
    /// or return `None` if `start..end` is already empty.
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        // SAFETY: the range is not empty here, so `end.prev` is an element
        // node, and the iterator holds the only access to the list.
        self.end = unsafe { self.end.as_ref().prev };
        let current = unsafe { self.end.as_mut() };
        self.len -= 1;
        Some(&mut current.element)
    }
}

impl<'a, T: 'a> ExactSizeIterator for IterMut<'a, T> {}

impl<'a, T: 'a> FusedIterator for IterMut<'a, T> {}

/// An owning iterator over the elements of a `List`.
///
/// This `struct` is created by the [`into_iter`] method on [`List`]
/// (provided by the `IntoIterator` trait). See its documentation for more.
///
/// [`into_iter`]: List::into_iter
pub struct IntoIter<T> {
    list: List<T>,
}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("list", &self.list)
            .finish()
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.list.len();
        (len, Some(len))
    }

    fn last(mut self) -> Option<Self::Item>
    where
        Self: Sized,
    {
        self.next_back()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.list.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self }
    }
}

impl<'a, T: Clone> IntoIterator for &'a List<T> {
    type Item = T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut List<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = List::new();
        list.extend(iter);
        list
    }
}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        iter.into_iter().for_each(|item| self.push_back(item));
    }
}

impl<'a, T: 'a + Copy> Extend<&'a T> for List<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied())
    }
}
