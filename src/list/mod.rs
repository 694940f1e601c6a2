use std::cell::Cell;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::list::cursor::Cursor;
use crate::{IntoIter, Iter, IterMut};

pub mod cursor;
pub mod iterator;

/// The `List` is a circular doubly-linked list with owned nodes. It allows
/// inserting and removing elements at the cursor position in constant time;
/// reaching an arbitrary position takes *O*(*n*) time.
///
/// The `List` contains:
/// - a pointer `sentinel` to the permanent, value-less sentinel node;
/// - a length field `len` counting the non-sentinel nodes;
/// - a `version` counter, bumped on every insertion or removal.
///
/// `len` and `version` live in [`Cell`]s because cursors are created from a
/// shared reference and edit the list through it; the version comparison in
/// [`Cursor`] is what arbitrates between live cursors (see the crate docs).
/// As a consequence the list is single-threaded (`!Sync`).
pub struct List<T> {
    sentinel: NonNull<Node<Erased>>,
    /// the number of non-sentinel nodes in the ring
    len: Cell<usize>,
    /// bumped exactly once per insertion or removal
    version: Cell<u64>,
    /// element reads in flight; edits panic while this is nonzero
    reads: Cell<usize>,
    _marker: PhantomData<Box<Node<T>>>,
}

#[repr(C)]
pub(crate) struct Node<T> {
    pub(crate) next: NonNull<Node<T>>,
    pub(crate) prev: NonNull<Node<T>>,
    pub(crate) element: T,
}

/// Payload type of the sentinel node. `Node<T>` is `#[repr(C)]` with the
/// element last, so a `Node<Erased>` can be viewed as a `Node<T>` whose
/// element is never read.
struct Erased;

/// Marks an element read in flight. While at least one guard is alive, user
/// code reached through the read (a `Clone`, `Debug` or `PartialEq` impl
/// holding its own handle to the list) must not splice nodes or overwrite
/// elements; [`List::assert_no_reads`] enforces that with a panic.
pub(crate) struct ReadGuard<'a> {
    reads: &'a Cell<usize>,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.reads.set(self.reads.get() - 1);
    }
}

// private methods
impl<T> List<T> {
    pub(crate) fn sentinel_node(&self) -> NonNull<Node<T>> {
        self.sentinel.cast()
    }
    pub(crate) fn front_node(&self) -> NonNull<Node<T>> {
        // SAFETY: `sentinel.next` is always valid (either the sentinel itself,
        // or the first element of the ring).
        unsafe { self.sentinel_node().as_ref().next }
    }
    pub(crate) fn back_node(&self) -> NonNull<Node<T>> {
        // SAFETY: `sentinel.prev` is always valid (either the sentinel itself,
        // or the last element of the ring).
        unsafe { self.sentinel_node().as_ref().prev }
    }

    pub(crate) fn version(&self) -> u64 {
        self.version.get()
    }

    fn bump_version(&self) {
        self.version.set(self.version.get() + 1);
    }

    /// Begin an element read; the read ends when the guard is dropped.
    pub(crate) fn read_elements(&self) -> ReadGuard<'_> {
        self.reads.set(self.reads.get() + 1);
        ReadGuard { reads: &self.reads }
    }

    /// Panic if an element read is in flight. Every edit of the list that
    /// runs under a shared reference (cursor `add`/`remove`/`set`) calls this
    /// before touching a node.
    pub(crate) fn assert_no_reads(&self) {
        if self.reads.get() != 0 {
            panic!("list cannot be edited while an element is being read");
        }
    }

    unsafe fn connect(&self, mut prev: NonNull<Node<T>>, mut next: NonNull<Node<T>>) {
        prev.as_mut().next = next;
        next.as_mut().prev = prev;
    }

    /// Detach a single node `node` from the ring and return it as a box.
    /// Decrements `len` and bumps the version.
    ///
    /// It is unsafe because it does not check whether `node` is a linked,
    /// non-sentinel node of this list. If it is not, this call makes the
    /// list ill-formed.
    pub(crate) unsafe fn detach_node(&self, node: NonNull<Node<T>>) -> Box<Node<T>> {
        self.len.set(self.len.get() - 1);
        self.bump_version();
        let node = Box::from_raw(node.as_ptr());
        self.connect(node.prev, node.next);
        node
    }

    /// Attach a single node `node` to the ring, between `prev` and `next`.
    /// The node is fully linked before the ring is touched, so no partially
    /// linked state is observable. Increments `len` and bumps the version.
    ///
    /// It is unsafe because it does not check whether `prev` and `next`
    /// belong to this list, or whether they are adjacent (only in
    /// `#[cfg(debug_assertions)]`). If either does not hold, this call makes
    /// the list ill-formed.
    pub(crate) unsafe fn attach_node(
        &self,
        prev: NonNull<Node<T>>,
        next: NonNull<Node<T>>,
        mut node: NonNull<Node<T>>,
    ) {
        #[cfg(debug_assertions)]
        assert_adjacent(prev, next);
        node.as_mut().prev = prev;
        node.as_mut().next = next;
        self.connect(prev, node);
        self.connect(node, next);
        self.len.set(self.len.get() + 1);
        self.bump_version();
        #[cfg(debug_assertions)]
        {
            assert_adjacent(prev, node);
            assert_adjacent(node, next);
        }
    }
}

impl<T> List<T> {
    /// Create an empty `List`.
    ///
    /// # Examples
    /// ```
    /// use cursor_list::List;
    /// let list: List<u32> = List::new();
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self {
            sentinel: new_sentinel(),
            len: Cell::new(0),
            version: Cell::new(0),
            reads: Cell::new(0),
            _marker: PhantomData,
        }
    }

    /// Returns `true` if the `List` is empty.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    /// assert!(list.is_empty());
    ///
    /// list.push_front("foo");
    /// assert!(!list.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len.get() == 0
    }

    /// Returns the length of the `List`, not counting the sentinel node.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_front(2);
    /// assert_eq!(list.len(), 1);
    ///
    /// list.push_front(1);
    /// assert_eq!(list.len(), 2);
    ///
    /// list.push_back(3);
    /// assert_eq!(list.len(), 3);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len.get()
    }

    /// Removes all elements from the `List`.
    ///
    /// This operation should compute in *O*(*n*) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_front(2);
    /// list.push_front(1);
    /// assert_eq!(list.len(), 2);
    ///
    /// list.clear();
    /// assert_eq!(list.len(), 0);
    /// assert_eq!(list.front(), None);
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Returns a clone of the front element, or `None` if the list is empty.
    ///
    /// Elements of a shared list are handed out by value: a live cursor can
    /// splice the front node out at any time, so no reference into it may
    /// outlive this call. References come from the exclusive accessors
    /// ([`front_mut`]) instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    /// assert_eq!(list.front(), None);
    ///
    /// list.push_front(1);
    /// assert_eq!(list.front(), Some(1));
    /// ```
    ///
    /// [`front_mut`]: List::front_mut
    #[inline]
    pub fn front(&self) -> Option<T>
    where
        T: Clone,
    {
        if self.is_empty() {
            return None;
        }
        let _read = self.read_elements();
        // SAFETY: the list is not empty, so `sentinel.next` is an element
        // node, and element nodes always hold a valid element.
        unsafe { Some(self.front_node().as_ref().element.clone()) }
    }

    /// Provides a mutable reference to the front element, or `None` if the
    /// list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    /// list.push_front(1);
    ///
    /// if let Some(x) = list.front_mut() {
    ///     *x = 5;
    /// }
    /// assert_eq!(list.front(), Some(5));
    /// ```
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }
        let mut node = self.front_node();
        // SAFETY: the list is not empty, and `&mut self` guarantees exclusive
        // access to the nodes.
        unsafe { Some(&mut node.as_mut().element) }
    }

    /// Returns a clone of the back element, or `None` if the list is empty.
    ///
    /// Like [`front`](List::front), elements of a shared list are handed out
    /// by value; see [`back_mut`](List::back_mut) for a reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    /// assert_eq!(list.back(), None);
    ///
    /// list.push_back(1);
    /// assert_eq!(list.back(), Some(1));
    /// ```
    #[inline]
    pub fn back(&self) -> Option<T>
    where
        T: Clone,
    {
        if self.is_empty() {
            return None;
        }
        let _read = self.read_elements();
        // SAFETY: the list is not empty, so `sentinel.prev` is an element
        // node, and element nodes always hold a valid element.
        unsafe { Some(self.back_node().as_ref().element.clone()) }
    }

    /// Provides a mutable reference to the back element, or `None` if the
    /// list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    /// list.push_back(1);
    ///
    /// if let Some(x) = list.back_mut() {
    ///     *x = 5;
    /// }
    /// assert_eq!(list.back(), Some(5));
    /// ```
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            return None;
        }
        let mut node = self.back_node();
        // SAFETY: the list is not empty, and `&mut self` guarantees exclusive
        // access to the nodes.
        unsafe { Some(&mut node.as_mut().element) }
    }

    /// Adds an element first in the list.
    ///
    /// This is a structural edit: it bumps the version counter, so cursors
    /// created before the call are invalidated.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_front(2);
    /// assert_eq!(list.front(), Some(2));
    ///
    /// list.push_front(1);
    /// assert_eq!(list.front(), Some(1));
    /// ```
    pub fn push_front(&mut self, elt: T) {
        // SAFETY: the sentinel and the front node are adjacent nodes of this
        // list, so it is safe.
        unsafe {
            self.attach_node(self.sentinel_node(), self.front_node(), Node::new_detached(elt))
        }
    }

    /// Removes the first element and returns it, or `None` if the list is
    /// empty.
    ///
    /// This is a structural edit: it bumps the version counter, so cursors
    /// created before the call are invalidated.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    /// assert_eq!(list.pop_front(), None);
    ///
    /// list.push_front(1);
    /// list.push_front(3);
    /// assert_eq!(list.pop_front(), Some(3));
    /// assert_eq!(list.pop_front(), Some(1));
    /// assert_eq!(list.pop_front(), None);
    /// ```
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is not empty, so the front node is a linked,
        // non-sentinel node of this list.
        let node = unsafe { self.detach_node(self.front_node()) };
        Some(node.into_element())
    }

    /// Appends an element to the back of the list.
    ///
    /// This is a structural edit: it bumps the version counter, so cursors
    /// created before the call are invalidated.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    /// list.push_back(1);
    /// list.push_back(3);
    /// assert_eq!(list.back(), Some(3));
    /// ```
    pub fn push_back(&mut self, elt: T) {
        // SAFETY: the back node and the sentinel are adjacent nodes of this
        // list, so it is safe.
        unsafe { self.attach_node(self.back_node(), self.sentinel_node(), Node::new_detached(elt)) }
    }

    /// Removes the last element from the list and returns it, or `None` if
    /// it is empty.
    ///
    /// This is a structural edit: it bumps the version counter, so cursors
    /// created before the call are invalidated.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    /// assert_eq!(list.pop_back(), None);
    /// list.push_back(1);
    /// list.push_back(3);
    /// assert_eq!(list.pop_back(), Some(3));
    /// ```
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is not empty, so the back node is a linked,
        // non-sentinel node of this list.
        let node = unsafe { self.detach_node(self.back_node()) };
        Some(node.into_element())
    }

    /// Provides a cursor at the logical start of the list, synchronized with
    /// the list's current version.
    ///
    /// Several cursors may be alive at once; a structural edit through any of
    /// them invalidates all the others. See [`Cursor`] for the full contract.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let list = List::from_iter([1, 2, 3]);
    /// let mut cursor = list.cursor();
    /// assert_eq!(cursor.next(), Ok(1));
    /// ```
    pub fn cursor(&self) -> Cursor<'_, T> {
        Cursor::new(self)
    }

    /// Provides a forward iterator over clones of the elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_back(0);
    /// list.push_back(1);
    /// list.push_back(2);
    ///
    /// let mut iter = list.iter();
    /// assert_eq!(iter.next(), Some(0));
    /// assert_eq!(iter.next(), Some(1));
    /// assert_eq!(iter.next(), Some(2));
    /// assert_eq!(iter.next(), None);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Provides a forward iterator with mutable references.
    ///
    /// # Examples
    ///
    /// ```
    /// use cursor_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_back(0);
    /// list.push_back(1);
    /// list.push_back(2);
    ///
    /// for element in list.iter_mut() {
    ///     *element += 10;
    /// }
    ///
    /// let mut iter = list.iter();
    /// assert_eq!(iter.next(), Some(10));
    /// assert_eq!(iter.next(), Some(11));
    /// assert_eq!(iter.next(), Some(12));
    /// assert_eq!(iter.next(), None);
    /// ```
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self)
    }
}

impl<T: Debug> Debug for List<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let _read = self.read_elements();
        let mut f = f.debug_list();
        let mut node = self.front_node();
        for _ in 0..self.len() {
            // SAFETY: the first `len` nodes after the sentinel are element
            // nodes, and the read guard keeps them in place.
            let current = unsafe { node.as_ref() };
            f.entry(&current.element);
            node = current.next;
        }
        f.finish()
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let _read_self = self.read_elements();
        let _read_other = other.read_elements();
        let mut a = self.front_node();
        let mut b = other.front_node();
        for _ in 0..self.len() {
            // SAFETY: the first `len` nodes after the sentinel are element
            // nodes, and the read guards keep them in place.
            unsafe {
                if a.as_ref().element != b.as_ref().element {
                    return false;
                }
                a = a.as_ref().next;
                b = b.as_ref().next;
            }
        }
        true
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T: Clone> Clone for List<T> {
    fn clone(&self) -> Self {
        self.iter().collect()
    }
}

impl<T> Node<T> {
    /// Create a detached node holding `element`. Its links are dangling and
    /// must be patched by `attach_node` before they are ever read.
    pub(crate) fn new_detached(element: T) -> NonNull<Node<T>> {
        NonNull::from(Box::leak(Box::new(Node {
            next: NonNull::dangling(),
            prev: NonNull::dangling(),
            element,
        })))
    }

    pub(crate) fn into_element(self: Box<Self>) -> T {
        self.element
    }
}

/// Allocate a sentinel node whose links point to itself, forming an empty
/// ring. Its payload is never read.
fn new_sentinel() -> NonNull<Node<Erased>> {
    let sentinel = Node::new_detached(Erased);
    // SAFETY: the node was just allocated and is exclusively owned here.
    unsafe {
        (*sentinel.as_ptr()).next = sentinel;
        (*sentinel.as_ptr()).prev = sentinel;
    }
    sentinel
}

#[cfg(debug_assertions)]
fn assert_adjacent<T>(prev: NonNull<Node<T>>, next: NonNull<Node<T>>) {
    unsafe {
        assert_eq!(prev.as_ref().next, next);
        assert_eq!(next.as_ref().prev, prev);
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: `clear` removed every element node, so the sentinel is the
        // only ring member left and nothing points to it anymore.
        unsafe { drop(Box::from_raw(self.sentinel.as_ptr())) };
    }
}

// The nodes are owned by the list, so sending the list sends the elements.
// `Sync` is deliberately not implemented: `len` and `version` live in `Cell`s.
unsafe impl<T: Send> Send for List<T> {}

// Ensure that `List` and its read-only iterators are covariant in their type parameters.
#[allow(dead_code)]
fn assert_covariance() {
    fn a<'a>(x: List<&'static str>) -> List<&'a str> {
        x
    }
    fn b<'i, 'a>(x: Iter<'i, &'static str>) -> Iter<'i, &'a str> {
        x
    }
    fn c<'a>(x: IntoIter<&'static str>) -> IntoIter<&'a str> {
        x
    }
}

#[cfg(test)]
mod tests {
    use crate::list::List;
    use std::cell::RefCell;
    use std::iter::FromIterator;

    #[test]
    fn list_create() {
        let mut list = List::<i32>::new();
        assert!(list.is_empty());
        list.push_back(1);
        assert!(!list.is_empty());
        assert_eq!(list.pop_back(), Some(1));
        assert!(list.is_empty());
    }

    #[test]
    fn list_drop() {
        #[derive(Debug)]
        struct DropChecker<'a, T: Copy> {
            value: T,
            dropped: &'a RefCell<Vec<T>>,
        }
        impl<'a, T: Copy> DropChecker<'a, T> {
            fn new(value: T, dropped: &'a RefCell<Vec<T>>) -> Self {
                Self { value, dropped }
            }
        }
        impl<'a, T: Copy> Drop for DropChecker<'a, T> {
            fn drop(&mut self) {
                self.dropped.borrow_mut().push(self.value);
            }
        }
        let dropped = RefCell::new(Vec::<i32>::new());
        let mut list = List::new();
        list.push_back(DropChecker::new(1, &dropped));
        list.push_back(DropChecker::new(2, &dropped));
        list.push_back(DropChecker::new(3, &dropped));
        drop(list);
        assert_eq!(dropped.borrow().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn list_push_and_pop() {
        let mut list = List::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);

        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.pop_back(), None);

        list.push_back(1);
        assert_eq!(list.back(), Some(1));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);

        list.push_front(1);
        list.push_front(2);
        list.push_back(3);
        assert_eq!(list.len(), 3);
        assert_eq!(list.back(), Some(3));
        assert_eq!(list.front(), Some(2));
        assert_eq!(list.pop_front(), Some(2));
        assert_eq!(list.pop_back(), Some(3));

        assert_eq!(list.front(), Some(1));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn list_front_and_back_mut() {
        let mut list = List::from_iter([1, 2, 3]);
        *list.front_mut().unwrap() = 10;
        *list.back_mut().unwrap() = 30;
        assert_eq!(list, List::from_iter([10, 2, 30]));

        let mut empty = List::<i32>::new();
        assert_eq!(empty.front_mut(), None);
        assert_eq!(empty.back_mut(), None);
    }

    #[test]
    fn list_eq_and_clone() {
        let list = List::from_iter(0..5);
        let cloned = list.clone();
        assert_eq!(list, cloned);
        assert_ne!(list, List::from_iter(0..4));
        assert_ne!(list, List::from_iter(1..6));
        assert_eq!(List::<i32>::new(), List::new());
    }

    #[test]
    fn version_counts_structural_edits() {
        let mut list = List::new();
        let v0 = list.version();
        list.push_back(1); // +1
        list.push_front(0); // +1
        assert_eq!(list.version(), v0 + 2);
        list.pop_back(); // +1
        assert_eq!(list.version(), v0 + 3);
        list.clear(); // one removal left
        assert_eq!(list.version(), v0 + 4);
    }
}
