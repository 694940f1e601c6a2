//! This crate provides a circular doubly-linked list with owned nodes and
//! fail-fast, bidirectional mutating cursors.
//!
//! The [`List`] allows inserting and removing elements at the cursor position
//! in constant time. Several cursors may be alive on the same list at once;
//! structural edits made through one cursor are detected by every other live
//! cursor, which then refuses to run (see [Fail-fast](#fail-fast) below).
//!
//! Here is a quick example showing how the list and its cursor work.
//!
//! ```
//! use cursor_list::List;
//! use std::iter::FromIterator;
//!
//! let list = List::from_iter([1, 2, 3]);
//!
//! let mut cursor = list.cursor();
//!
//! assert_eq!(cursor.next(), Ok(1)); // walk forward
//! assert_eq!(cursor.set(10), Ok(1)); // replace the element just returned
//! assert_eq!(cursor.next(), Ok(2));
//! assert_eq!(cursor.remove(), Ok(2)); // remove the element just returned
//!
//! cursor.add(4).unwrap(); // insert before the cursor position
//!
//! assert_eq!(Vec::from_iter(list.iter()), vec![10, 4, 3]);
//! ```
//!
//! # Memory Layout
//!
//! The memory layout of the list is like the following graph:
//! ```text
//!          ┌─────────────────────────────────────────────────────────────────────┐
//!          ↓                                                        Sentinel     │
//!    ╔═══════════╗           ╔═══════════╗                        ┌───────────┐  │
//!    ║   next    ║ ────────→ ║   next    ║ ────────→ ┄┄ ────────→ │   next    │ ─┘
//!    ╟───────────╢           ╟───────────╢     Node 2, 3, ...     ├───────────┤
//! ┌─ ║   prev    ║ ←──────── ║   prev    ║ ←──────── ┄┄ ←──────── │   prev    │
//! │  ╟───────────╢           ╟───────────╢                        ├───────────┤
//! │  ║ payload T ║           ║ payload T ║                        ┊No payload ┊
//! │  ╚═══════════╝           ╚═══════════╝                        └╌╌╌╌╌╌╌╌╌╌╌┘
//! │      Node 0                  Node 1                               ↑   ↑
//! └───────────────────────────────────────────────────────────────────┘   │
//! ╔═══════════╗                                                           │
//! ║ sentinel  ║ ──────────────────────────────────────────────────────────┘
//! ╟───────────╢
//! ║ len       ║
//! ║ version   ║
//! ║ reads     ║
//! ╚═══════════╝
//!     List
//! ```
//! The `List` contains:
//! - a pointer `sentinel` to the permanent, value-less sentinel node;
//! - a length field `len` counting the non-sentinel nodes;
//! - a `version` counter, bumped on every insertion or removal;
//! - a `reads` counter of element reads in flight, which blocks cursor edits
//!   reached reentrantly from a `Clone`, `Debug` or `PartialEq` impl of the
//!   element type.
//!
//! The sentinel node holds no payload. In an empty list its `next` and `prev`
//! point to itself; otherwise `sentinel.next` is the first element and
//! `sentinel.prev` is the last. Because the ring has no true head or tail,
//! insertion and removal at the ends need no special cases.
//!
//! # Cursors
//!
//! A [`Cursor`] is created by [`List::cursor`] and always rests *between* two
//! elements: [`next`] returns the element just after it, [`previous`] the
//! element just before it, and the two are exact inverses. [`add`], [`remove`]
//! and [`set`] edit the list at the cursor position. See [`Cursor`] for the
//! full contract.
//!
//! Reading through a shared list hands out elements *by value* (`T: Clone`):
//! with several live cursors able to splice nodes out, a reference into a
//! node could outlive it. References to elements come from the exclusive
//! methods ([`List::front_mut`], [`List::iter_mut`]), where the borrow
//! checker rules out live cursors.
//!
//! # Fail-fast
//!
//! Every structural edit (insertion or removal, through a cursor or through
//! the list itself) bumps the list's version counter. A cursor remembers the
//! version it last synchronized with; every cursor operation first compares
//! the two and fails with [`CursorError::ConcurrentMutation`] when they
//! differ, before any other check or side effect. A cursor's own edits keep
//! it synchronized. Replacing an element with [`set`] does not change the
//! list topology and so invalidates nobody.
//!
//! ```
//! use cursor_list::{CursorError, List};
//! use std::iter::FromIterator;
//!
//! let list = List::from_iter([1, 2, 3]);
//! let mut alive = list.cursor();
//! let mut editing = list.cursor();
//!
//! editing.add(0).unwrap();
//!
//! // `alive` observed the edit made behind its back and refuses to run.
//! assert_eq!(alive.next(), Err(CursorError::ConcurrentMutation));
//! ```
//!
//! # Iteration
//!
//! Iterating over a list is by the [`Iter`] and [`IterMut`] iterators. These
//! are double-ended iterators and iterate the list like an array (fused and
//! non-cyclic). [`Iter`] yields clones of the elements; [`IterMut`] provides
//! mutability of the elements (but not the linked structure of the list).
//!
//! ```
//! use cursor_list::List;
//! use std::iter::FromIterator;
//!
//! let mut list = List::from_iter([1, 2, 3]);
//! let mut iter = list.iter();
//! assert_eq!(iter.next(), Some(1));
//! assert_eq!(iter.next_back(), Some(3));
//! assert_eq!(iter.next(), Some(2));
//! assert_eq!(iter.next(), None);
//!
//! list.iter_mut().for_each(|item| *item *= 2);
//! assert_eq!(Vec::from_iter(list), vec![2, 4, 6]);
//! ```
//!
//! [`List`]: crate::List
//! [`Iter`]: crate::Iter
//! [`IterMut`]: crate::IterMut
//! [`Cursor`]: crate::list::cursor::Cursor
//! [`List::cursor`]: crate::List::cursor
//! [`next`]: crate::list::cursor::Cursor::next
//! [`previous`]: crate::list::cursor::Cursor::previous
//! [`add`]: crate::list::cursor::Cursor::add
//! [`remove`]: crate::list::cursor::Cursor::remove
//! [`set`]: crate::list::cursor::Cursor::set
//! [`CursorError::ConcurrentMutation`]: crate::list::cursor::CursorError::ConcurrentMutation

#[doc(inline)]
pub use list::cursor::{Cursor, CursorError};
#[doc(inline)]
pub use list::iterator::{IntoIter, Iter, IterMut};
#[doc(inline)]
pub use list::List;

pub mod list;
