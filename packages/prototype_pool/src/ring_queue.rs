use std::iter::FusedIterator;
use std::num::NonZero;

use crate::{Error, Result};

/// A fixed-capacity circular queue that also supports removal from arbitrary positions.
///
/// Items are added at the back with [`enqueue()`][1] and taken from the front with
/// [`dequeue()`][2], both in O(1) without moving any other item. Items can also be removed from
/// the middle of the queue by logical position ([`dequeue_at()`][3]) or by value
/// ([`try_remove()`][4]); these close the gap by shifting every later item one slot toward the
/// front, so they cost O(n) but keep the relative order of the remaining items.
///
/// Logical positions are counted from the front of the queue: `0` is the next item that
/// [`dequeue()`][2] would return.
///
/// The queue never reallocates on its own. Exceeding the capacity is an error; the owner of the
/// queue may explicitly [`grow()`][5] it.
///
/// # Example
///
/// ```rust
/// use std::num::NonZero;
///
/// use prototype_pool::RingQueue;
///
/// let mut queue = RingQueue::new(NonZero::new(4).unwrap());
///
/// queue.enqueue('a').unwrap();
/// queue.enqueue('b').unwrap();
/// queue.enqueue('c').unwrap();
///
/// // Remove from the middle; the order of the rest is preserved.
/// assert_eq!(queue.dequeue_at(1).unwrap(), 'b');
///
/// assert_eq!(queue.dequeue().unwrap(), 'a');
/// assert_eq!(queue.dequeue().unwrap(), 'c');
/// assert!(queue.is_empty());
/// ```
///
/// [1]: Self::enqueue
/// [2]: Self::dequeue
/// [3]: Self::dequeue_at
/// [4]: Self::try_remove
/// [5]: Self::grow
#[derive(Debug)]
pub struct RingQueue<T> {
    /// Storage for the items. Vacant slots are `None`, so a removed item is never kept alive
    /// by the queue.
    slots: Box<[Option<T>]>,

    /// Physical index of the front item (the next one to dequeue).
    head: usize,

    /// Physical index of the slot the next enqueued item goes into.
    tail: usize,

    /// Number of occupied slots.
    count: usize,
}

impl<T> RingQueue<T> {
    /// Creates an empty queue that can hold up to `capacity` items.
    #[must_use]
    pub fn new(capacity: NonZero<usize>) -> Self {
        Self {
            slots: Self::vacant_slots(capacity.get()),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// The maximum number of items the queue can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The number of items in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the queue holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether the queue holds [`capacity()`][Self::capacity] items.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Adds an item at the back of the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the queue is full. The item is dropped.
    pub fn enqueue(&mut self, item: T) -> Result<()> {
        if self.is_full() {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        let tail = self.tail;
        *self.slot_mut(tail) = Some(item);

        self.tail = self.advance(tail, 1);
        // Cannot overflow because we checked above that the queue is not full.
        self.count = self.count.wrapping_add(1);

        Ok(())
    }

    /// Removes and returns the item at the front of the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the queue holds no items.
    pub fn dequeue(&mut self) -> Result<T> {
        if self.is_empty() {
            return Err(Error::Empty);
        }

        let head = self.head;
        let item = self
            .slot_mut(head)
            .take()
            .expect("slot at head of a non-empty queue is always occupied");

        self.head = self.advance(head, 1);
        // Cannot underflow because we checked above that the queue is not empty.
        self.count = self.count.wrapping_sub(1);

        Ok(item)
    }

    /// Returns the item at the front of the queue without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Empty`] if the queue holds no items.
    pub fn peek(&self) -> Result<&T> {
        if self.is_empty() {
            return Err(Error::Empty);
        }

        Ok(self.occupied(self.head))
    }

    /// Returns the item at logical position `index` without removing it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index` is not less than [`len()`][Self::len].
    pub fn get_at(&self, index: usize) -> Result<&T> {
        self.check_index(index)?;

        Ok(self.occupied(self.physical(index)))
    }

    /// Removes and returns the item at logical position `index`.
    ///
    /// Every item behind the removed one moves one slot toward the front, so this is O(n) in
    /// the number of items behind `index`. The relative order of the remaining items does not
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if `index` is not less than [`len()`][Self::len].
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::num::NonZero;
    ///
    /// use prototype_pool::RingQueue;
    ///
    /// let mut queue = RingQueue::new(NonZero::new(3).unwrap());
    /// queue.enqueue(10).unwrap();
    /// queue.enqueue(20).unwrap();
    /// queue.enqueue(30).unwrap();
    ///
    /// assert_eq!(queue.dequeue_at(0).unwrap(), 10);
    /// assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![20, 30]);
    /// ```
    pub fn dequeue_at(&mut self, index: usize) -> Result<T> {
        self.check_index(index)?;

        let mut hole = self.physical(index);
        let item = self
            .slot_mut(hole)
            .take()
            .expect("slot within the occupied range is always occupied");

        // Walk the hole toward the back, pulling each later item one slot forward.
        let behind = self.count.wrapping_sub(index).wrapping_sub(1);
        for _ in 0..behind {
            let next = self.advance(hole, 1);
            self.slots.swap(hole, next);
            hole = next;
        }

        // The hole now sits in the last occupied slot, which is where the tail moves back to.
        self.tail = hole;
        // Cannot underflow because check_index() guarantees at least one item.
        self.count = self.count.wrapping_sub(1);

        Ok(item)
    }

    /// Removes the first item (from the front) that is equal to `item`.
    ///
    /// Returns `true` if an item was found and removed. This is a linear scan followed by the
    /// same compaction as [`dequeue_at()`][Self::dequeue_at]; callers that need frequent
    /// by-value membership checks should keep an external set alongside the queue.
    pub fn try_remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        let Some(index) = self.iter().position(|candidate| candidate == item) else {
            return false;
        };

        self.dequeue_at(index)
            .expect("position was just found within the occupied range");

        true
    }

    /// Whether any item in the queue is equal to `item`. This is a linear scan.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|candidate| candidate == item)
    }

    /// Removes and drops every item, resetting the queue to its initial state.
    ///
    /// The capacity does not change.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);

        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Moves the items into a new buffer with room for `new_capacity` items.
    ///
    /// The items keep their order. This is the only operation that changes the capacity.
    ///
    /// # Panics
    ///
    /// Panics if `new_capacity` is less than the current capacity.
    pub fn grow(&mut self, new_capacity: NonZero<usize>) {
        let new_capacity = new_capacity.get();

        assert!(
            new_capacity >= self.capacity(),
            "ring queue cannot shrink from {} to {new_capacity} slots",
            self.capacity()
        );

        let mut slots = Vec::with_capacity(new_capacity);

        for index in 0..self.count {
            let physical = self.physical(index);
            slots.push(self.slot_mut(physical).take());
        }

        slots.resize_with(new_capacity, || None);

        self.slots = slots.into_boxed_slice();
        self.head = 0;
        self.tail = if self.count == new_capacity {
            0
        } else {
            self.count
        };
    }

    /// Iterates over the items from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            queue: self,
            next_index: 0,
        }
    }

    fn vacant_slots(capacity: usize) -> Box<[Option<T>]> {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        slots.into_boxed_slice()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.count {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.count,
            });
        }

        Ok(())
    }

    /// Translates a logical position into a physical slot index.
    fn physical(&self, index: usize) -> usize {
        self.advance(self.head, index)
    }

    /// Moves a physical slot index forward by `by` slots, wrapping around the end of the buffer.
    ///
    /// `by` must not exceed the capacity.
    fn advance(&self, physical: usize, by: usize) -> usize {
        debug_assert!(by <= self.capacity());

        // Neither operand exceeds the capacity, which is far below usize::MAX / 2.
        let target = physical.wrapping_add(by);

        if target >= self.capacity() {
            target.wrapping_sub(self.capacity())
        } else {
            target
        }
    }

    fn occupied(&self, physical: usize) -> &T {
        self.slots
            .get(physical)
            .and_then(Option::as_ref)
            .expect("slot within the occupied range is always occupied")
    }

    fn slot_mut(&mut self, physical: usize) -> &mut Option<T> {
        self.slots
            .get_mut(physical)
            .expect("physical index is always within the buffer")
    }
}

impl<'a, T> IntoIterator for &'a RingQueue<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the items of a [`RingQueue`], from front to back.
///
/// Returned by [`RingQueue::iter()`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    queue: &'a RingQueue<T>,
    next_index: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.queue.get_at(self.next_index).ok()?;

        // Cannot overflow because next_index is always below the queue length here.
        self.next_index = self.next_index.wrapping_add(1);

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.queue.len().saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::rc::Rc;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn queue_of(capacity: usize) -> RingQueue<u32> {
        RingQueue::new(NonZero::new(capacity).unwrap())
    }

    fn contents(queue: &RingQueue<u32>) -> Vec<u32> {
        queue.iter().copied().collect()
    }

    #[test]
    fn new_queue_is_empty() {
        let queue = queue_of(3);

        assert_eq!(queue.capacity(), 3);
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert!(!queue.is_full());
    }

    #[test]
    fn dequeue_returns_items_in_enqueue_order() {
        let mut queue = queue_of(3);

        // Go around the ring several times so head and tail wrap.
        let mut next_in = 0;
        let mut next_out = 0;

        for _ in 0..10 {
            queue.enqueue(next_in).unwrap();
            next_in += 1;
            queue.enqueue(next_in).unwrap();
            next_in += 1;

            assert_eq!(queue.dequeue().unwrap(), next_out);
            next_out += 1;
            assert_eq!(queue.dequeue().unwrap(), next_out);
            next_out += 1;
        }

        assert!(queue.is_empty());
    }

    #[test]
    fn enqueue_into_full_queue_fails() {
        let mut queue = queue_of(2);

        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();
        assert!(queue.is_full());

        assert_eq!(
            queue.enqueue(3),
            Err(Error::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(queue.len(), 2);
        assert_eq!(contents(&queue), vec![1, 2]);
    }

    #[test]
    fn dequeue_and_peek_on_empty_queue_fail() {
        let mut queue = queue_of(2);

        assert_eq!(queue.dequeue(), Err(Error::Empty));
        assert_eq!(queue.peek(), Err(Error::Empty));

        queue.enqueue(5).unwrap();
        queue.dequeue().unwrap();

        assert_eq!(queue.dequeue(), Err(Error::Empty));
        assert_eq!(queue.peek(), Err(Error::Empty));
    }

    #[test]
    fn peek_does_not_remove() {
        let mut queue = queue_of(2);
        queue.enqueue(7).unwrap();

        assert_eq!(queue.peek(), Ok(&7));
        assert_eq!(queue.peek(), Ok(&7));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn get_at_addresses_logical_positions() {
        let mut queue = queue_of(3);

        // Shift the head so logical and physical positions differ.
        queue.enqueue(0).unwrap();
        queue.enqueue(0).unwrap();
        queue.dequeue().unwrap();
        queue.dequeue().unwrap();

        queue.enqueue(10).unwrap();
        queue.enqueue(11).unwrap();
        queue.enqueue(12).unwrap();

        assert_eq!(queue.get_at(0), Ok(&10));
        assert_eq!(queue.get_at(1), Ok(&11));
        assert_eq!(queue.get_at(2), Ok(&12));
        assert_eq!(
            queue.get_at(3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn dequeue_at_out_of_range_fails() {
        let mut queue = queue_of(3);
        queue.enqueue(1).unwrap();

        assert_eq!(
            queue.dequeue_at(1),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(contents(&queue), vec![1]);
    }

    #[test]
    fn dequeue_at_across_wrap_keeps_order() {
        let mut queue = queue_of(4);

        for value in 0..3 {
            queue.enqueue(value).unwrap();
        }
        queue.dequeue().unwrap();
        queue.dequeue().unwrap();

        // Physical layout now wraps: [_, _, 2, 3] then [4, _, 2, 3].
        queue.enqueue(3).unwrap();
        queue.enqueue(4).unwrap();
        queue.enqueue(5).unwrap();
        assert_eq!(contents(&queue), vec![2, 3, 4, 5]);

        assert_eq!(queue.dequeue_at(1).unwrap(), 3);
        assert_eq!(contents(&queue), vec![2, 4, 5]);

        // The slot freed by compaction is reused by the next enqueue.
        queue.enqueue(6).unwrap();
        assert_eq!(contents(&queue), vec![2, 4, 5, 6]);
        assert!(queue.is_full());
    }

    #[test]
    fn dequeue_at_last_position() {
        let mut queue = queue_of(3);
        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();

        assert_eq!(queue.dequeue_at(1).unwrap(), 2);
        assert_eq!(contents(&queue), vec![1]);

        queue.enqueue(3).unwrap();
        assert_eq!(contents(&queue), vec![1, 3]);
    }

    #[test]
    fn try_remove_removes_first_match_only() {
        let mut queue = queue_of(5);
        for value in [1, 2, 3, 2, 4] {
            queue.enqueue(value).unwrap();
        }

        assert!(queue.try_remove(&2));
        assert_eq!(contents(&queue), vec![1, 3, 2, 4]);

        assert!(!queue.try_remove(&9));
        assert_eq!(contents(&queue), vec![1, 3, 2, 4]);
    }

    #[test]
    fn try_remove_on_empty_queue_is_false() {
        let mut queue = queue_of(1);

        assert!(!queue.try_remove(&1));
    }

    #[test]
    fn contains_scans_only_occupied_items() {
        let mut queue = queue_of(2);
        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();
        queue.dequeue().unwrap();

        assert!(!queue.contains(&1));
        assert!(queue.contains(&2));
    }

    #[test]
    fn clear_resets_and_releases_items() {
        let tracked = Rc::new(());
        let mut queue = RingQueue::new(NonZero::new(3).unwrap());

        queue.enqueue(Rc::clone(&tracked)).unwrap();
        queue.enqueue(Rc::clone(&tracked)).unwrap();
        assert_eq!(Rc::strong_count(&tracked), 3);

        queue.clear();

        assert_eq!(Rc::strong_count(&tracked), 1);
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 3);
    }

    #[test]
    fn dequeue_releases_slot_reference() {
        let tracked = Rc::new(());
        let mut queue = RingQueue::new(NonZero::new(2).unwrap());

        queue.enqueue(Rc::clone(&tracked)).unwrap();
        drop(queue.dequeue().unwrap());

        assert_eq!(Rc::strong_count(&tracked), 1);
    }

    #[test]
    fn grow_linearizes_wrapped_contents() {
        let mut queue = queue_of(3);
        queue.enqueue(0).unwrap();
        queue.enqueue(1).unwrap();
        queue.dequeue().unwrap();
        queue.enqueue(2).unwrap();
        queue.enqueue(3).unwrap();
        assert!(queue.is_full());

        queue.grow(NonZero::new(5).unwrap());

        assert_eq!(queue.capacity(), 5);
        assert_eq!(contents(&queue), vec![1, 2, 3]);

        queue.enqueue(4).unwrap();
        queue.enqueue(5).unwrap();
        assert_eq!(contents(&queue), vec![1, 2, 3, 4, 5]);
        assert_eq!(queue.dequeue().unwrap(), 1);
    }

    #[test]
    fn grow_to_same_capacity_when_full_wraps_tail() {
        let mut queue = queue_of(2);
        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();

        queue.grow(NonZero::new(2).unwrap());

        assert_eq!(contents(&queue), vec![1, 2]);
        assert_eq!(queue.enqueue(3), Err(Error::CapacityExceeded { capacity: 2 }));
        assert_eq!(queue.dequeue().unwrap(), 1);
        queue.enqueue(3).unwrap();
        assert_eq!(contents(&queue), vec![2, 3]);
    }

    #[test]
    #[should_panic]
    fn grow_cannot_shrink() {
        let mut queue = queue_of(4);

        queue.grow(NonZero::new(2).unwrap());
    }

    #[test]
    fn iter_reports_exact_size() {
        let mut queue = queue_of(3);
        queue.enqueue(1).unwrap();
        queue.enqueue(2).unwrap();

        let mut iter = queue.iter();
        assert_eq!(iter.len(), 2);
        iter.next();
        assert_eq!(iter.len(), 1);
        iter.next();
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);

        let via_into_iter: Vec<u32> = (&queue).into_iter().copied().collect();
        assert_eq!(via_into_iter, vec![1, 2]);
    }

    #[test]
    fn random_removal_preserves_order_of_remaining_items() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..200 {
            let capacity = rng.random_range(1..=12_usize);
            let mut queue = queue_of(capacity);
            let mut model = Vec::new();

            // Rotate the head to a random offset so removals cross the wrap point.
            let rotation = rng.random_range(0..capacity);
            for _ in 0..rotation {
                queue.enqueue(u32::MAX).unwrap();
                queue.dequeue().unwrap();
            }

            let fill = rng.random_range(1..=capacity);
            for value in 0..fill {
                let value = u32::try_from(value).unwrap();
                queue.enqueue(value).unwrap();
                model.push(value);
            }

            let index = rng.random_range(0..fill);
            let removed = if rng.random_bool(0.5) {
                queue.dequeue_at(index).unwrap()
            } else {
                let target = model[index];
                assert!(queue.try_remove(&target));
                target
            };

            assert_eq!(removed, model.remove(index));
            assert_eq!(contents(&queue), model);
            assert_eq!(queue.len(), model.len());

            // The queue must keep behaving as a FIFO after compaction.
            while queue.len() < capacity {
                queue.enqueue(1000).unwrap();
                model.push(1000);
            }
            for expected in model {
                assert_eq!(queue.dequeue().unwrap(), expected);
            }
        }
    }
}
