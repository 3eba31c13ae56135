use thiserror::Error;

/// Errors that can occur when building pools or moving instances in and out of them.
///
/// [`Error::InvalidPrototype`] and [`Error::PoolExhausted`] are the conditions a caller is
/// expected to handle. The ring queue variants signal misuse of a [`RingQueue`][crate::RingQueue]
/// and are propagated unchanged if a pool ever encounters them.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The host rejected the prototype, so no instances can ever be created from it.
    #[error("the host does not accept the prototype as a template for new instances")]
    InvalidPrototype,

    /// Every instance of the pool is checked out and the pool is not allowed to create more.
    ///
    /// The caller may retry after releasing an instance, pre-size the pool or enable
    /// auto-expansion.
    #[error(
        "pool exhausted: all {created} instances are checked out and auto-expansion is disabled"
    )]
    PoolExhausted {
        /// How many instances the pool had created when the request was rejected.
        created: usize,
    },

    /// An item was added to a ring queue that was already full.
    #[error("ring queue capacity of {capacity} items exceeded")]
    CapacityExceeded {
        /// The fixed capacity of the queue.
        capacity: usize,
    },

    /// An item was requested from an empty ring queue.
    #[error("ring queue is empty")]
    Empty,

    /// A logical index outside `[0, len)` was used to address a ring queue.
    #[error("index {index} is out of range for a ring queue holding {len} items")]
    IndexOutOfRange {
        /// The index that was requested.
        index: usize,

        /// The number of items in the queue at the time of the request.
        len: usize,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug, Copy);

    #[test]
    fn pool_exhausted_mentions_created_count() {
        let message = Error::PoolExhausted { created: 3 }.to_string();

        assert!(message.contains('3'));
        assert!(message.contains("auto-expansion"));
    }

    #[test]
    fn index_out_of_range_mentions_index_and_len() {
        let message = Error::IndexOutOfRange { index: 7, len: 2 }.to_string();

        assert_eq!(
            message,
            "index 7 is out of range for a ring queue holding 2 items"
        );
    }
}
