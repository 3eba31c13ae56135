use std::fmt;
use std::ops::Deref;

use tracing::warn;

use crate::{Host, Result, SinglePool};

/// An instance that knows which pool it came from and goes back there when dropped.
///
/// Obtained from [`SinglePool::lease()`] or [`SinglePool::lease_with()`]. The lease keeps the
/// pool alive. Call [`release()`][Self::release] to return the instance early and see the
/// outcome, or [`detach()`][Self::detach] to keep the instance checked out and release it
/// through the pool later.
///
/// # Example
///
/// ```rust
/// use prototype_pool::{Host, SinglePool};
///
/// #[derive(Clone, Debug, Default)]
/// struct Counter(u32);
///
/// impl Host for Counter {
///     type Prototype = &'static str;
///     type Instance = u32;
///     type Placement = ();
///
///     fn instantiate(&mut self, _prototype: &&'static str, _context: Option<&()>) -> u32 {
///         self.0 += 1;
///         self.0
///     }
///
///     fn destroy(&mut self, _instance: u32) {}
/// }
///
/// let pool = SinglePool::builder(Counter::default(), "flare").build()?;
///
/// {
///     let flare = pool.lease()?;
///     assert_eq!(*flare, 1);
///     assert_eq!(pool.checked_out(), 1);
/// }
///
/// // The flare returned itself to the pool.
/// assert_eq!(pool.available(), 1);
/// # Ok::<(), prototype_pool::Error>(())
/// ```
pub struct Lease<H: Host> {
    pool: SinglePool<H>,

    // Always `Some` until the lease is consumed or dropped.
    instance: Option<H::Instance>,
}

impl<H: Host> Lease<H> {
    pub(crate) fn new(pool: SinglePool<H>, instance: H::Instance) -> Self {
        Self {
            pool,
            instance: Some(instance),
        }
    }

    /// The leased instance.
    #[must_use]
    pub fn instance(&self) -> &H::Instance {
        self.instance
            .as_ref()
            .expect("lease holds its instance until consumed")
    }

    /// The pool the instance will return to.
    #[must_use]
    pub fn pool(&self) -> &SinglePool<H> {
        &self.pool
    }

    /// Returns the instance to its pool now.
    ///
    /// Returns `Ok(false)` if the pool no longer tracks the instance, for example because the
    /// pool was cleared while the lease was held.
    ///
    /// # Errors
    ///
    /// Only fails if the pool's storage is corrupted, which indicates a bug in this crate.
    pub fn release(mut self) -> Result<bool> {
        let instance = self.take();

        self.pool.release(instance)
    }

    /// Ends the lease without returning the instance, which stays checked out of the pool.
    #[must_use]
    pub fn detach(mut self) -> H::Instance {
        self.take()
    }

    fn take(&mut self) -> H::Instance {
        self.instance
            .take()
            .expect("lease holds its instance until consumed")
    }
}

impl<H: Host> Deref for Lease<H> {
    type Target = H::Instance;

    fn deref(&self) -> &Self::Target {
        self.instance()
    }
}

impl<H: Host> fmt::Debug for Lease<H>
where
    H::Instance: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Drop for Lease<H> {
    fn drop(&mut self) {
        // Already returned or detached.
        let Some(instance) = self.instance.take() else {
            return;
        };

        if let Err(error) = self.pool.release(instance) {
            warn!(%error, "failed to return a leased instance to its pool");
        }
    }
}
