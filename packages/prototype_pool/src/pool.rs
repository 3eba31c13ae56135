use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::raw_pool::RawPool;
use crate::registry::{Member, Memberships, Sealed};
use crate::{
    Acquired, DisposablePool, Host, Lease, PoolRegistry, RegistryEntry, Result, SinglePoolBuilder,
};

/// A pool of reusable instances of one prototype.
///
/// The pool hands out instances with [`acquire()`][1] and takes them back with [`release()`][2].
/// Released instances are deactivated and stored; the next acquire hands out the instance that
/// has been waiting longest. When no instance is waiting, the pool either constructs a new one
/// through its [`Host`] (auto-expansion, the default) or fails with
/// [`Error::PoolExhausted`][crate::Error::PoolExhausted].
///
/// Releasing an instance that is already stored, or that did not come from this pool, is a
/// no-op. The same instance is therefore never handed out twice at the same time.
///
/// # Single-threaded design
///
/// This type is a cloneable handle to shared pool state and is neither [`Send`] nor [`Sync`].
/// Clones refer to the same pool. Host callbacks run while the pool is borrowed, so a host must
/// not call back into the same pool.
///
/// # Example
///
/// ```rust
/// use prototype_pool::{Host, Origin, SinglePool};
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
/// let pool = SinglePool::builder(Counter::default(), "bullet")
///     .initial_capacity(2)
///     .pre_warm(2)
///     .build()?;
///
/// let first = pool.acquire()?;
/// let second = pool.acquire()?;
/// assert_eq!(pool.available(), 0);
///
/// assert!(pool.release(first)?);
/// assert_eq!(pool.available(), 1);
///
/// // The released instance is the one handed out next.
/// let third = pool.acquire_tracked(None)?;
/// assert_eq!(*third.instance(), first);
/// assert_eq!(third.origin(), Origin::Reused);
/// # pool.release(second)?;
/// # Ok::<(), prototype_pool::Error>(())
/// ```
///
/// [1]: Self::acquire
/// [2]: Self::release
pub struct SinglePool<H: Host> {
    shared: Rc<PoolShared<H>>,
}

/// State shared by every clone of a [`SinglePool`] handle.
struct PoolShared<H: Host> {
    raw: RefCell<RawPool<H>>,
    memberships: Memberships,
}

impl<H: Host> SinglePool<H> {
    /// Starts building a pool that creates instances of `prototype` through `host`.
    pub fn builder(host: H, prototype: H::Prototype) -> SinglePoolBuilder<H> {
        SinglePoolBuilder::new(host, prototype)
    }

    pub(crate) fn from_raw(raw: RawPool<H>, registry: Option<&PoolRegistry>) -> Self {
        let pool = Self {
            shared: Rc::new(PoolShared {
                raw: RefCell::new(raw),
                memberships: Memberships::default(),
            }),
        };

        if let Some(registry) = registry {
            registry.register(&pool);
        }

        pool
    }

    /// Hands out an instance and activates it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`][crate::Error::PoolExhausted] if no instance is available
    /// and auto-expansion is disabled.
    pub fn acquire(&self) -> Result<H::Instance> {
        self.acquire_tracked(None).map(Acquired::into_instance)
    }

    /// Hands out an instance, activates it and applies `placement` to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`][crate::Error::PoolExhausted] if no instance is available
    /// and auto-expansion is disabled.
    pub fn acquire_with(&self, placement: &H::Placement) -> Result<H::Instance> {
        self.acquire_tracked(Some(placement))
            .map(Acquired::into_instance)
    }

    /// Hands out an instance and reports whether it was reused or newly created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`][crate::Error::PoolExhausted] if no instance is available
    /// and auto-expansion is disabled.
    pub fn acquire_tracked(
        &self,
        placement: Option<&H::Placement>,
    ) -> Result<Acquired<H::Instance>> {
        self.shared.raw.borrow_mut().acquire(placement)
    }

    /// Hands out an instance wrapped in a [`Lease`], which returns it to this pool when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`][crate::Error::PoolExhausted] if no instance is available
    /// and auto-expansion is disabled.
    pub fn lease(&self) -> Result<Lease<H>> {
        let instance = self.acquire()?;

        Ok(Lease::new(self.clone(), instance))
    }

    /// Like [`lease()`][Self::lease] but also applies `placement` to the instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`][crate::Error::PoolExhausted] if no instance is available
    /// and auto-expansion is disabled.
    pub fn lease_with(&self, placement: &H::Placement) -> Result<Lease<H>> {
        let instance = self.acquire_with(placement)?;

        Ok(Lease::new(self.clone(), instance))
    }

    /// Deactivates `instance` and stores it for reuse.
    ///
    /// Returns `Ok(false)` and does nothing if the instance is already stored in this pool or is
    /// not checked out of it.
    ///
    /// # Errors
    ///
    /// Only fails if the pool's storage is corrupted, which indicates a bug in this crate.
    pub fn release(&self, instance: H::Instance) -> Result<bool> {
        self.shared.raw.borrow_mut().release(instance)
    }

    /// Like [`release()`][Self::release] but accepts an absent instance, which is ignored.
    ///
    /// # Errors
    ///
    /// Only fails if the pool's storage is corrupted, which indicates a bug in this crate.
    pub fn release_opt(&self, instance: Option<H::Instance>) -> Result<bool> {
        match instance {
            Some(instance) => self.release(instance),
            None => Ok(false),
        }
    }

    /// Destroys every instance the pool has ever created, including checked out ones.
    ///
    /// The pool remains usable with the same configuration; later acquires create fresh
    /// instances if auto-expansion is enabled.
    pub fn clear(&self) {
        self.shared.raw.borrow_mut().clear();
    }

    /// Clears the pool and removes it from every registry it is registered with.
    pub fn dispose(&self) {
        self.dispose_without_deregistering();
        self.shared.memberships.leave_all(self);
    }

    /// Clears the pool without touching its registries.
    ///
    /// This is what [`PoolRegistry::teardown_all()`] does to every registered pool.
    pub fn dispose_without_deregistering(&self) {
        self.shared.teardown();
    }

    /// The number of instances waiting in the pool.
    #[must_use]
    pub fn available(&self) -> usize {
        self.shared.raw.borrow().available()
    }

    /// The number of instances currently held by callers.
    #[must_use]
    pub fn checked_out(&self) -> usize {
        self.shared.raw.borrow().checked_out()
    }

    /// The number of live instances the pool has created since it was built or last cleared.
    #[must_use]
    pub fn created(&self) -> usize {
        self.shared.raw.borrow().created()
    }

    /// Every live instance the pool has created, in creation order.
    #[must_use]
    pub fn created_instances(&self) -> Vec<H::Instance> {
        self.shared.raw.borrow().created_instances().to_vec()
    }

    /// How many instances the pool can store before its storage has to grow.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.raw.borrow().capacity()
    }

    /// Whether the pool constructs new instances when it runs out.
    #[must_use]
    pub fn auto_expand(&self) -> bool {
        self.shared.raw.borrow().auto_expand()
    }

    /// Whether `instance` is waiting in the pool.
    #[must_use]
    pub fn is_pooled(&self, instance: &H::Instance) -> bool {
        self.shared.raw.borrow().is_pooled(instance)
    }

    /// Whether `instance` came from this pool and has not been released yet.
    #[must_use]
    pub fn is_checked_out(&self, instance: &H::Instance) -> bool {
        self.shared.raw.borrow().is_checked_out(instance)
    }

    /// The prototype this pool creates instances from.
    #[must_use]
    pub fn prototype(&self) -> H::Prototype
    where
        H::Prototype: Clone,
    {
        self.shared.raw.borrow().prototype().clone()
    }
}

impl<H: Host> Clone for SinglePool<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<H: Host> fmt::Debug for SinglePool<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinglePool")
            .field("raw", &self.shared.raw)
            .field("registries", &self.shared.memberships.count())
            .finish()
    }
}

impl<H: Host> Sealed for SinglePool<H> {}

impl<H: Host> DisposablePool for SinglePool<H> {
    fn dispose(&self) {
        Self::dispose(self);
    }

    fn dispose_without_deregistering(&self) {
        Self::dispose_without_deregistering(self);
    }

    fn registry_entry(&self) -> RegistryEntry {
        let weak: Weak<PoolShared<H>> = Rc::downgrade(&self.shared);
        RegistryEntry::new(weak)
    }
}

impl<H: Host> Member for PoolShared<H> {
    fn teardown(&self) {
        self.raw.borrow_mut().clear();
    }

    fn joined(&self, registry: &PoolRegistry) {
        self.memberships.joined(registry);
    }

    fn left(&self, registry: &PoolRegistry) {
        self.memberships.left(registry);
    }
}
