use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};

use tracing::debug;

pub(crate) use sealed::Sealed;

mod sealed {
    /// Restricts [`DisposablePool`][super::DisposablePool] to the pool types of this crate.
    pub trait Sealed {}
}

/// The shared state of a registrable pool, reachable from a registry without knowing the
/// concrete host type.
pub(crate) trait Member {
    /// Destroys every instance tracked by the pool without touching any registry.
    ///
    /// This is the single teardown path, used both by registries and by the pool's own
    /// `dispose_without_deregistering()`.
    fn teardown(&self);

    /// Records that the pool is now registered with `registry`.
    fn joined(&self, registry: &PoolRegistry);

    /// Records that the pool is no longer registered with `registry`.
    fn left(&self, registry: &PoolRegistry);
}

/// Registries a pool is a member of. Embedded in the shared state of every pool type.
#[derive(Debug, Default)]
pub(crate) struct Memberships {
    registries: RefCell<Vec<PoolRegistry>>,
}

impl Memberships {
    pub(crate) fn joined(&self, registry: &PoolRegistry) {
        let mut registries = self.registries.borrow_mut();

        if !registries.iter().any(|existing| existing.is_same(registry)) {
            registries.push(registry.clone());
        }
    }

    pub(crate) fn left(&self, registry: &PoolRegistry) {
        self.registries
            .borrow_mut()
            .retain(|existing| !existing.is_same(registry));
    }

    /// Removes the pool from every registry it is a member of.
    pub(crate) fn leave_all(&self, pool: &impl DisposablePool) {
        // Taken out first because deregistering calls back into `left()`.
        let registries = mem::take(&mut *self.registries.borrow_mut());

        for registry in registries {
            registry.deregister(pool);
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.registries.borrow().len()
    }
}

/// An opaque identity of a registrable pool, produced by [`DisposablePool::registry_entry()`].
///
/// The entry refers to the pool weakly: it does not keep the pool alive.
pub struct RegistryEntry {
    target: Weak<dyn Member>,
}

impl RegistryEntry {
    pub(crate) fn new(target: Weak<dyn Member>) -> Self {
        Self { target }
    }

    fn refers_to(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.target, &other.target)
    }

    fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

/// A pool whose instances can be torn down in bulk.
///
/// Implemented by [`SinglePool`][crate::SinglePool] and [`PoolGroup`][crate::PoolGroup] so that
/// both can be registered with a [`PoolRegistry`]. This trait is sealed.
pub trait DisposablePool: Sealed {
    /// Destroys every instance tracked by the pool and removes the pool from every registry it
    /// is registered with.
    fn dispose(&self);

    /// Destroys every instance tracked by the pool but leaves registry membership alone.
    ///
    /// This is what a [`PoolRegistry`] does to each pool during
    /// [`teardown_all()`][PoolRegistry::teardown_all].
    fn dispose_without_deregistering(&self);

    /// The identity under which this pool is registered.
    fn registry_entry(&self) -> RegistryEntry;
}

/// Coordinates the teardown of every pool in an application during a single shutdown event.
///
/// The registry is an explicit object: create one with [`new()`][Self::new] and pass it to the
/// builders of the pools it should manage. Pools built with a registry register themselves and
/// deregister when they are disposed. The registry only refers to pools weakly; a pool that is
/// dropped simply disappears from it.
///
/// The type is a cloneable handle; all clones refer to the same set of pools.
///
/// # Example
///
/// ```rust
/// use prototype_pool::{Host, PoolRegistry, SinglePool};
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
/// let registry = PoolRegistry::new();
///
/// let sparks = SinglePool::builder(Counter::default(), "spark")
///     .pre_warm(4)
///     .registry(&registry)
///     .build()?;
/// let smoke = SinglePool::builder(Counter::default(), "smoke")
///     .registry(&registry)
///     .build()?;
///
/// assert_eq!(registry.len(), 2);
///
/// // Shutdown: every registered pool destroys its instances.
/// assert_eq!(registry.teardown_all(), 2);
///
/// assert!(registry.is_empty());
/// assert_eq!(sparks.created(), 0);
/// assert_eq!(smoke.created(), 0);
/// # Ok::<(), prototype_pool::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct PoolRegistry {
    active: Rc<RefCell<Vec<RegistryEntry>>>,
}

impl PoolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `pool` to the set of pools torn down by [`teardown_all()`][Self::teardown_all].
    ///
    /// The pool remembers the registry, so disposing the pool later removes it from here again.
    /// Returns `false` if the pool was already registered, in which case nothing changes.
    pub fn register(&self, pool: &impl DisposablePool) -> bool {
        let entry = pool.registry_entry();

        {
            let mut active = self.active.borrow_mut();

            active.retain(RegistryEntry::is_live);

            if active.iter().any(|existing| existing.refers_to(&entry)) {
                return false;
            }

            active.push(RegistryEntry::new(Weak::clone(&entry.target)));
        }

        if let Some(member) = entry.target.upgrade() {
            member.joined(self);
        }

        true
    }

    /// Removes `pool` from the registry.
    ///
    /// Returns `false` if the pool was not registered.
    pub fn deregister(&self, pool: &impl DisposablePool) -> bool {
        let entry = pool.registry_entry();
        let mut removed = false;

        self.active.borrow_mut().retain(|existing| {
            if existing.refers_to(&entry) {
                removed = true;
                return false;
            }

            existing.is_live()
        });

        if !removed {
            return false;
        }

        if let Some(member) = entry.target.upgrade() {
            member.left(self);
        }

        true
    }

    /// Whether `pool` is currently registered.
    #[must_use]
    pub fn is_registered(&self, pool: &impl DisposablePool) -> bool {
        let entry = pool.registry_entry();

        self.active
            .borrow()
            .iter()
            .any(|existing| existing.refers_to(&entry))
    }

    /// The number of registered pools that are still alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active
            .borrow()
            .iter()
            .filter(|entry| entry.is_live())
            .count()
    }

    /// Whether no live pools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` is a handle to the same registry.
    pub(crate) fn is_same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.active, &other.active)
    }

    /// Destroys the instances of every registered pool and empties the registry.
    ///
    /// The set of pools is taken out of the registry in one step before any pool is touched.
    /// Each pool is then torn down exactly as by its
    /// [`dispose_without_deregistering()`][DisposablePool::dispose_without_deregistering]. The
    /// pools remain usable afterwards but are no longer registered here.
    ///
    /// Returns the number of pools that were torn down.
    pub fn teardown_all(&self) -> usize {
        let active = mem::take(&mut *self.active.borrow_mut());

        let mut torn_down: usize = 0;

        for pool in active.iter().filter_map(|entry| entry.target.upgrade()) {
            pool.left(self);
            pool.teardown();
            // Cannot overflow because we cannot have more pools than fit in memory.
            torn_down = torn_down.wrapping_add(1);
        }

        debug!(pools = torn_down, "tore down all registered pools");

        torn_down
    }
}

impl fmt::Debug for PoolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("len", &self.len())
            .finish()
    }
}
