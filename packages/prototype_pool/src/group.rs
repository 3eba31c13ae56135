use std::any::type_name;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use foldhash::{HashMap, HashMapExt};
use tracing::{debug, trace};

use crate::raw_pool::RawPool;
use crate::registry::{Member, Memberships, Sealed};
use crate::settings::PoolSettings;
use crate::{
    Acquired, DisposablePool, Host, PoolGroupBuilder, PoolRegistry, RegistryEntry, Result,
};

/// A set of pools keyed by prototype, with a reverse index from checked out instances to the
/// prototype they came from.
///
/// The first acquire for a prototype lazily creates a pool for it, configured from the group's
/// builder settings and served by a clone of the group's host. Callers never track where an
/// instance came from: [`release()`][1] finds the owning pool through the reverse index.
///
/// The reverse index holds one entry per checked out instance. Releasing an instance the group
/// does not know about, or releasing the same instance twice, returns `false` and does nothing.
///
/// Like [`SinglePool`][crate::SinglePool], this type is a cloneable single-threaded handle.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use prototype_pool::{Host, PoolGroup};
///
/// // Every pool gets its own clone of the host, so the counter is shared between clones.
/// #[derive(Clone, Debug, Default)]
/// struct Counter(Rc<Cell<u32>>);
///
/// impl Host for Counter {
///     type Prototype = &'static str;
///     type Instance = u32;
///     type Placement = ();
///
///     fn instantiate(&mut self, _prototype: &&'static str, _context: Option<&()>) -> u32 {
///         self.0.set(self.0.get() + 1);
///         self.0.get()
///     }
///
///     fn destroy(&mut self, _instance: u32) {}
/// }
///
/// let group = PoolGroup::builder(Counter::default()).build();
///
/// let goblin = group.acquire(&"goblin")?;
/// assert_eq!(group.owner_of(&goblin), Some("goblin"));
///
/// assert!(group.release(goblin)?);
/// assert!(!group.release(goblin)?);
/// assert_eq!(group.available_for(&"goblin"), 1);
/// # Ok::<(), prototype_pool::Error>(())
/// ```
///
/// [1]: Self::release
pub struct PoolGroup<H: Host> {
    shared: Rc<GroupShared<H>>,
}

/// State shared by every clone of a [`PoolGroup`] handle.
struct GroupShared<H: Host> {
    core: RefCell<GroupCore<H>>,
    memberships: Memberships,
}

/// Pools and reverse index of a [`PoolGroup`].
pub(crate) struct GroupCore<H: Host> {
    /// Template cloned into every pool the group creates.
    host: H,

    /// Template for the configuration of every pool the group creates.
    settings: PoolSettings<H::Placement>,

    pools: HashMap<H::Prototype, RawPool<H>>,

    /// Prototype of every checked out instance.
    owners: HashMap<H::Instance, H::Prototype>,
}

impl<H: Host> GroupCore<H> {
    pub(crate) fn new(host: H, settings: PoolSettings<H::Placement>) -> Self {
        Self {
            host,
            settings,
            pools: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Destroys the instances of every pool but keeps the pools.
    fn clear(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }

        // Every instance the index referred to has just been destroyed.
        self.owners.clear();

        debug!(pools = self.pools.len(), "cleared pool group");
    }

    /// Destroys the instances of every pool and forgets the pools.
    fn dispose(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }

        let disposed = self.pools.len();

        self.pools.clear();
        self.owners.clear();

        debug!(pools = disposed, "disposed pool group");
    }
}

impl<H> GroupCore<H>
where
    H: Host + Clone,
    H::Prototype: Clone + Eq + Hash,
    H::Placement: Clone,
{
    fn pool_for(&mut self, prototype: &H::Prototype) -> Result<&mut RawPool<H>> {
        let existing = self.pools.len();

        match self.pools.entry(prototype.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let pool = RawPool::new(
                    self.host.clone(),
                    entry.key().clone(),
                    self.settings.clone(),
                )?;

                debug!(
                    host = type_name::<H>(),
                    pools = existing.wrapping_add(1),
                    "created pool for a new prototype"
                );

                Ok(entry.insert(pool))
            }
        }
    }

    fn acquire(
        &mut self,
        prototype: &H::Prototype,
        placement: Option<&H::Placement>,
    ) -> Result<Acquired<H::Instance>> {
        let acquired = self.pool_for(prototype)?.acquire(placement)?;

        self.owners
            .insert(acquired.instance().clone(), prototype.clone());

        Ok(acquired)
    }

    fn release(&mut self, instance: H::Instance) -> Result<bool> {
        let Some(prototype) = self.owners.remove(&instance) else {
            trace!("ignored release of an instance that is not checked out of this group");
            return Ok(false);
        };

        let pool = self
            .pools
            .get_mut(&prototype)
            .expect("the reverse index only refers to prototypes that have a pool");

        pool.release(instance)
    }

    fn release_all_for_key(&mut self, prototype: &H::Prototype) -> bool {
        let Some(mut pool) = self.pools.remove(prototype) else {
            return false;
        };

        let outstanding_before = self.owners.len();
        self.owners.retain(|_, owner| owner != prototype);
        let forgotten = outstanding_before.wrapping_sub(self.owners.len());

        pool.clear();

        debug!(
            forgotten,
            pools = self.pools.len(),
            "released every instance of one prototype and removed its pool"
        );

        true
    }
}

impl<H> PoolGroup<H>
where
    H: Host + Clone,
    H::Prototype: Clone + Eq + Hash,
    H::Placement: Clone,
{
    /// Starts building a group whose pools create instances through clones of `host`.
    pub fn builder(host: H) -> PoolGroupBuilder<H> {
        PoolGroupBuilder::new(host)
    }

    pub(crate) fn from_core(core: GroupCore<H>, registry: Option<&PoolRegistry>) -> Self {
        let group = Self {
            shared: Rc::new(GroupShared {
                core: RefCell::new(core),
                memberships: Memberships::default(),
            }),
        };

        if let Some(registry) = registry {
            registry.register(&group);
        }

        group
    }

    /// Hands out an instance of `prototype`, creating the pool for it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrototype`][crate::Error::InvalidPrototype] if there is no pool
    /// for `prototype` yet and the host rejects it. Returns
    /// [`Error::PoolExhausted`][crate::Error::PoolExhausted] if the pool for `prototype` is
    /// empty and auto-expansion is disabled.
    pub fn acquire(&self, prototype: &H::Prototype) -> Result<H::Instance> {
        self.acquire_tracked(prototype, None)
            .map(Acquired::into_instance)
    }

    /// Hands out an instance of `prototype` and applies `placement` to it.
    ///
    /// # Errors
    ///
    /// As for [`acquire()`][Self::acquire].
    pub fn acquire_with(
        &self,
        prototype: &H::Prototype,
        placement: &H::Placement,
    ) -> Result<H::Instance> {
        self.acquire_tracked(prototype, Some(placement))
            .map(Acquired::into_instance)
    }

    /// Hands out an instance of `prototype` and reports whether it was reused or newly created.
    ///
    /// # Errors
    ///
    /// As for [`acquire()`][Self::acquire].
    pub fn acquire_tracked(
        &self,
        prototype: &H::Prototype,
        placement: Option<&H::Placement>,
    ) -> Result<Acquired<H::Instance>> {
        self.shared.core.borrow_mut().acquire(prototype, placement)
    }

    /// Returns `instance` to the pool it came from.
    ///
    /// Returns `Ok(false)` and does nothing if the instance is not checked out of this group,
    /// which includes instances that were already released.
    ///
    /// # Errors
    ///
    /// Only fails if a pool's storage is corrupted, which indicates a bug in this crate.
    pub fn release(&self, instance: H::Instance) -> Result<bool> {
        self.shared.core.borrow_mut().release(instance)
    }

    /// Destroys the pool for `prototype` together with all of its instances, including checked
    /// out ones, and forgets every checked out instance of that prototype.
    ///
    /// Returns `false` if the group has no pool for `prototype`. A later acquire of the same
    /// prototype creates a fresh pool.
    pub fn release_all_for_key(&self, prototype: &H::Prototype) -> bool {
        self.shared.core.borrow_mut().release_all_for_key(prototype)
    }

    /// The prototype `instance` was acquired from, if it is checked out of this group.
    #[must_use]
    pub fn owner_of(&self, instance: &H::Instance) -> Option<H::Prototype> {
        self.shared.core.borrow().owners.get(instance).cloned()
    }

    /// Whether the group has a pool for `prototype`.
    #[must_use]
    pub fn contains_key(&self, prototype: &H::Prototype) -> bool {
        self.shared.core.borrow().pools.contains_key(prototype)
    }

    /// The number of instances of `prototype` waiting to be reused.
    #[must_use]
    pub fn available_for(&self, prototype: &H::Prototype) -> usize {
        self.shared
            .core
            .borrow()
            .pools
            .get(prototype)
            .map_or(0, RawPool::available)
    }

    /// The number of live instances of `prototype` the group has created.
    #[must_use]
    pub fn created_for(&self, prototype: &H::Prototype) -> usize {
        self.shared
            .core
            .borrow()
            .pools
            .get(prototype)
            .map_or(0, RawPool::created)
    }
}

impl<H: Host> PoolGroup<H> {
    /// Destroys the instances of every pool in the group.
    ///
    /// The pools stay in the group and remain usable. Checked out instances are destroyed too,
    /// so the reverse index is emptied.
    pub fn clear(&self) {
        self.shared.core.borrow_mut().clear();
    }

    /// Destroys every pool in the group and removes the group from every registry it is
    /// registered with.
    pub fn dispose(&self) {
        self.dispose_without_deregistering();
        self.shared.memberships.leave_all(self);
    }

    /// Destroys every pool in the group without touching its registries.
    ///
    /// This is what [`PoolRegistry::teardown_all()`] does to every registered group.
    pub fn dispose_without_deregistering(&self) {
        self.shared.teardown();
    }

    /// The number of prototypes the group currently has a pool for.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.shared.core.borrow().pools.len()
    }

    /// The number of instances currently held by callers, across every pool.
    #[must_use]
    pub fn checked_out(&self) -> usize {
        self.shared.core.borrow().owners.len()
    }
}

impl<H: Host> Clone for PoolGroup<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<H: Host> fmt::Debug for PoolGroup<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.core.borrow();

        f.debug_struct("PoolGroup")
            .field("host", &format_args!("{}", type_name::<H>()))
            .field("pools", &core.pools.len())
            .field("checked_out", &core.owners.len())
            .field("registries", &self.shared.memberships.count())
            .finish()
    }
}

impl<H: Host> Sealed for PoolGroup<H> {}

impl<H: Host> DisposablePool for PoolGroup<H> {
    fn dispose(&self) {
        Self::dispose(self);
    }

    fn dispose_without_deregistering(&self) {
        Self::dispose_without_deregistering(self);
    }

    fn registry_entry(&self) -> RegistryEntry {
        let weak: Weak<GroupShared<H>> = Rc::downgrade(&self.shared);
        RegistryEntry::new(weak)
    }
}

impl<H: Host> Member for GroupShared<H> {
    fn teardown(&self) {
        self.core.borrow_mut().dispose();
    }

    fn joined(&self, registry: &PoolRegistry) {
        self.memberships.joined(registry);
    }

    fn left(&self, registry: &PoolRegistry) {
        self.memberships.left(registry);
    }
}
