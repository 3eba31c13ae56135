use std::any::type_name;
use std::num::NonZero;
use std::{fmt, mem, thread};

use foldhash::{HashSet, HashSetExt};
use tracing::{debug, trace};

use crate::settings::PoolSettings;
use crate::{Acquired, DropPolicy, Error, Host, Origin, Result, RingQueue};

/// The single-prototype pool algorithm, without any shared ownership or registration.
///
/// Every instance the pool has created is in exactly one of two states:
///
/// * available - stored in `available` and mirrored in `pooled`.
/// * checked out - held by a caller and listed in `checked_out`.
///
/// `ever_created` lists every instance in either state and is the source of truth for teardown.
pub(crate) struct RawPool<H: Host> {
    host: H,
    prototype: H::Prototype,

    /// Available instances in the order they will be handed out.
    available: RingQueue<H::Instance>,

    /// Exactly the instances in `available`, for O(1) detection of repeated releases.
    pooled: HashSet<H::Instance>,

    /// Instances currently held by callers. Releasing anything not in here is ignored.
    checked_out: HashSet<H::Instance>,

    /// Every instance created since the last clear, in creation order.
    ever_created: Vec<H::Instance>,

    auto_expand: bool,

    /// Placement passed to the host when creating instances and re-applied on release.
    home_placement: Option<H::Placement>,

    drop_policy: DropPolicy,
}

impl<H: Host> RawPool<H> {
    /// Creates a pool for `prototype`, pre-warming it as configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrototype`] if the host rejects the prototype.
    pub(crate) fn new(
        host: H,
        prototype: H::Prototype,
        settings: PoolSettings<H::Placement>,
    ) -> Result<Self> {
        if !host.is_valid_prototype(&prototype) {
            return Err(Error::InvalidPrototype);
        }

        let capacity = NonZero::new(settings.initial_capacity.max(settings.pre_warm))
            .unwrap_or(NonZero::<usize>::MIN);

        let mut pool = Self {
            host,
            prototype,
            available: RingQueue::new(capacity),
            pooled: HashSet::with_capacity(capacity.get()),
            checked_out: HashSet::new(),
            ever_created: Vec::with_capacity(capacity.get()),
            auto_expand: settings.auto_expand,
            home_placement: settings.home_placement,
            drop_policy: settings.drop_policy,
        };

        for _ in 0..settings.pre_warm {
            let instance = pool.create_instance();
            pool.store(instance)?;
        }

        debug!(
            host = type_name::<H>(),
            capacity = capacity.get(),
            pre_warm = settings.pre_warm,
            auto_expand = pool.auto_expand,
            "created pool"
        );

        #[cfg(debug_assertions)]
        pool.integrity_check();

        Ok(pool)
    }

    /// Hands out an available instance, creating one if the pool is empty and may expand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if no instance is available and auto-expansion is off.
    pub(crate) fn acquire(
        &mut self,
        placement: Option<&H::Placement>,
    ) -> Result<Acquired<H::Instance>> {
        let acquired = if self.available.is_empty() {
            if !self.auto_expand {
                return Err(Error::PoolExhausted {
                    created: self.ever_created.len(),
                });
            }

            let instance = self.create_instance();

            debug!(
                created = self.ever_created.len(),
                "pool was empty, created a new instance"
            );

            Acquired::new(instance, Origin::Created)
        } else {
            let instance = self.available.dequeue()?;
            self.pooled.remove(&instance);

            Acquired::new(instance, Origin::Reused)
        };

        let instance = acquired.instance();
        self.checked_out.insert(instance.clone());

        self.host.set_active(instance, true);

        if let Some(placement) = placement {
            self.host.apply_placement(instance, placement);
        }

        trace!(
            origin = ?acquired.origin(),
            available = self.available.len(),
            "acquired instance"
        );

        #[cfg(debug_assertions)]
        self.integrity_check();

        Ok(acquired)
    }

    /// Returns a checked out instance to storage.
    ///
    /// Returns `false` without touching the instance if it is already stored in the pool or was
    /// never handed out by this pool.
    pub(crate) fn release(&mut self, instance: H::Instance) -> Result<bool> {
        if self.pooled.contains(&instance) {
            trace!("ignored release of an instance that is already in the pool");
            return Ok(false);
        }

        if !self.checked_out.remove(&instance) {
            trace!("ignored release of an instance that is not checked out of this pool");
            return Ok(false);
        }

        self.host.set_active(&instance, false);

        if let Some(home) = &self.home_placement {
            self.host.apply_placement(&instance, home);
        }

        self.store(instance)?;

        trace!(available = self.available.len(), "released instance");

        #[cfg(debug_assertions)]
        self.integrity_check();

        Ok(true)
    }

    /// Destroys every instance the pool has created, whether available or checked out.
    ///
    /// The pool stays usable: the next acquire creates fresh instances.
    pub(crate) fn clear(&mut self) {
        self.available.clear();
        self.pooled.clear();
        self.checked_out.clear();

        let instances = mem::take(&mut self.ever_created);
        let destroyed = instances.len();

        for instance in instances {
            self.host.destroy(instance);
        }

        debug!(destroyed, "cleared pool");
    }

    #[must_use]
    pub(crate) fn prototype(&self) -> &H::Prototype {
        &self.prototype
    }

    #[must_use]
    pub(crate) fn available(&self) -> usize {
        self.available.len()
    }

    #[must_use]
    pub(crate) fn checked_out(&self) -> usize {
        self.checked_out.len()
    }

    #[must_use]
    pub(crate) fn created(&self) -> usize {
        self.ever_created.len()
    }

    #[must_use]
    pub(crate) fn created_instances(&self) -> &[H::Instance] {
        &self.ever_created
    }

    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.available.capacity()
    }

    #[must_use]
    pub(crate) fn auto_expand(&self) -> bool {
        self.auto_expand
    }

    #[must_use]
    pub(crate) fn is_pooled(&self, instance: &H::Instance) -> bool {
        self.pooled.contains(instance)
    }

    #[must_use]
    pub(crate) fn is_checked_out(&self, instance: &H::Instance) -> bool {
        self.checked_out.contains(instance)
    }

    /// Available instances in the order they will be handed out.
    pub(crate) fn available_instances(&self) -> impl Iterator<Item = &H::Instance> {
        self.available.iter()
    }

    fn create_instance(&mut self) -> H::Instance {
        let instance = self
            .host
            .instantiate(&self.prototype, self.home_placement.as_ref());

        self.host.set_active(&instance, false);
        self.ever_created.push(instance.clone());

        instance
    }

    /// Puts an instance into storage, growing the storage if auto-expansion has created more
    /// instances than it was sized for.
    fn store(&mut self, instance: H::Instance) -> Result<()> {
        if self.available.is_full() {
            let grown = self
                .available
                .capacity()
                .checked_mul(2)
                .and_then(NonZero::new)
                .expect("pool storage cannot outgrow virtual memory");

            trace!(capacity = grown.get(), "growing pool storage");

            self.available.grow(grown);
        }

        self.available.enqueue(instance.clone())?;
        self.pooled.insert(instance);

        Ok(())
    }

    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    #[cfg(debug_assertions)]
    pub(crate) fn integrity_check(&self) {
        assert_eq!(
            self.pooled.len(),
            self.available.len(),
            "membership set and storage disagree on the number of available instances"
        );

        for instance in &self.available {
            assert!(
                self.pooled.contains(instance),
                "stored instance is missing from the membership set"
            );
            assert!(
                !self.checked_out.contains(instance),
                "stored instance is also marked as checked out"
            );
        }

        assert_eq!(
            self.pooled
                .len()
                .checked_add(self.checked_out.len())
                .expect("instance counts cannot overflow"),
            self.ever_created.len(),
            "every created instance must be either available or checked out"
        );
    }
}

impl<H: Host> fmt::Debug for RawPool<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawPool")
            .field("host", &format_args!("{}", type_name::<H>()))
            .field("available", &self.available.len())
            .field("checked_out", &self.checked_out.len())
            .field("created", &self.ever_created.len())
            .field("capacity", &self.available.capacity())
            .field("auto_expand", &self.auto_expand)
            .field("drop_policy", &self.drop_policy)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Drop for RawPool<H> {
    fn drop(&mut self) {
        if self.ever_created.is_empty() {
            return;
        }

        match self.drop_policy {
            DropPolicy::MayDropItems => self.clear(),
            DropPolicy::MustNotDropItems => {
                // If we are already panicking, a second panic would abort and hide the first.
                if thread::panicking() {
                    return;
                }

                panic!(
                    "dropped a pool that still tracks {} instances, which is forbidden by DropPolicy::MustNotDropItems",
                    self.ever_created.len()
                );
            }
        }
    }
}
