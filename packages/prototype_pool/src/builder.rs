use std::any::type_name;
use std::fmt;

use crate::raw_pool::RawPool;
use crate::settings::PoolSettings;
use crate::{DropPolicy, Host, PoolRegistry, Result, SinglePool};

/// Builder for creating an instance of [`SinglePool`].
///
/// Obtained from [`SinglePool::builder()`]. Every setting has a default, so the shortest path
/// to a pool is `SinglePool::builder(host, prototype).build()`.
///
/// # Examples
///
/// ```
/// use prototype_pool::{DropPolicy, Host, SinglePool};
///
/// #[derive(Clone, Debug, Default)]
/// struct Counter(u32);
///
/// impl Host for Counter {
///     type Prototype = &'static str;
///     type Instance = u32;
///     type Placement = (i32, i32);
///
///     fn instantiate(&mut self, _prototype: &&'static str, _context: Option<&(i32, i32)>) -> u32 {
///         self.0 += 1;
///         self.0
///     }
///
///     fn destroy(&mut self, _instance: u32) {}
/// }
///
/// let pool = SinglePool::builder(Counter::default(), "arrow")
///     .initial_capacity(16)
///     .pre_warm(4)
///     .auto_expand(false)
///     .home_placement((0, -100))
///     .drop_policy(DropPolicy::MayDropItems)
///     .build()?;
///
/// assert_eq!(pool.available(), 4);
/// assert_eq!(pool.capacity(), 16);
/// # Ok::<(), prototype_pool::Error>(())
/// ```
#[must_use]
pub struct SinglePoolBuilder<H: Host> {
    host: H,
    prototype: H::Prototype,
    settings: PoolSettings<H::Placement>,
    registry: Option<PoolRegistry>,
}

impl<H: Host> SinglePoolBuilder<H> {
    pub(crate) fn new(host: H, prototype: H::Prototype) -> Self {
        Self {
            host,
            prototype,
            settings: PoolSettings::default(),
            registry: None,
        }
    }

    /// How many instances the pool can store before its storage has to grow.
    ///
    /// Zero is treated as one. If [`pre_warm()`][Self::pre_warm] asks for more instances, the
    /// storage is sized for those instead.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.settings.initial_capacity = capacity;
        self
    }

    /// How many instances to create and store while building the pool. Defaults to zero.
    pub fn pre_warm(mut self, count: usize) -> Self {
        self.settings.pre_warm = count;
        self
    }

    /// Whether the pool creates a new instance when it is asked for one while empty.
    ///
    /// Enabled by default. A pool without auto-expansion fails with
    /// [`Error::PoolExhausted`][crate::Error::PoolExhausted] instead.
    pub fn auto_expand(mut self, enabled: bool) -> Self {
        self.settings.auto_expand = enabled;
        self
    }

    /// The placement new instances are created at and released instances are returned to.
    pub fn home_placement(mut self, placement: H::Placement) -> Self {
        self.settings.home_placement = Some(placement);
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how to treat instances the
    /// pool still tracks when the last handle to the pool is dropped.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.settings.drop_policy = policy;
        self
    }

    /// Registers the pool with `registry` when it is built.
    ///
    /// A registered pool is torn down by [`PoolRegistry::teardown_all()`] and removes itself
    /// from the registry when disposed.
    pub fn registry(mut self, registry: &PoolRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Builds the pool, pre-warming it as configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPrototype`][crate::Error::InvalidPrototype] if the host rejects
    /// the prototype. No instance is created in that case.
    pub fn build(self) -> Result<SinglePool<H>> {
        let raw = RawPool::new(self.host, self.prototype, self.settings)?;

        Ok(SinglePool::from_raw(raw, self.registry.as_ref()))
    }
}

impl<H: Host> fmt::Debug for SinglePoolBuilder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinglePoolBuilder")
            .field("host", &format_args!("{}", type_name::<H>()))
            .field("initial_capacity", &self.settings.initial_capacity)
            .field("pre_warm", &self.settings.pre_warm)
            .field("auto_expand", &self.settings.auto_expand)
            .field("has_home_placement", &self.settings.home_placement.is_some())
            .field("drop_policy", &self.settings.drop_policy)
            .field("registered", &self.registry.is_some())
            .finish()
    }
}
