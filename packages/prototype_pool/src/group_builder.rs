use std::any::type_name;
use std::fmt;
use std::hash::Hash;

use crate::group::GroupCore;
use crate::settings::PoolSettings;
use crate::{DropPolicy, Host, PoolGroup, PoolRegistry};

/// Builder for creating an instance of [`PoolGroup`].
///
/// The settings apply to every pool the group creates. Pools are created lazily, one per
/// prototype, each with its own clone of the host. Clones of the host must therefore produce
/// instances that are distinct from those of every other clone.
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use prototype_pool::{Host, PoolGroup, PoolRegistry};
///
/// #[derive(Clone, Debug, Default)]
/// struct Counter(Rc<Cell<u32>>);
///
/// impl Host for Counter {
///     type Prototype = char;
///     type Instance = u32;
///     type Placement = ();
///
///     fn instantiate(&mut self, _prototype: &char, _context: Option<&()>) -> u32 {
///         self.0.set(self.0.get() + 1);
///         self.0.get()
///     }
///
///     fn destroy(&mut self, _instance: u32) {}
/// }
///
/// let registry = PoolRegistry::new();
///
/// let group = PoolGroup::builder(Counter::default())
///     .initial_capacity(4)
///     .pre_warm(2)
///     .registry(&registry)
///     .build();
///
/// group.acquire(&'x')?;
/// assert_eq!(group.available_for(&'x'), 1);
/// assert_eq!(registry.len(), 1);
/// # Ok::<(), prototype_pool::Error>(())
/// ```
#[must_use]
pub struct PoolGroupBuilder<H: Host> {
    host: H,
    settings: PoolSettings<H::Placement>,
    registry: Option<PoolRegistry>,
}

impl<H> PoolGroupBuilder<H>
where
    H: Host + Clone,
    H::Prototype: Clone + Eq + Hash,
    H::Placement: Clone,
{
    pub(crate) fn new(host: H) -> Self {
        Self {
            host,
            settings: PoolSettings::default(),
            registry: None,
        }
    }

    /// Initial storage capacity of each pool. Zero is treated as one.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.settings.initial_capacity = capacity;
        self
    }

    /// How many instances each pool creates up front when it is first needed.
    pub fn pre_warm(mut self, count: usize) -> Self {
        self.settings.pre_warm = count;
        self
    }

    /// Whether each pool creates new instances when it runs out. Enabled by default.
    pub fn auto_expand(mut self, enabled: bool) -> Self {
        self.settings.auto_expand = enabled;
        self
    }

    /// The placement new instances are created at and released instances are returned to.
    pub fn home_placement(mut self, placement: H::Placement) -> Self {
        self.settings.home_placement = Some(placement);
        self
    }

    /// Sets the [drop policy][DropPolicy] of each pool in the group.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.settings.drop_policy = policy;
        self
    }

    /// Registers the group with `registry` as a single unit when it is built.
    pub fn registry(mut self, registry: &PoolRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Builds the group. No pool exists until the first acquire.
    #[must_use]
    pub fn build(self) -> PoolGroup<H> {
        PoolGroup::from_core(GroupCore::new(self.host, self.settings), self.registry.as_ref())
    }
}

impl<H: Host> fmt::Debug for PoolGroupBuilder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolGroupBuilder")
            .field("host", &format_args!("{}", type_name::<H>()))
            .field("initial_capacity", &self.settings.initial_capacity)
            .field("pre_warm", &self.settings.pre_warm)
            .field("auto_expand", &self.settings.auto_expand)
            .field("drop_policy", &self.settings.drop_policy)
            .field("registered", &self.registry.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::test_host::FakeHost;

    #[test]
    fn capacity_applies_to_lazily_created_pools() {
        let group = PoolGroup::builder(FakeHost::default())
            .initial_capacity(1)
            .build();

        let first = group.acquire(&"a").unwrap();
        let second = group.acquire(&"a").unwrap();

        // Storage grows to hold both releases.
        assert!(group.release(first).unwrap());
        assert!(group.release(second).unwrap());
        assert_eq!(group.available_for(&"a"), 2);
    }

    #[test]
    #[should_panic]
    fn drop_policy_applies_to_every_pool() {
        let group = PoolGroup::builder(FakeHost::default())
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        group.acquire(&"a").unwrap();

        drop(group);
    }

    #[test]
    fn drop_policy_is_satisfied_after_dispose() {
        let group = PoolGroup::builder(FakeHost::default())
            .drop_policy(DropPolicy::MustNotDropItems)
            .build();

        group.acquire(&"a").unwrap();
        group.dispose();

        drop(group);
    }

    #[test]
    fn builder_without_registry_is_unregistered() {
        let registry = PoolRegistry::new();

        let group = PoolGroup::builder(FakeHost::default()).build();

        assert!(!registry.is_registered(&group));
        assert!(format!("{:?}", PoolGroup::<FakeHost>::builder(FakeHost::default()))
            .contains("PoolGroupBuilder"));
    }
}
