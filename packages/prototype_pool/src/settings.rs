use crate::DropPolicy;

/// Initial storage capacity of a pool when the caller does not specify one.
pub(crate) const DEFAULT_INITIAL_CAPACITY: usize = 8;

/// Configuration shared by every pool a builder creates.
///
/// A pool group keeps one of these as the template for the pools it creates on demand.
#[derive(Clone)]
pub(crate) struct PoolSettings<P> {
    pub(crate) initial_capacity: usize,
    pub(crate) pre_warm: usize,
    pub(crate) auto_expand: bool,
    pub(crate) home_placement: Option<P>,
    pub(crate) drop_policy: DropPolicy,
}

impl<P> Default for PoolSettings<P> {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            pre_warm: 0,
            auto_expand: true,
            home_placement: None,
            drop_policy: DropPolicy::default(),
        }
    }
}
