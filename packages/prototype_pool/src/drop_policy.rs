/// Determines what happens to instances still tracked by a pool when the pool is dropped.
///
/// By default, the pool destroys its instances through the host when it is dropped.
///
/// # Examples
///
/// ```
/// use prototype_pool::DropPolicy;
///
/// assert_eq!(DropPolicy::default(), DropPolicy::MayDropItems);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool destroys every instance it ever created when it is dropped. This is the default.
    #[default]
    MayDropItems,

    /// The pool will panic if it still tracks any instances when it is dropped.
    ///
    /// Use this when instances must be torn down explicitly via `clear()` or `dispose()` (or by a
    /// [`PoolRegistry`][crate::PoolRegistry]) before the pool goes away, for example because
    /// destroying them has to happen at a specific point of an application's shutdown sequence.
    MustNotDropItems,
}
