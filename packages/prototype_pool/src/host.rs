use std::hash::Hash;

/// The environment that pooled instances live in.
///
/// Pools never construct, destroy or show objects themselves. They decide *which* instance is
/// handed out and delegate every side effect on the instance to the host. A host is typically a
/// cheap handle onto the real environment (a scene, a connection factory, an arena), because each
/// pool owns its own copy of the host value.
///
/// # Instance identity
///
/// Instances are tracked in hash sets and hash maps, so [`Host::Instance`] must have a stable
/// identity: two values compare equal if and only if they refer to the same underlying object.
/// Opaque handles such as entity IDs or pointer-identity wrappers are a good fit.
///
/// # Example
///
/// ```rust
/// use prototype_pool::Host;
///
/// /// Hands out numbered sockets for a named endpoint.
/// #[derive(Clone, Debug, Default)]
/// struct Sockets {
///     next_id: u32,
/// }
///
/// impl Host for Sockets {
///     type Prototype = &'static str;
///     type Instance = u32;
///     type Placement = ();
///
///     fn is_valid_prototype(&self, prototype: &&'static str) -> bool {
///         !prototype.is_empty()
///     }
///
///     fn instantiate(&mut self, _prototype: &&'static str, _context: Option<&()>) -> u32 {
///         self.next_id += 1;
///         self.next_id
///     }
///
///     fn destroy(&mut self, _instance: u32) {}
/// }
/// ```
pub trait Host: 'static {
    /// The template that new instances are constructed from. Pool groups key their pools by it.
    type Prototype: 'static;

    /// One constructed, individually trackable object.
    type Instance: Clone + Eq + Hash + 'static;

    /// Opaque placement data (position, orientation, parent, ...) forwarded unchanged from the
    /// caller of an acquire operation to [`Host::apply_placement()`].
    type Placement: 'static;

    /// Whether `prototype` can be used to construct instances.
    ///
    /// Pools refuse to be built from a prototype the host rejects. By default every prototype
    /// is accepted.
    fn is_valid_prototype(&self, _prototype: &Self::Prototype) -> bool {
        true
    }

    /// Constructs one new instance from `prototype`.
    ///
    /// `context` is the pool's home placement, if one was configured. Every call must return a
    /// distinct instance that can be destroyed independently of all others.
    fn instantiate(
        &mut self,
        prototype: &Self::Prototype,
        context: Option<&Self::Placement>,
    ) -> Self::Instance;

    /// Irrevocably destroys `instance`. The pool never hands it out again.
    fn destroy(&mut self, instance: Self::Instance);

    /// Toggles the active state of `instance`.
    ///
    /// Pools deactivate instances when they are created for storage or released, and activate
    /// them when they are handed out. The default implementation does nothing.
    fn set_active(&mut self, _instance: &Self::Instance, _active: bool) {}

    /// Applies caller-supplied placement to an instance that was just handed out, or the pool's
    /// home placement to an instance that was just released. The default implementation does
    /// nothing.
    fn apply_placement(&mut self, _instance: &Self::Instance, _placement: &Self::Placement) {}
}
