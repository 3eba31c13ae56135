/// Where an acquired instance came from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "an instance is either taken from storage or newly created, there is no third source"
)]
pub enum Origin {
    /// The instance was waiting in the pool and has been used before (or was pre-warmed).
    Reused,

    /// The pool was empty and constructed a new instance to satisfy the request.
    Created,
}

/// An instance handed out by a pool, together with its [`Origin`].
///
/// Returned by the `acquire_tracked()` family of methods. Callers that need to run one-time
/// setup on brand new instances can inspect [`origin()`][Self::origin].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Acquired<I> {
    instance: I,
    origin: Origin,
}

impl<I> Acquired<I> {
    pub(crate) fn new(instance: I, origin: Origin) -> Self {
        Self { instance, origin }
    }

    /// The acquired instance.
    #[must_use]
    pub fn instance(&self) -> &I {
        &self.instance
    }

    /// Where the instance came from.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Whether the pool had to construct the instance for this request.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.origin == Origin::Created
    }

    /// Consumes the wrapper and returns the instance.
    #[must_use]
    pub fn into_instance(self) -> I {
        self.instance
    }
}
