//! This package provides [`SinglePool`] and [`PoolGroup`], pools that reuse expensive host
//! objects instead of constructing and destroying them over and over.
//!
//! The pools never construct, show, hide or move anything themselves. Those side effects belong
//! to a [`Host`], which you implement for your environment (a scene graph, a socket layer, a
//! texture cache). The pools only track which instances exist, which are waiting to be reused and
//! which are held by callers.
//!
//! # Features
//!
//! - **First-in first-out reuse**: [`SinglePool`] hands out the instance that has been waiting
//!   longest, backed by a [`RingQueue`].
//! - **Idempotent release**: releasing an instance twice, or releasing one that came from
//!   elsewhere, is a no-op that returns `false`.
//! - **Self-returning leases**: [`SinglePool::lease()`] wraps an instance in a [`Lease`] that
//!   goes back to its pool when dropped.
//! - **Expand or reject**: an empty pool either creates a new instance through the host or fails
//!   with [`Error::PoolExhausted`], as configured.
//! - **Heterogeneous pooling**: [`PoolGroup`] creates one pool per prototype on demand and
//!   remembers which prototype every checked out instance came from.
//! - **Coordinated shutdown**: pools registered with a [`PoolRegistry`] are torn down together
//!   with [`PoolRegistry::teardown_all()`].
//! - **Optional leak detection**: a pool can be configured to panic on drop if it still tracks
//!   instances.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use prototype_pool::{Host, PoolGroup, PoolRegistry};
//!
//! /// Spawns named entities into a shared list of live entities.
//! #[derive(Clone, Debug, Default)]
//! struct Scene {
//!     live: Rc<RefCell<Vec<u32>>>,
//!     next: Rc<RefCell<u32>>,
//! }
//!
//! impl Host for Scene {
//!     type Prototype = String;
//!     type Instance = u32;
//!     type Placement = (f32, f32);
//!
//!     fn is_valid_prototype(&self, prototype: &String) -> bool {
//!         !prototype.is_empty()
//!     }
//!
//!     fn instantiate(&mut self, _prototype: &String, _context: Option<&(f32, f32)>) -> u32 {
//!         let mut next = self.next.borrow_mut();
//!         *next += 1;
//!         self.live.borrow_mut().push(*next);
//!         *next
//!     }
//!
//!     fn destroy(&mut self, instance: u32) {
//!         self.live.borrow_mut().retain(|live| *live != instance);
//!     }
//! }
//!
//! let scene = Scene::default();
//! let registry = PoolRegistry::new();
//!
//! let enemies = PoolGroup::builder(scene.clone())
//!     .pre_warm(2)
//!     .registry(&registry)
//!     .build();
//!
//! let orc = enemies.acquire_with(&"orc".to_string(), &(10.0, 4.0))?;
//! let bat = enemies.acquire(&"bat".to_string())?;
//! assert_eq!(scene.live.borrow().len(), 4);
//!
//! // The group knows where every instance came from.
//! assert!(enemies.release(orc)?);
//! assert!(enemies.release(bat)?);
//!
//! // Shutdown destroys everything every registered pool ever created.
//! registry.teardown_all();
//! assert!(scene.live.borrow().is_empty());
//! # Ok::<(), prototype_pool::Error>(())
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod acquired;
mod builder;
mod drop_policy;
mod error;
mod group;
mod group_builder;
mod host;
mod lease;
mod pool;
mod raw_pool;
mod registry;
mod ring_queue;
mod settings;

#[cfg(test)]
mod test_host;

pub use acquired::*;
pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use group::*;
pub use group_builder::*;
pub use host::*;
pub use lease::*;
pub use pool::*;
pub use registry::*;
pub use ring_queue::*;
