#![cfg_attr(coverage_nightly, coverage(off))]

use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use mockall::mock;

use crate::Host;

/// State of the fake environment shared by every clone of a [`FakeHost`].
#[derive(Debug, Default)]
pub(crate) struct World {
    next_id: u32,
    pub(crate) alive: HashSet<u32>,
    pub(crate) active: HashSet<u32>,
    pub(crate) placements: HashMap<u32, i32>,
    pub(crate) destroyed: Vec<u32>,
    pub(crate) instantiated_from: Vec<(&'static str, Option<i32>)>,
}

/// A host whose instances are numbered objects in a shared [`World`].
///
/// Prototypes are names; the empty name is rejected as invalid. Placements are plain integers.
#[derive(Clone, Debug, Default)]
pub(crate) struct FakeHost {
    world: Rc<RefCell<World>>,
}

impl FakeHost {
    pub(crate) fn world(&self) -> Ref<'_, World> {
        self.world.borrow()
    }

    pub(crate) fn is_alive(&self, instance: u32) -> bool {
        self.world().alive.contains(&instance)
    }

    pub(crate) fn is_active(&self, instance: u32) -> bool {
        self.world().active.contains(&instance)
    }

    pub(crate) fn alive_count(&self) -> usize {
        self.world().alive.len()
    }

    pub(crate) fn placement_of(&self, instance: u32) -> Option<i32> {
        self.world().placements.get(&instance).copied()
    }
}

impl Host for FakeHost {
    type Prototype = &'static str;
    type Instance = u32;
    type Placement = i32;

    fn is_valid_prototype(&self, prototype: &&'static str) -> bool {
        !prototype.is_empty()
    }

    fn instantiate(&mut self, prototype: &&'static str, context: Option<&i32>) -> u32 {
        let mut world = self.world.borrow_mut();

        world.next_id += 1;
        let id = world.next_id;

        world.alive.insert(id);
        world.active.insert(id);
        world.instantiated_from.push((*prototype, context.copied()));

        id
    }

    fn destroy(&mut self, instance: u32) {
        let mut world = self.world.borrow_mut();

        assert!(
            world.alive.remove(&instance),
            "destroyed instance {instance} which is not alive"
        );
        world.active.remove(&instance);
        world.destroyed.push(instance);
    }

    fn set_active(&mut self, instance: &u32, active: bool) {
        let mut world = self.world.borrow_mut();

        if active {
            world.active.insert(*instance);
        } else {
            world.active.remove(instance);
        }
    }

    fn apply_placement(&mut self, instance: &u32, placement: &i32) {
        self.world
            .borrow_mut()
            .placements
            .insert(*instance, *placement);
    }
}

// Mockall cannot express the reference-carrying signatures of the trait directly, so we mock
// by-value equivalents and call these from a manual implementation of the trait.
mock! {
    #[derive(Debug)]
    pub Host {
        pub fn is_valid_prototype_core(&self, prototype: u8) -> bool;
        pub fn instantiate_core(&mut self, prototype: u8, context: Option<i32>) -> u32;
        pub fn destroy_core(&mut self, instance: u32);
        pub fn set_active_core(&mut self, instance: u32, active: bool);
        pub fn apply_placement_core(&mut self, instance: u32, placement: i32);
    }
}

impl Host for MockHost {
    type Prototype = u8;
    type Instance = u32;
    type Placement = i32;

    fn is_valid_prototype(&self, prototype: &u8) -> bool {
        self.is_valid_prototype_core(*prototype)
    }

    fn instantiate(&mut self, prototype: &u8, context: Option<&i32>) -> u32 {
        self.instantiate_core(*prototype, context.copied())
    }

    fn destroy(&mut self, instance: u32) {
        self.destroy_core(instance);
    }

    fn set_active(&mut self, instance: &u32, active: bool) {
        self.set_active_core(*instance, active);
    }

    fn apply_placement(&mut self, instance: &u32, placement: &i32) {
        self.apply_placement_core(*instance, *placement);
    }
}
