//! Pools projectiles for a toy game loop and tears everything down at shutdown.
//!
//! This shows how to implement `Host` and how pools, groups and the registry fit together.

use std::cell::RefCell;
use std::rc::Rc;

use prototype_pool::{Host, PoolGroup, PoolRegistry, SinglePool};

#[derive(Clone, Debug, Default)]
struct World {
    next_entity: Rc<RefCell<u32>>,
}

impl Host for World {
    type Prototype = &'static str;
    type Instance = u32;
    type Placement = (i32, i32);

    fn instantiate(&mut self, prototype: &&'static str, context: Option<&(i32, i32)>) -> u32 {
        let mut next = self.next_entity.borrow_mut();
        *next = next.wrapping_add(1);

        println!("spawned {prototype} #{next} at {context:?}");
        *next
    }

    fn destroy(&mut self, instance: u32) {
        println!("despawned #{instance}");
    }

    fn set_active(&mut self, instance: &u32, active: bool) {
        println!("#{instance} active: {active}");
    }

    fn apply_placement(&mut self, instance: &u32, placement: &(i32, i32)) {
        println!("#{instance} moved to {placement:?}");
    }
}

fn main() -> prototype_pool::Result<()> {
    println!("=== Prototype Pool Basic Example ===");

    let world = World::default();
    let registry = PoolRegistry::new();

    let bullets = SinglePool::builder(world.clone(), "bullet")
        .initial_capacity(4)
        .pre_warm(2)
        .home_placement((0, -100))
        .registry(&registry)
        .build()?;

    let enemies = PoolGroup::builder(world)
        .registry(&registry)
        .build();

    for frame in 0..3 {
        let bullet = bullets.acquire_with(&(frame, 0))?;
        let kind = if frame % 2 == 0 { "orc" } else { "bat" };
        let enemy = enemies.acquire_with(&kind, &(frame, 10))?;

        bullets.release(bullet)?;
        enemies.release(enemy)?;
    }

    println!(
        "bullets created: {}, enemy kinds: {}",
        bullets.created(),
        enemies.pool_count()
    );

    let torn_down = registry.teardown_all();
    println!("tore down {torn_down} pools");

    Ok(())
}
