use cucumber::given;

use crate::{cucumber::KedaiWorld, support::TestSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut KedaiWorld) {
    let system = TestSystem::new().await;
    world.system = Some(system);
}
