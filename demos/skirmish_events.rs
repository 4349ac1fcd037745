use glam::Vec2;
use skirmish_grid::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut world = CollisionWorld::new(WorldConfig {
        cell_size: 64.0,
        resolution_buffer: 1.0,
        layer_matrix: LayerMatrix::default(),
        enable_timing: true,
    });

    let marine = world.add_circle_collider(
        Vec2::new(100.0, 100.0),
        12.0,
        ColliderOptions::default().layer(Layer::UNIT).faction(1).entity_type("marine"),
    );
    let zergling = world.add_circle_collider(
        Vec2::new(118.0, 100.0),
        10.0,
        ColliderOptions::default().layer(Layer::UNIT).faction(2).entity_type("zergling"),
    );
    let depot = world.add_box_collider(
        Vec2::new(180.0, 100.0),
        64.0,
        64.0,
        0.0,
        ColliderOptions::default().layer(Layer::BUILDING).fixed().entity_type("depot"),
    );
    let beacon = world.add_circle_collider(
        Vec2::new(100.0, 160.0),
        24.0,
        ColliderOptions::default().layer(Layer::TRIGGER).trigger().entity_type("beacon"),
    );
    println!("Inserted marine={:?} zergling={:?} depot={:?} beacon={:?}", marine, zergling, depot, beacon);

    // Walk the marine down through the beacon and out the other side.
    for tick in 0..6 {
        let results = world.update();
        for r in &results {
            if let Some(res) = world.apply_resolution(r) {
                println!(
                    "tick {tick}: separated {:?}/{:?} -> ({:.1},{:.1}) ({:.1},{:.1})",
                    r.a, r.b, res.pos_a.x, res.pos_a.y, res.pos_b.x, res.pos_b.y
                );
            }
        }
        if let Some(t) = world.timing() {
            println!(
                "tick {tick}: update={:.3}ms (pairs={:.3}ms exits={:.3}ms) events={}",
                t.update_ms, t.pairs_ms, t.trigger_exit_ms, t.events_emitted
            );
        }
        for ev in world.drain_events() {
            match ev {
                CollisionEvent::Collision(r) => println!(
                    "  Collision: {:?} vs {:?} overlap={:.2} n=({:.2},{:.2})",
                    r.a, r.b, r.overlap, r.normal.x, r.normal.y
                ),
                CollisionEvent::TriggerEnter { trigger, other } => {
                    println!("  TriggerEnter: {:?} <- {:?}", trigger, other)
                }
                CollisionEvent::TriggerExit { trigger, other } => {
                    println!("  TriggerExit: {:?} -> {:?}", trigger, other)
                }
            }
        }
        if let Some(m) = world.get(marine) {
            let next = m.position() + Vec2::new(0.0, 30.0);
            world.update_position(marine, next);
        }
    }
    println!("stats: {:?}", world.debug_stats());
}
