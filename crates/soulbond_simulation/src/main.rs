//! Headless симуляция SOULBOND
//!
//! Два враждебных melee актора дерутся без рендера — smoke-тест
//! детерминированного ядра.

use bevy::prelude::*;
use soulbond_simulation::*;

fn main() {
    let seed = 42;
    println!("Starting SOULBOND headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let local = app.world().resource::<LocalPeer>().0;
    let mut ids = Vec::new();
    for (x, faction) in [(-3.0f32, 1u64), (3.0f32, 2u64)] {
        let entity = app
            .world_mut()
            .spawn((
                Actor {
                    faction_id: faction,
                },
                Position(Vec2::new(x, 0.0)),
                Blackboard::default(),
                Perception::default(),
                NavProbe::default(),
                MoveIntent::default(),
                Brain::melee(),
                CombatMachine::new(),
                MovementMachine::ground(),
                Guard::default(),
                NetOwner(local),
                NetId(faction),
            ))
            .id();
        ids.push(entity);
    }
    {
        let mut registry = app.world_mut().resource_mut::<NetRegistry>();
        registry.register(NetId(1), ids[0]);
        registry.register(NetId(2), ids[1]);
    }

    // Взаимная видимость: oracle-факты от "vision" слоя
    app.world_mut().send_event(OracleEvent::TargetSpotted {
        observer: ids[0],
        target: ids[1],
    });
    app.world_mut().send_event(OracleEvent::TargetSpotted {
        observer: ids[1],
        target: ids[0],
    });

    for tick in 0..1000 {
        app.update();

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            println!("Tick {}: {} entities", tick, entity_count);
        }
    }

    println!("Simulation complete!");
}
