//! Детерминизм: одинаковый seed ⇒ идентичные прогоны.
//!
//! Время двигается вручную (ровно один fixed step на update), RNG
//! seeded, системы в одном строгом порядке — снепшоты обязаны совпасть
//! побайтно.

use bevy::prelude::*;
use soulbond_simulation::*;

fn create_combat_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app
}

fn spawn_duelist(app: &mut App, faction: u64, pos: Vec2, net_id: u64) -> Entity {
    let local = app.world().resource::<LocalPeer>().0;
    let entity = app
        .world_mut()
        .spawn((
            Actor {
                faction_id: faction,
            },
            Position(pos),
            Blackboard::default(),
            Perception::default(),
            NavProbe::default(),
            MoveIntent::default(),
            Brain::melee(),
            CombatMachine::new(),
            MovementMachine::ground(),
            Guard::default(),
            NetOwner(local),
            NetId(net_id),
        ))
        .id();
    app.world_mut()
        .resource_mut::<NetRegistry>()
        .register(NetId(net_id), entity);
    entity
}

/// Запускает дуэль и снимает snapshot (позиции, здоровье, combat kinds).
fn run_duel_and_snapshot(seed: u64, ticks: usize) -> Vec<u8> {
    let mut app = create_combat_app(seed);

    let a = spawn_duelist(&mut app, 1, Vec2::new(-4.0, 0.0), 1);
    let b = spawn_duelist(&mut app, 2, Vec2::new(4.0, 0.0), 2);

    app.world_mut().send_event(OracleEvent::TargetSpotted {
        observer: a,
        target: b,
    });
    app.world_mut().send_event(OracleEvent::TargetSpotted {
        observer: b,
        target: a,
    });

    for tick in 0..ticks {
        // Скриптованные contact-факты: одинаковый поток во всех прогонах.
        if tick % 50 == 25 {
            app.world_mut().send_event(OracleEvent::MeleeContact {
                attacker: a,
                target: b,
            });
        }
        app.update();
    }

    duel_snapshot(app.world_mut())
}

fn duel_snapshot(world: &mut World) -> Vec<u8> {
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &Position, &Health)>();
    let mut rows: Vec<_> = query.iter(world).collect();
    rows.sort_by_key(|(entity, _, _)| entity.index());
    for (entity, position, health) in rows {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(&position.0.x.to_le_bytes());
        snapshot.extend_from_slice(&position.0.y.to_le_bytes());
        snapshot.extend_from_slice(&health.current.to_le_bytes());
    }

    let mut machines = world.query::<(Entity, &CombatMachine)>();
    let mut rows: Vec<_> = machines.iter(world).collect();
    rows.sort_by_key(|(entity, _)| entity.index());
    for (entity, machine) in rows {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", machine.current_kind()).as_bytes());
    }

    snapshot
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const TICKS: usize = 500;

    let snapshot1 = run_duel_and_snapshot(SEED, TICKS);
    let snapshot2 = run_duel_and_snapshot(SEED, TICKS);

    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

#[test]
fn test_determinism_three_runs() {
    const SEED: u64 = 42;
    const TICKS: usize = 300;

    let snapshots: Vec<_> = (0..3)
        .map(|_| run_duel_and_snapshot(SEED, TICKS))
        .collect();

    for (i, snapshot) in snapshots.iter().enumerate().skip(1) {
        assert_eq!(
            snapshots[0], *snapshot,
            "Прогон {} дал результат отличный от прогона 0",
            i
        );
    }
}

/// Инварианты живут все 500 тиков: health в границах, позиции конечны.
#[test]
fn test_invariants_hold_through_duel() {
    let mut app = create_combat_app(42);

    let a = spawn_duelist(&mut app, 1, Vec2::new(-4.0, 0.0), 1);
    let b = spawn_duelist(&mut app, 2, Vec2::new(4.0, 0.0), 2);

    app.world_mut().send_event(OracleEvent::TargetSpotted {
        observer: a,
        target: b,
    });
    app.world_mut().send_event(OracleEvent::TargetSpotted {
        observer: b,
        target: a,
    });

    for tick in 0..500 {
        app.update();

        for entity in [a, b] {
            let health = app.world().get::<Health>(entity).unwrap();
            assert!(
                health.current <= health.max,
                "Tick {}: health invariant broken for {:?}",
                tick,
                entity
            );
            let position = app.world().get::<Position>(entity).unwrap();
            assert!(
                position.0.is_finite(),
                "Tick {}: non-finite position for {:?}",
                tick,
                entity
            );
        }
    }
}
