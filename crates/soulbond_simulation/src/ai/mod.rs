//! AI decision-making: behavior trees поверх combat/movement машин.
//!
//! Порядок выполнения (FixedUpdate):
//! 1. update_perception / update_nav_probes — oracle-факты → views
//! 2. snapshot_positions — позиции в индекс для cross-actor чтения
//! 3. tick_actor_brains — одна оценка дерева на актора (только owner)

use bevy::prelude::*;
use std::collections::HashMap;

pub mod leaves;
pub mod perception;
pub mod trees;

pub use leaves::{BehaviorCtx, CombatLeaf};
pub use perception::{update_nav_probes, update_perception};
pub use trees::{melee_combat_tree, ranged_combat_tree};

use crate::behavior::BehaviorTree;
use crate::combat::{CombatCueEvent, CombatMachine, CombatTuning};
use crate::components::{Blackboard, Facing, Health, MoveIntent, MovementTuning, NavProbe,
    Perception, Position};
use crate::net::{LocalPeer, NetOwner};
use crate::oracle::OracleEvent;
use crate::{DeterministicRng, SimSet};

/// Мозг актора: его дерево решений. Живёт и умирает вместе с актором.
#[derive(Component)]
pub struct Brain {
    pub tree: BehaviorTree<CombatLeaf>,
}

impl Brain {
    pub fn melee() -> Self {
        Self {
            tree: melee_combat_tree(),
        }
    }

    pub fn ranged() -> Self {
        Self {
            tree: ranged_combat_tree(),
        }
    }
}

/// Снапшот позиций прошлой фазы тика: слабые cross-actor чтения без
/// конфликтов borrow'ов (цель другого актора — отношение, не владение).
#[derive(Resource, Debug, Default)]
pub struct PositionIndex(pub HashMap<Entity, Vec2>);

impl PositionIndex {
    pub fn get(&self, entity: Entity) -> Option<Vec2> {
        self.0.get(&entity).copied()
    }
}

/// System: пересобирает позиционный индекс.
pub fn snapshot_positions(
    mut index: ResMut<PositionIndex>,
    query: Query<(Entity, &Position)>,
) {
    index.0.clear();
    for (entity, position) in query.iter() {
        index.0.insert(entity, position.0);
    }
}

/// System: одна оценка дерева на актора за fixed step.
///
/// Только authoritative пир: чужие актёры здесь не думают, им приходят
/// готовые факты по сети. Мёртвые не думают тоже.
#[allow(clippy::type_complexity)]
pub fn tick_actor_brains(
    mut query: Query<(
        Entity,
        &NetOwner,
        &mut Brain,
        &mut Blackboard,
        &mut CombatMachine,
        &mut MoveIntent,
        &mut Facing,
        &Perception,
        &NavProbe,
        &Health,
    )>,
    positions: Res<PositionIndex>,
    local: Res<LocalPeer>,
    combat_tuning: Res<CombatTuning>,
    movement_tuning: Res<MovementTuning>,
    mut rng: ResMut<DeterministicRng>,
    time: Res<Time<Fixed>>,
    mut cue_events: EventWriter<CombatCueEvent>,
) {
    let dt = time.delta_secs();

    for (
        entity,
        owner,
        mut brain,
        mut blackboard,
        mut combat,
        mut intent,
        mut facing,
        perception,
        nav,
        health,
    ) in query.iter_mut()
    {
        if owner.0 != local.0 {
            continue;
        }
        if !health.is_alive() {
            continue;
        }

        let position = positions.get(entity).unwrap_or(Vec2::ZERO);

        let mut cues = Vec::new();
        let mut ctx = BehaviorCtx {
            dt,
            actor: entity,
            position,
            facing: &mut facing,
            intent: &mut intent,
            blackboard: &mut blackboard,
            combat: &mut combat,
            perception,
            nav,
            positions: &positions,
            combat_tuning: &combat_tuning,
            movement_tuning: &movement_tuning,
            cues: &mut cues,
            rng: &mut rng.rng,
        };
        brain.tree.tick(&mut ctx);

        for cue in cues {
            cue_events.write(CombatCueEvent { actor: entity, cue });
        }
    }
}

/// AI Plugin.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PositionIndex>()
            .add_event::<OracleEvent>();

        app.add_systems(
            FixedUpdate,
            (update_perception, update_nav_probes, snapshot_positions)
                .chain()
                .in_set(SimSet::Perception),
        )
        .add_systems(FixedUpdate, tick_actor_brains.in_set(SimSet::Decision));
    }
}
