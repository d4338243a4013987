//! Perception/nav maintenance из oracle-фактов.

use bevy::prelude::*;

use crate::components::{Actor, Health, NavProbe, Perception};
use crate::oracle::OracleEvent;

/// System: обновление Perception из TargetSpotted/TargetLost.
///
/// Фильтрация по фракциям: в visible попадают только враги. Трупы
/// выметаются каждый тик — vision слой не обязан слать TargetLost при
/// смерти цели.
pub fn update_perception(
    mut oracle_events: EventReader<OracleEvent>,
    mut observers: Query<(&mut Perception, &Actor)>,
    actors: Query<&Actor>,
    healths: Query<&Health>,
) {
    for event in oracle_events.read() {
        match event {
            OracleEvent::TargetSpotted { observer, target } => {
                let Ok((mut perception, observer_actor)) = observers.get_mut(*observer) else {
                    continue;
                };
                let Ok(target_actor) = actors.get(*target) else {
                    continue;
                };
                if observer_actor.faction_id == target_actor.faction_id {
                    continue; // союзник
                }
                if !perception.visible.contains(target) {
                    perception.visible.push(*target);
                    crate::log(&format!(
                        "👁️ {:?} spotted enemy {:?} (faction {} vs {})",
                        observer, target, observer_actor.faction_id, target_actor.faction_id
                    ));
                }
            }
            OracleEvent::TargetLost { observer, target } => {
                if let Ok((mut perception, _)) = observers.get_mut(*observer) {
                    perception.visible.retain(|&e| e != *target);
                }
            }
            _ => {}
        }
    }

    // Трупы и исчезнувшие entities выметаются.
    for (mut perception, _) in observers.iter_mut() {
        perception.visible.retain(|&e| {
            healths
                .get(e)
                .map(|h| h.is_alive())
                .unwrap_or(false)
        });
    }
}

/// System: обновление NavProbe из PathBlocked/PathClear/GroundedChanged.
pub fn update_nav_probes(
    mut oracle_events: EventReader<OracleEvent>,
    mut probes: Query<&mut NavProbe>,
) {
    for event in oracle_events.read() {
        match event {
            OracleEvent::PathBlocked { actor } => {
                if let Ok(mut probe) = probes.get_mut(*actor) {
                    probe.path_blocked = true;
                }
            }
            OracleEvent::PathClear { actor } => {
                if let Ok(mut probe) = probes.get_mut(*actor) {
                    probe.path_blocked = false;
                }
            }
            OracleEvent::GroundedChanged { actor, grounded } => {
                if let Ok(mut probe) = probes.get_mut(*actor) {
                    probe.grounded = *grounded;
                }
            }
            _ => {}
        }
    }
}
