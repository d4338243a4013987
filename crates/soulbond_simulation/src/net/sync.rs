//! Outbound queue + inbound application.
//!
//! Outbox дренируется один раз в конце тика; inbound применяется в начале
//! следующего — через те же state-machine входы, что и локальная логика,
//! с перепроверкой текущего состояния (stale/duplicate ⇒ silent no-op).

use bevy::prelude::*;
use std::collections::HashMap;

use crate::combat::systems::{apply_knockdown, apply_revive};
use crate::combat::{CombatCueEvent, CombatMachine, CombatStateKind, CombatTuning};
use crate::components::{Health, MoveIntent, MovementTuning, Position, Velocity};
use crate::movement::MovementMachine;
use crate::net::{NetEvent, NetId, NetLink, PeerId, Scope};
use crate::projectile::Projectile;
use crate::session::Session;

/// Типизированная исходящая очередь текущего тика.
#[derive(Resource, Debug, Default)]
pub struct Outbox {
    queue: Vec<(Scope, NetEvent)>,
}

impl Outbox {
    pub fn push(&mut self, scope: Scope, event: NetEvent) {
        self.queue.push((scope, event));
    }

    pub fn drain(&mut self) -> Vec<(Scope, NetEvent)> {
        std::mem::take(&mut self.queue)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// NetId → Entity на этом пире.
#[derive(Resource, Debug, Default)]
pub struct NetRegistry {
    map: HashMap<NetId, Entity>,
}

impl NetRegistry {
    pub fn register(&mut self, id: NetId, entity: Entity) {
        self.map.insert(id, entity);
    }

    pub fn unregister(&mut self, id: NetId) {
        self.map.remove(&id);
    }

    pub fn get(&self, id: NetId) -> Option<Entity> {
        self.map.get(&id).copied()
    }
}

/// Выдаёт NetId, уникальные между пирами: старшие 16 бит — пир.
#[derive(Resource, Debug)]
pub struct NetIdAllocator {
    peer: PeerId,
    next: u64,
}

impl Default for NetIdAllocator {
    fn default() -> Self {
        Self::new(PeerId(0))
    }
}

impl NetIdAllocator {
    pub fn new(peer: PeerId) -> Self {
        Self { peer, next: 0 }
    }

    pub fn alloc(&mut self) -> NetId {
        let id = ((self.peer.0 as u64) << 48) | self.next;
        self.next += 1;
        NetId(id)
    }
}

/// System: дренирует Outbox в транспорт. Последняя в тике.
pub fn drain_outbox(mut outbox: ResMut<Outbox>, mut link: ResMut<NetLink>) {
    for (scope, event) in outbox.drain() {
        crate::log(&format!("📤 net send {:?}: {:?}", scope, event));
        link.0.send(scope, event);
    }
}

/// System: применяет входящие факты. Первая в тике.
///
/// Каждая ветка guard'ится текущим состоянием получателя:
/// - Revive только из Death (повторная доставка — no-op);
/// - KnockedDown только если ещё не в Death;
/// - ProjectileExpired/Spawned только если реплика есть/ещё нет;
/// - restart-флаги идемпотентны.
pub fn apply_inbound(
    mut link: ResMut<NetLink>,
    mut registry: ResMut<NetRegistry>,
    mut commands: Commands,
    mut actors: Query<(
        &mut CombatMachine,
        &mut Health,
        &mut MoveIntent,
        &mut Velocity,
        Option<&mut MovementMachine>,
    )>,
    mut session: ResMut<Session>,
    combat_tuning: Res<CombatTuning>,
    movement_tuning: Res<MovementTuning>,
    time: Res<Time<Fixed>>,
    mut cue_events: EventWriter<CombatCueEvent>,
) {
    let dt = time.delta_secs();

    for event in link.0.poll() {
        match event {
            NetEvent::Revive { actor } => {
                let Some(entity) = registry.get(actor) else {
                    continue;
                };
                let Ok((mut combat, mut health, _, mut velocity, mut movement)) =
                    actors.get_mut(entity)
                else {
                    continue;
                };
                if !combat.is_in(CombatStateKind::Death) {
                    // Дубликат или устаревший revive — молча игнорируем.
                    crate::log(&format!("stale revive for {:?} ignored", actor));
                    continue;
                }

                let mut cues = Vec::new();
                apply_revive(
                    entity,
                    &mut combat,
                    &mut health,
                    movement.as_deref_mut(),
                    &mut velocity,
                    &combat_tuning,
                    &movement_tuning,
                    dt,
                    &mut cues,
                );
                for cue in cues {
                    cue_events.write(CombatCueEvent { actor: entity, cue });
                }
            }

            NetEvent::KnockedDown { actor } => {
                let Some(entity) = registry.get(actor) else {
                    continue;
                };
                let Ok((mut combat, _, mut intent, mut velocity, mut movement)) =
                    actors.get_mut(entity)
                else {
                    continue;
                };
                if combat.is_in(CombatStateKind::Death) {
                    continue; // уже мёртв
                }

                let mut cues = Vec::new();
                apply_knockdown(
                    entity,
                    &mut combat,
                    movement.as_deref_mut(),
                    &mut intent,
                    &mut velocity,
                    &combat_tuning,
                    &movement_tuning,
                    dt,
                    &mut cues,
                );
                for cue in cues {
                    cue_events.write(CombatCueEvent { actor: entity, cue });
                }
            }

            NetEvent::ProjectileSpawned {
                projectile,
                shooter,
                origin,
                direction,
            } => {
                if registry.get(projectile).is_some() {
                    continue; // дубликат
                }
                let origin = Vec2::from(origin);
                let direction = Vec2::from(direction);

                // Реплика без NetOwner — её никто здесь не симулирует,
                // только рендер и финальный ProjectileExpired.
                let entity = commands
                    .spawn((
                        Projectile {
                            shooter: registry.get(shooter),
                            direction,
                            speed: combat_tuning.projectile_speed,
                            max_distance: combat_tuning.projectile_max_distance,
                            origin,
                            pending_expiry: false,
                        },
                        Position(origin),
                        projectile,
                    ))
                    .id();
                registry.register(projectile, entity);
                crate::log(&format!("🠒 projectile replica {:?} spawned", projectile));
            }

            NetEvent::ProjectileExpired { projectile } => {
                let Some(entity) = registry.get(projectile) else {
                    continue; // stale — снаряда уже нет
                };
                registry.unregister(projectile);
                commands.entity(entity).despawn();
                crate::log(&format!("✖ projectile {:?} expired", projectile));
            }

            NetEvent::RequestRestart => {
                session.partner_requesting_restart = true;
            }

            NetEvent::CancelRestart => {
                session.partner_requesting_restart = false;
            }

            NetEvent::LoadLevel { level } => {
                session.pending_level = Some(level);
                session.reset_restart_flags();
            }
        }
    }
}
