//! Ranged projectile lifecycle.
//!
//! Снаряд симулирует ТОЛЬКО владеющий пир: полёт, дистанция, контакты.
//! Остальные держат реплику (заспавненную из ProjectileSpawned) и ждут
//! финального факта ProjectileExpired. Контакты приходят от внешнего
//! collision-слоя как OracleEvent::ProjectileContact.

use bevy::prelude::*;

use crate::combat::systems::{apply_knockdown, resolve_hit, HitOutcome};
use crate::combat::{
    CombatCue, CombatCueEvent, CombatMachine, CombatStateKind, CombatTuning, DamageDealt,
};
use crate::components::{Facing, Health, MoveIntent, MovementTuning, Position, Velocity};
use crate::movement::MovementMachine;
use crate::net::{
    LocalPeer, NetEvent, NetId, NetIdAllocator, NetOwner, NetRegistry, Outbox, Scope,
};
use crate::oracle::{OracleEvent, ProjectileContactKind};
use crate::SimSet;

#[derive(Component, Debug, Clone)]
pub struct Projectile {
    /// Кто выстрелил (None у реплики, если стрелок неизвестен).
    pub shooter: Option<Entity>,
    /// Нормализованное направление полёта.
    pub direction: Vec2,
    pub speed: f32,
    /// Дальше этой дистанции от origin жизненный цикл кончается.
    pub max_distance: f32,
    pub origin: Vec2,
    /// Конец жизненного цикла уже отправлен; ждём loopback.
    pub pending_expiry: bool,
}

/// System: спавнит снаряды по кью RangedAttackLaunched своих актёров
/// и сразу объявляет факт остальным.
pub fn spawn_projectiles(
    mut cue_events: EventReader<CombatCueEvent>,
    shooters: Query<(&NetOwner, &Position, &Facing, Option<&NetId>)>,
    local: Res<LocalPeer>,
    tuning: Res<CombatTuning>,
    mut allocator: ResMut<NetIdAllocator>,
    mut registry: ResMut<NetRegistry>,
    mut outbox: ResMut<Outbox>,
    mut commands: Commands,
) {
    for event in cue_events.read() {
        let CombatCue::RangedAttackLaunched { target_pos } = &event.cue else {
            continue;
        };
        let Ok((owner, position, facing, net_id)) = shooters.get(event.actor) else {
            continue;
        };
        if owner.0 != local.0 {
            continue;
        }
        let Some(shooter_id) = net_id else {
            continue;
        };

        let mut direction = (*target_pos - position.0).normalize_or_zero();
        if direction == Vec2::ZERO {
            direction = Vec2::new(facing.horizontal(), 0.0);
        }

        let id = allocator.alloc();
        let entity = commands
            .spawn((
                Projectile {
                    shooter: Some(event.actor),
                    direction,
                    speed: tuning.projectile_speed,
                    max_distance: tuning.projectile_max_distance,
                    origin: position.0,
                    pending_expiry: false,
                },
                Position(position.0),
                NetOwner(local.0),
                id,
            ))
            .id();
        registry.register(id, entity);

        outbox.push(
            Scope::Others,
            NetEvent::ProjectileSpawned {
                projectile: id,
                shooter: *shooter_id,
                origin: position.0.into(),
                direction: direction.into(),
            },
        );

        crate::log(&format!(
            "🔥 {:?} fired projectile {:?} toward {:?}",
            event.actor, id, target_pos
        ));
    }
}

/// System: полёт + дистанционный конец жизненного цикла (только владелец).
///
/// Сам деспавн идёт через loopback ProjectileExpired — один путь
/// применения для всех пиров.
pub fn update_projectiles(
    mut query: Query<(&NetOwner, &mut Projectile, &mut Position, Option<&NetId>)>,
    local: Res<LocalPeer>,
    time: Res<Time<Fixed>>,
    mut outbox: ResMut<Outbox>,
) {
    let dt = time.delta_secs();

    for (owner, mut projectile, mut position, net_id) in query.iter_mut() {
        if owner.0 != local.0 || projectile.pending_expiry {
            continue;
        }

        position.0 += projectile.direction * projectile.speed * dt;

        if position.0.distance(projectile.origin) > projectile.max_distance {
            projectile.pending_expiry = true;
            if let Some(id) = net_id {
                outbox.push(
                    Scope::All,
                    NetEvent::ProjectileExpired { projectile: *id },
                );
            }
        }
    }
}

/// System: contact-факты от collision-слоя.
///
/// Попадание по актору решает пир-владелец ЦЕЛИ (Death ⇒ ignore,
/// Block ⇒ направление гарда, иначе hurt); конец жизненного цикла
/// объявляет пир-владелец снаряда. Оба guard'а в одном проходе.
pub fn resolve_projectile_contacts(
    mut oracle_events: EventReader<OracleEvent>,
    mut projectiles: Query<(&mut Projectile, Option<&NetOwner>, Option<&NetId>)>,
    mut targets: Query<
        (
            &NetOwner,
            &mut CombatMachine,
            &mut Health,
            &Facing,
            &mut MoveIntent,
            &mut Velocity,
            Option<&mut MovementMachine>,
            Option<&NetId>,
        ),
        Without<Projectile>,
    >,
    local: Res<LocalPeer>,
    combat_tuning: Res<CombatTuning>,
    movement_tuning: Res<MovementTuning>,
    time: Res<Time<Fixed>>,
    mut damage_events: EventWriter<DamageDealt>,
    mut cue_events: EventWriter<CombatCueEvent>,
    mut outbox: ResMut<Outbox>,
) {
    let dt = time.delta_secs();

    for event in oracle_events.read() {
        let OracleEvent::ProjectileContact {
            projectile,
            contact,
        } = event
        else {
            continue;
        };
        let Ok((mut proj, proj_owner, proj_id)) = projectiles.get_mut(*projectile) else {
            continue;
        };

        // Поглощается ли снаряд этим контактом: о препятствие — всегда;
        // мёртвого актора (и стрелка) пролетает насквозь.
        let mut consumed = matches!(contact, ProjectileContactKind::Obstacle);

        if let ProjectileContactKind::Actor(target) = contact {
            if proj.shooter != Some(*target) {
                if let Ok((
                    owner,
                    mut combat,
                    mut health,
                    facing,
                    mut intent,
                    mut velocity,
                    mut movement,
                    target_net_id,
                )) = targets.get_mut(*target)
                {
                    if combat.is_in(CombatStateKind::Death) {
                        // актор мёртв — игнорируем, lifecycle продолжается
                        continue;
                    }
                    consumed = true;

                    // Урон решает пир-владелец цели; чужие только
                    // завершают lifecycle ниже.
                    if owner.0 == local.0 {
                        intent.stop();

                        let mut cues = Vec::new();
                        let outcome = resolve_hit(
                            &mut combat,
                            &mut health,
                            facing,
                            proj.direction,
                            combat_tuning.projectile_damage,
                            &combat_tuning,
                            dt,
                            &mut cues,
                        );

                        match outcome {
                            HitOutcome::Ignored => {}
                            HitOutcome::Blocked => {
                                crate::log(&format!(
                                    "🛡️ {:?} blocked projectile {:?}",
                                    target, projectile
                                ));
                            }
                            HitOutcome::Hurt { died } => {
                                let attacker = proj.shooter.unwrap_or(*projectile);
                                damage_events.write(DamageDealt {
                                    attacker,
                                    target: *target,
                                    damage: combat_tuning.projectile_damage,
                                    target_died: died,
                                });
                                if died {
                                    apply_knockdown(
                                        *target,
                                        &mut combat,
                                        movement.as_deref_mut(),
                                        &mut intent,
                                        &mut velocity,
                                        &combat_tuning,
                                        &movement_tuning,
                                        dt,
                                        &mut cues,
                                    );
                                    if let Some(id) = target_net_id {
                                        outbox.push(
                                            Scope::Others,
                                            NetEvent::KnockedDown { actor: *id },
                                        );
                                    }
                                }
                            }
                        }

                        for cue in cues {
                            cue_events.write(CombatCueEvent {
                                actor: *target,
                                cue,
                            });
                        }
                    }
                }
            }
        }

        // Конец жизненного цикла объявляет владелец снаряда.
        if consumed && proj_owner.map(|o| o.0) == Some(local.0) && !proj.pending_expiry {
            proj.pending_expiry = true;
            if let Some(id) = proj_id {
                outbox.push(
                    Scope::All,
                    NetEvent::ProjectileExpired { projectile: *id },
                );
            }
        }
    }
}

pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                spawn_projectiles,
                update_projectiles,
                resolve_projectile_contacts,
            )
                .chain()
                .in_set(SimSet::Projectiles),
        );
    }
}
