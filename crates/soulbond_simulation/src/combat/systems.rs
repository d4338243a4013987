//! Combat systems: guard input, machine execution, hit resolution.

use bevy::prelude::*;

use crate::ai::PositionIndex;
use crate::combat::{
    BlockDirection, CombatCtx, CombatCue, CombatCueEvent, CombatMachine, CombatState,
    CombatStateKind, CombatTuning, DamageDealt, Guard, GuardInput, ReviveRequested,
};
use crate::components::{Blackboard, Facing, Health, MoveIntent, MovementTuning, Velocity};
use crate::movement::{MovementCtx, MovementMachine};
use crate::net::{LocalPeer, NetEvent, NetId, NetOwner, Outbox, Scope};
use crate::oracle::OracleEvent;

/// System: применяет вход гарда.
///
/// Зажатый гард из idle входит в Block (вход из inactive всегда легален).
/// Отпущенный гард во время BlockHit решает ветку выхода из хит-стана —
/// сам стан свой флаг не трогает.
pub fn apply_guard_input(
    mut guard_events: EventReader<GuardInput>,
    mut query: Query<(&mut Guard, &mut CombatMachine, &Health)>,
    tuning: Res<CombatTuning>,
    time: Res<Time<Fixed>>,
    mut cue_events: EventWriter<CombatCueEvent>,
) {
    let dt = time.delta_secs();

    for event in guard_events.read() {
        let Ok((mut guard, mut combat, health)) = query.get_mut(event.actor) else {
            continue;
        };

        guard.held = event.held;
        guard.direction = event.direction;

        let mut cues = Vec::new();
        if event.held {
            if health.is_alive() && combat.is_inactive() {
                let mut ctx = CombatCtx {
                    dt,
                    guard_held: true,
                    aim_pos: None,
                    tuning: &tuning,
                    cues: &mut cues,
                };
                if let Err(err) =
                    combat.change_state(CombatState::block(event.direction), &mut ctx)
                {
                    crate::log_warning(&format!("guard for {:?}: {}", event.actor, err));
                }
            }
        } else if combat.is_in(CombatStateKind::BlockHit) {
            if let Some(state) = combat.current_mut() {
                state.set_will_return_to_block(false);
            }
        }

        for cue in cues {
            cue_events.write(CombatCueEvent {
                actor: event.actor,
                cue,
            });
        }
    }
}

/// System: Execute текущего combat состояния у своих актёров.
///
/// aim_pos для ranged лока — текущая позиция цели с blackboard.
pub fn execute_combat_machines(
    mut query: Query<(
        Entity,
        &NetOwner,
        &mut CombatMachine,
        Option<&Guard>,
        Option<&Blackboard>,
    )>,
    positions: Res<PositionIndex>,
    local: Res<LocalPeer>,
    tuning: Res<CombatTuning>,
    time: Res<Time<Fixed>>,
    mut cue_events: EventWriter<CombatCueEvent>,
) {
    let dt = time.delta_secs();

    for (entity, owner, mut combat, guard, blackboard) in query.iter_mut() {
        if owner.0 != local.0 {
            continue;
        }

        let aim_pos = blackboard
            .and_then(|b| b.combat_target)
            .and_then(|target| positions.get(target));

        let mut cues = Vec::new();
        let mut ctx = CombatCtx {
            dt,
            guard_held: guard.map(|g| g.held).unwrap_or(false),
            aim_pos,
            tuning: &tuning,
            cues: &mut cues,
        };

        if let Err(err) = combat.execute(&mut ctx) {
            crate::log_warning(&format!("combat machine {:?}: {}", entity, err));
        }

        for cue in cues {
            cue_events.write(CombatCueEvent { actor: entity, cue });
        }
    }
}

/// System: melee contact-факты от oracle → hit resolution.
///
/// Решается только на пире, владеющем ЦЕЛЬЮ: её машина живёт там.
pub fn resolve_melee_contacts(
    mut oracle_events: EventReader<OracleEvent>,
    mut targets: Query<(
        &NetOwner,
        &mut CombatMachine,
        &mut Health,
        &Facing,
        &mut MoveIntent,
        &mut Velocity,
        Option<&mut MovementMachine>,
        Option<&NetId>,
    )>,
    positions: Res<PositionIndex>,
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
        let OracleEvent::MeleeContact { attacker, target } = event else {
            continue;
        };
        if attacker == target {
            continue; // self-hit не бывает
        }

        let Ok((
            owner,
            mut combat,
            mut health,
            facing,
            mut intent,
            mut velocity,
            mut movement,
            net_id,
        )) = targets.get_mut(*target)
        else {
            continue;
        };
        if owner.0 != local.0 {
            continue;
        }

        let hit_dir = match (positions.get(*attacker), positions.get(*target)) {
            (Some(a), Some(t)) => (t - a).normalize_or_zero(),
            _ => Vec2::X,
        };

        // Движение жертвы сбрасывается при любом попадании.
        intent.stop();

        let mut cues = Vec::new();
        let outcome = resolve_hit(
            &mut combat,
            &mut health,
            facing,
            hit_dir,
            combat_tuning.melee_damage,
            &combat_tuning,
            dt,
            &mut cues,
        );

        match outcome {
            HitOutcome::Ignored => {}
            HitOutcome::Blocked => {
                crate::log(&format!("🛡️ {:?} blocked melee hit from {:?}", target, attacker));
            }
            HitOutcome::Hurt { died } => {
                damage_events.write(DamageDealt {
                    attacker: *attacker,
                    target: *target,
                    damage: combat_tuning.melee_damage,
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
                    if let Some(id) = net_id {
                        outbox.push(Scope::Others, NetEvent::KnockedDown { actor: *id });
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

/// System: интент revive → authoritative broadcast.
///
/// Применение (и настоящий guard по Death) идёт через loopback inbound —
/// один путь для своих и чужих.
pub fn request_revive(
    mut events: EventReader<ReviveRequested>,
    query: Query<(&CombatMachine, Option<&NetId>)>,
    mut outbox: ResMut<Outbox>,
) {
    for event in events.read() {
        let Ok((combat, net_id)) = query.get(event.target) else {
            continue;
        };
        if !combat.is_in(CombatStateKind::Death) {
            continue; // нечего оживлять
        }
        let Some(net_id) = net_id else {
            continue;
        };
        outbox.push(Scope::All, NetEvent::Revive { actor: *net_id });
    }
}

// ============================================================================
// Hit resolution helpers (shared by melee + projectile paths and net apply)
// ============================================================================

pub(crate) enum HitOutcome {
    /// Актор мёртв — попадание игнорируется.
    Ignored,
    /// Гард поглотил удар, машина в BlockHit.
    Blocked,
    Hurt {
        died: bool,
    },
}

/// Разрешает одно попадание против combat машины цели.
///
/// Death ⇒ ignore; Block ⇒ направление гарда против направления удара
/// решает blocked-vs-hurt (Block → BlockHit легален по таблице);
/// иначе урон.
pub(crate) fn resolve_hit(
    combat: &mut CombatMachine,
    health: &mut Health,
    facing: &Facing,
    hit_dir: Vec2,
    damage: u32,
    tuning: &CombatTuning,
    dt: f32,
    cues: &mut Vec<CombatCue>,
) -> HitOutcome {
    if combat.is_in(CombatStateKind::Death) {
        return HitOutcome::Ignored;
    }

    if combat.is_in(CombatStateKind::Block) {
        let direction = combat
            .current()
            .and_then(|s| s.block_direction())
            .unwrap_or(BlockDirection::Forward);

        if blocks_hit(facing, direction, hit_dir) {
            let mut ctx = CombatCtx {
                dt,
                guard_held: true,
                aim_pos: None,
                tuning,
                cues,
            };
            match combat.change_state(
                CombatState::block_hit(tuning.block_hit_duration, direction),
                &mut ctx,
            ) {
                Ok(()) => return HitOutcome::Blocked,
                Err(err) => crate::log_warning(&format!("block hit: {}", err)),
            }
        }
    }

    health.take_damage(damage);
    HitOutcome::Hurt {
        died: !health.is_alive(),
    }
}

/// Гард ловит удар только с той стороны, куда смотрит.
fn blocks_hit(facing: &Facing, direction: BlockDirection, hit_dir: Vec2) -> bool {
    match direction {
        BlockDirection::Forward => {
            (facing.right && hit_dir.x < 0.0) || (!facing.right && hit_dir.x > 0.0)
        }
        BlockDirection::Upwards => hit_dir.y < -0.5,
    }
}

/// Knockdown: forced переход в Death + полная остановка. У летуна
/// включается гравитация (forced Falling).
///
/// Вызывается локально (урон довёл до нуля) и из net apply (KnockedDown)
/// — один и тот же путь.
pub(crate) fn apply_knockdown(
    entity: Entity,
    combat: &mut CombatMachine,
    movement: Option<&mut MovementMachine>,
    intent: &mut MoveIntent,
    velocity: &mut Velocity,
    combat_tuning: &CombatTuning,
    movement_tuning: &MovementTuning,
    dt: f32,
    cues: &mut Vec<CombatCue>,
) {
    intent.stop();
    velocity.0 = Vec2::ZERO;

    let mut ctx = CombatCtx {
        dt,
        guard_held: false,
        aim_pos: None,
        tuning: combat_tuning,
        cues,
    };
    combat.force_state(CombatState::death(), &mut ctx);

    if let Some(mover) = movement {
        let mut mctx = MovementCtx {
            dt,
            intent: Vec2::ZERO,
            grounded: false,
            can_land: false,
            tuning: movement_tuning,
            velocity: &mut velocity.0,
        };
        mover.toggle_gravity(true, &mut mctx);
    }

    crate::log(&format!("💀 {:?} knocked down", entity));
}

/// Revive: выход из Death (hook шлёт Revived), полное здоровье, летуну
/// выключается гравитация и возвращается полёт.
///
/// Caller обязан проверить `is_in(Death)` — сюда приходят только
/// валидные revive.
pub(crate) fn apply_revive(
    entity: Entity,
    combat: &mut CombatMachine,
    health: &mut Health,
    movement: Option<&mut MovementMachine>,
    velocity: &mut Velocity,
    combat_tuning: &CombatTuning,
    movement_tuning: &MovementTuning,
    dt: f32,
    cues: &mut Vec<CombatCue>,
) {
    health.restore_full();

    let mut ctx = CombatCtx {
        dt,
        guard_held: false,
        aim_pos: None,
        tuning: combat_tuning,
        cues,
    };
    combat.exit(&mut ctx);

    if let Some(mover) = movement {
        let mut mctx = MovementCtx {
            dt,
            intent: Vec2::ZERO,
            grounded: false,
            can_land: false,
            tuning: movement_tuning,
            velocity: &mut velocity.0,
        };
        mover.toggle_gravity(false, &mut mctx);
        mover.take_flight(&mut mctx);
    }

    crate::log(&format!("✨ {:?} revived", entity));
}
