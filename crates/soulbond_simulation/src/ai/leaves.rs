//! Closed leaf vocabulary боевых деревьев + их blackboard контекст.
//!
//! Каждый leaf — вариант enum'а с одним dispatch match'ем. Весь доступ к
//! актору идёт через [`BehaviorCtx`], собираемый драйвером на тик: явный
//! shared mutable контекст, никакого скрытого глобального состояния.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::ai::PositionIndex;
use crate::behavior::{Leaf, Status};
use crate::combat::{CombatCtx, CombatCue, CombatMachine, CombatState, CombatStateKind, CombatTuning};
use crate::components::{Blackboard, Facing, MoveIntent, MovementTuning, NavProbe, Perception};

/// Blackboard одного тика одного актора: мутабельные куски самого актора
/// плюс read-only срезы мира (perception, позиции, tuning).
pub struct BehaviorCtx<'a> {
    pub dt: f32,
    pub actor: Entity,
    pub position: Vec2,
    pub facing: &'a mut Facing,
    pub intent: &'a mut MoveIntent,
    pub blackboard: &'a mut Blackboard,
    pub combat: &'a mut CombatMachine,
    pub perception: &'a Perception,
    pub nav: &'a NavProbe,
    pub positions: &'a PositionIndex,
    pub combat_tuning: &'a CombatTuning,
    pub movement_tuning: &'a MovementTuning,
    pub cues: &'a mut Vec<CombatCue>,
    pub rng: &'a mut ChaCha8Rng,
}

impl BehaviorCtx<'_> {
    /// Текущая позиция боевой цели (слабое отношение: цель перечитывается
    /// из индекса каждый раз).
    pub fn target_pos(&self) -> Option<Vec2> {
        self.blackboard
            .combat_target
            .and_then(|target| self.positions.get(target))
    }
}

/// Собирает контекст combat-машины из кусков BehaviorCtx (distinct
/// borrows, поэтому свободно сочетается с `ctx.combat`).
fn machine_ctx<'s>(
    dt: f32,
    aim_pos: Option<Vec2>,
    tuning: &'s CombatTuning,
    cues: &'s mut Vec<CombatCue>,
) -> CombatCtx<'s> {
    CombatCtx {
        dt,
        guard_held: false,
        aim_pos,
        tuning,
        cues,
    }
}

/// Leaf vocabulary боевых деревьев.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatLeaf {
    /// Action: выбрать видимую цель в blackboard (Failure — целей нет).
    AcquireVisibleTarget,
    /// Condition: combat машина в данном kind.
    CombatMachineInState(CombatStateKind),
    /// Action: выйти из combat машины.
    ExitCombatMachine,
    /// Condition: цель в melee дистанции (+slack пока замахиваемся).
    TargetInMeleeRange { ready_range: bool },
    /// Condition: ranged телеграф уже залочил позицию.
    HasLockedTargetPosition,
    /// Action: nav target = позиция цели (melee подход).
    SetMeleeNavTarget,
    /// Action: nav target = точка на дистанции стрельбы от цели.
    SetRangedNavTarget,
    /// Action: nav target = позиция цели (для разворота/прицеливания).
    SetCombatTargetPos,
    /// Action: идти к nav target. Running в пути, Failure если пути нет.
    GoToNavTarget,
    /// Action: остановиться.
    StopMoving,
    /// Action: повернуться к nav target.
    FaceNavTarget,
    /// Action: начать melee замах (ReadyAttack с jitter'ом телеграфа).
    StartMeleeAttack,
    /// Action: начать ranged телеграф.
    StartRangedAttack,
    /// Setup-action: подписаться на выстрелы цели (реакция уворотом —
    /// внешний слой читает флаг).
    ListenForTargetRangedAttacks,
}

impl Leaf for CombatLeaf {
    type Ctx<'a> = BehaviorCtx<'a>;

    fn tick(&mut self, ctx: &mut BehaviorCtx<'_>) -> Status {
        match *self {
            CombatLeaf::AcquireVisibleTarget => {
                ctx.blackboard.combat_target = ctx.perception.visible.first().copied();
                if ctx.blackboard.combat_target.is_some() {
                    Status::Success
                } else {
                    Status::Failure
                }
            }

            CombatLeaf::CombatMachineInState(kind) => {
                if ctx.combat.is_in(kind) {
                    Status::Success
                } else {
                    Status::Failure
                }
            }

            CombatLeaf::ExitCombatMachine => {
                let aim = ctx.target_pos();
                let mut mctx = machine_ctx(ctx.dt, aim, ctx.combat_tuning, &mut *ctx.cues);
                ctx.combat.exit(&mut mctx);
                Status::Success
            }

            CombatLeaf::TargetInMeleeRange { ready_range } => {
                let Some(target_pos) = ctx.target_pos() else {
                    return Status::Failure;
                };
                let mut range = ctx.combat_tuning.melee_range;
                if ready_range {
                    // Пока замахиваемся, мелкий дрейф цели не срывает удар.
                    range += ctx.combat_tuning.ready_range_slack;
                }
                if ctx.position.distance(target_pos) <= range {
                    Status::Success
                } else {
                    Status::Failure
                }
            }

            CombatLeaf::HasLockedTargetPosition => {
                let locked = ctx
                    .combat
                    .current()
                    .and_then(|state| state.locked_target_pos());
                if locked.is_some() {
                    Status::Success
                } else {
                    Status::Failure
                }
            }

            CombatLeaf::SetMeleeNavTarget => {
                let Some(target_pos) = ctx.target_pos() else {
                    return Status::Failure;
                };
                ctx.blackboard.nav_target = Some(target_pos);
                Status::Success
            }

            CombatLeaf::SetRangedNavTarget => {
                let Some(target_pos) = ctx.target_pos() else {
                    return Status::Failure;
                };
                let away = (ctx.position - target_pos).normalize_or_zero();
                let stand_off = if away == Vec2::ZERO {
                    // Стоим в цели — любой отход сгодится.
                    Vec2::X * ctx.combat_tuning.ranged_range
                } else {
                    away * ctx.combat_tuning.ranged_range
                };
                ctx.blackboard.nav_target = Some(target_pos + stand_off);
                Status::Success
            }

            CombatLeaf::SetCombatTargetPos => {
                let Some(target_pos) = ctx.target_pos() else {
                    return Status::Failure;
                };
                ctx.blackboard.nav_target = Some(target_pos);
                Status::Success
            }

            CombatLeaf::GoToNavTarget => {
                let Some(nav) = ctx.blackboard.nav_target else {
                    return Status::Failure;
                };
                if ctx.position.distance(nav) <= ctx.movement_tuning.stopping_distance {
                    return Status::Success;
                }
                if ctx.nav.path_blocked {
                    return Status::Failure;
                }
                ctx.intent.direction = (nav - ctx.position).normalize_or_zero();
                Status::Running
            }

            CombatLeaf::StopMoving => {
                ctx.intent.stop();
                Status::Success
            }

            CombatLeaf::FaceNavTarget => {
                let Some(nav) = ctx.blackboard.nav_target else {
                    return Status::Failure;
                };
                ctx.facing.face_toward(nav.x - ctx.position.x);
                Status::Success
            }

            CombatLeaf::StartMeleeAttack => {
                let base = ctx.combat_tuning.ready_attack_duration;
                let jitter = ctx.combat_tuning.ready_attack_jitter;
                let ready_duration = if jitter > 0.0 {
                    base + ctx.rng.gen_range(0.0..jitter)
                } else {
                    base
                };

                let aim = ctx.target_pos();
                let mut mctx = machine_ctx(ctx.dt, aim, ctx.combat_tuning, &mut *ctx.cues);
                match ctx
                    .combat
                    .change_state(CombatState::ready_attack(ready_duration), &mut mctx)
                {
                    Ok(()) => Status::Success,
                    Err(err) => {
                        crate::log_warning(&format!(
                            "{:?} melee attack rejected: {}",
                            ctx.actor, err
                        ));
                        Status::Failure
                    }
                }
            }

            CombatLeaf::StartRangedAttack => {
                let aim = ctx.target_pos();
                let mut mctx = machine_ctx(ctx.dt, aim, ctx.combat_tuning, &mut *ctx.cues);
                match ctx.combat.change_state(
                    CombatState::ready_ranged_attack(
                        ctx.combat_tuning.ranged_track_duration,
                        ctx.combat_tuning.ranged_lock_duration,
                    ),
                    &mut mctx,
                ) {
                    Ok(()) => Status::Success,
                    Err(err) => {
                        crate::log_warning(&format!(
                            "{:?} ranged attack rejected: {}",
                            ctx.actor, err
                        ));
                        Status::Failure
                    }
                }
            }

            CombatLeaf::ListenForTargetRangedAttacks => {
                if ctx.blackboard.combat_target.is_none() {
                    return Status::Failure;
                }
                ctx.blackboard.listen_for_target_attacks = true;
                Status::Success
            }
        }
    }
}
