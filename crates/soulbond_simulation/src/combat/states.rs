//! Combat action states and their transition graph.
//!
//! Состояния — tagged variants с таймерами внутри (см. `fsm`): машина
//! применяет то, что состояние вернуло из Execute. Все наружу видимые
//! факты уходят кьюзами в `CombatCtx::cues`; слой анимации читает только
//! их и `current_kind()`.
//!
//! # Graph
//!
//! ```text
//! (inactive) → ReadyAttack ─────→ Action → (inactive)
//! (inactive) → ReadyRangedAttack ↗
//! (inactive) → Block ⇄ BlockHit → (inactive)
//! любое ──force──→ Death → (inactive, только через revive)
//! ```

use bevy::prelude::*;

use crate::combat::CombatTuning;
use crate::fsm::{State, StateCommand, TransitionTable};

/// Направление блока.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDirection {
    /// Гард против горизонтальных ударов спереди.
    Forward,
    /// Гард против ударов сверху (пикирующий дракон).
    Upwards,
}

/// Closed tag для transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatStateKind {
    ReadyAttack,
    ReadyRangedAttack,
    Action,
    Block,
    BlockHit,
    Death,
}

/// Animation-facing facts emitted by state hooks. The simulation core has
/// no render surface; these plus `current_kind()` are the whole read side.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatCue {
    ReadyAttackStarted { ranged: bool },
    /// Ranged telegraph locked its firing solution.
    TargetLocked { pos: Vec2 },
    /// Авторитетный пир спавнит снаряд по этому кью.
    RangedAttackLaunched { target_pos: Vec2 },
    AttackStarted { ranged: bool },
    ActionFinished,
    BlockStarted { direction: BlockDirection },
    BlockEnded,
    BlockHitStarted,
    BlockHitEnded,
    Died,
    Revived,
}

/// Shared mutable context handed to combat state hooks.
pub struct CombatCtx<'a> {
    pub dt: f32,
    /// Гард всё ещё зажат (входной слой пишет в `Guard`).
    pub guard_held: bool,
    /// Текущая позиция цели для ranged lock (None = цель потеряна).
    pub aim_pos: Option<Vec2>,
    pub tuning: &'a CombatTuning,
    pub cues: &'a mut Vec<CombatCue>,
}

/// Combat action state. `None` в машине значит "никакого действия" —
/// актор свободен двигаться и начинать новые действия.
#[derive(Debug, Clone, PartialEq)]
pub enum CombatState {
    /// Melee telegraph: таймер до начала замаха.
    ReadyAttack { elapsed: f32, ready_duration: f32 },

    /// Ranged telegraph: трекает цель, лочит позицию, стреляет.
    ReadyRangedAttack {
        elapsed: f32,
        track_duration: f32,
        lock_duration: f32,
        locked_target_pos: Option<Vec2>,
    },

    /// Generic in-progress action (замах, выстрел, recovery).
    Action { remaining: f32, ranged: bool },

    /// Держит гард пока зажат; входящий удар переводит в BlockHit извне.
    Block { direction: BlockDirection },

    /// Hit-stun фиксированной длительности с момента входа.
    ///
    /// `will_return_to_block` выставляется другими системами пока стан
    /// активен (отпущенный гард ⇒ false); сам стан его не трогает.
    BlockHit {
        elapsed: f32,
        duration: f32,
        direction: BlockDirection,
        will_return_to_block: bool,
    },

    /// Терминальное до revive.
    Death,
}

impl CombatState {
    pub fn ready_attack(ready_duration: f32) -> Self {
        CombatState::ReadyAttack {
            elapsed: 0.0,
            ready_duration,
        }
    }

    pub fn ready_ranged_attack(track_duration: f32, lock_duration: f32) -> Self {
        CombatState::ReadyRangedAttack {
            elapsed: 0.0,
            track_duration,
            lock_duration,
            locked_target_pos: None,
        }
    }

    pub fn action(duration: f32, ranged: bool) -> Self {
        CombatState::Action {
            remaining: duration,
            ranged,
        }
    }

    pub fn block(direction: BlockDirection) -> Self {
        CombatState::Block { direction }
    }

    pub fn block_hit(duration: f32, direction: BlockDirection) -> Self {
        CombatState::BlockHit {
            elapsed: 0.0,
            duration,
            direction,
            // enter выставит true; см. on_enter
            will_return_to_block: true,
        }
    }

    pub fn death() -> Self {
        CombatState::Death
    }

    /// External setter for the hit-stun branch flag. No-op in other states.
    pub fn set_will_return_to_block(&mut self, value: bool) {
        if let CombatState::BlockHit {
            will_return_to_block,
            ..
        } = self
        {
            *will_return_to_block = value;
        }
    }

    pub fn locked_target_pos(&self) -> Option<Vec2> {
        match self {
            CombatState::ReadyRangedAttack {
                locked_target_pos, ..
            } => *locked_target_pos,
            _ => None,
        }
    }

    pub fn block_direction(&self) -> Option<BlockDirection> {
        match self {
            CombatState::Block { direction } => Some(*direction),
            CombatState::BlockHit { direction, .. } => Some(*direction),
            _ => None,
        }
    }
}

impl State for CombatState {
    type Kind = CombatStateKind;
    type Ctx<'a> = CombatCtx<'a>;

    fn kind(&self) -> CombatStateKind {
        match self {
            CombatState::ReadyAttack { .. } => CombatStateKind::ReadyAttack,
            CombatState::ReadyRangedAttack { .. } => CombatStateKind::ReadyRangedAttack,
            CombatState::Action { .. } => CombatStateKind::Action,
            CombatState::Block { .. } => CombatStateKind::Block,
            CombatState::BlockHit { .. } => CombatStateKind::BlockHit,
            CombatState::Death => CombatStateKind::Death,
        }
    }

    fn on_enter(&mut self, ctx: &mut CombatCtx<'_>) {
        match self {
            CombatState::ReadyAttack { .. } => {
                ctx.cues.push(CombatCue::ReadyAttackStarted { ranged: false });
            }
            CombatState::ReadyRangedAttack { .. } => {
                ctx.cues.push(CombatCue::ReadyAttackStarted { ranged: true });
            }
            CombatState::Action { ranged, .. } => {
                ctx.cues.push(CombatCue::AttackStarted { ranged: *ranged });
            }
            CombatState::Block { direction } => {
                ctx.cues.push(CombatCue::BlockStarted {
                    direction: *direction,
                });
            }
            CombatState::BlockHit {
                will_return_to_block,
                ..
            } => {
                *will_return_to_block = true;
                ctx.cues.push(CombatCue::BlockHitStarted);
            }
            CombatState::Death => {
                ctx.cues.push(CombatCue::Died);
            }
        }
    }

    fn on_execute(&mut self, ctx: &mut CombatCtx<'_>) -> StateCommand<Self> {
        match self {
            CombatState::ReadyAttack {
                elapsed,
                ready_duration,
            } => {
                *elapsed += ctx.dt;
                if *elapsed >= *ready_duration {
                    StateCommand::ChangeTo(CombatState::action(ctx.tuning.attack_duration, false))
                } else {
                    StateCommand::Stay
                }
            }

            CombatState::ReadyRangedAttack {
                elapsed,
                track_duration,
                lock_duration,
                locked_target_pos,
            } => {
                *elapsed += ctx.dt;

                if locked_target_pos.is_none() && *elapsed >= *track_duration {
                    match ctx.aim_pos {
                        Some(pos) => {
                            *locked_target_pos = Some(pos);
                            ctx.cues.push(CombatCue::TargetLocked { pos });
                        }
                        // Цель потеряна до лока — не стреляем вслепую.
                        None => return StateCommand::Exit,
                    }
                }

                if let Some(pos) = *locked_target_pos {
                    if *elapsed >= *track_duration + *lock_duration {
                        ctx.cues
                            .push(CombatCue::RangedAttackLaunched { target_pos: pos });
                        return StateCommand::ChangeTo(CombatState::action(
                            ctx.tuning.attack_duration,
                            true,
                        ));
                    }
                }

                StateCommand::Stay
            }

            CombatState::Action { remaining, .. } => {
                *remaining -= ctx.dt;
                if *remaining <= 0.0 {
                    StateCommand::Exit
                } else {
                    StateCommand::Stay
                }
            }

            CombatState::Block { .. } => {
                if ctx.guard_held {
                    StateCommand::Stay
                } else {
                    StateCommand::Exit
                }
            }

            CombatState::BlockHit {
                elapsed,
                duration,
                direction,
                will_return_to_block,
            } => {
                *elapsed += ctx.dt;
                if *elapsed > *duration {
                    if *will_return_to_block {
                        StateCommand::ChangeTo(CombatState::block(*direction))
                    } else {
                        StateCommand::Exit
                    }
                } else {
                    StateCommand::Stay
                }
            }

            CombatState::Death => StateCommand::Stay,
        }
    }

    fn on_exit(&mut self, ctx: &mut CombatCtx<'_>) {
        match self {
            CombatState::Action { .. } => ctx.cues.push(CombatCue::ActionFinished),
            CombatState::Block { .. } => ctx.cues.push(CombatCue::BlockEnded),
            CombatState::BlockHit { .. } => ctx.cues.push(CombatCue::BlockHitEnded),
            // Из Death выходят только через revive.
            CombatState::Death => ctx.cues.push(CombatCue::Revived),
            _ => {}
        }
    }
}

/// Declared combat transition graph. Death is deliberately absent from the
/// normal rows: knockdown is applied through the forced entry point.
pub fn combat_transition_table() -> TransitionTable<CombatStateKind> {
    TransitionTable::new()
        .allow(CombatStateKind::ReadyAttack, [CombatStateKind::Action])
        .allow(CombatStateKind::ReadyRangedAttack, [CombatStateKind::Action])
        .allow(CombatStateKind::Action, [])
        .allow(CombatStateKind::Block, [CombatStateKind::BlockHit])
        .allow(CombatStateKind::BlockHit, [CombatStateKind::Block])
        .allow(CombatStateKind::Death, [])
}
