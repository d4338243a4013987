//! Combat module: action state machine + hit resolution.
//!
//! ECS ответственность:
//! - Combat state machine (ready/attack/block/death граф)
//! - Hit resolution: block-vs-hurt, урон, knockdown
//! - Events: CombatCueEvent, DamageDealt
//!
//! Внешний tactical слой присылает contact-факты (OracleEvent) и читает
//! только кьюзы + `current_kind()` для анимации.

use bevy::prelude::*;
use std::ops::{Deref, DerefMut};

pub mod states;
pub mod systems;

mod states_tests;

pub use states::{
    combat_transition_table, BlockDirection, CombatCtx, CombatCue, CombatState, CombatStateKind,
};
pub use systems::{
    apply_guard_input, execute_combat_machines, request_revive, resolve_melee_contacts,
};

use crate::fsm::StateMachine;
use crate::SimSet;

/// Combat action state machine одного актора.
///
/// `None` внутри — "никакого действия": актор свободен. Всё, что слой
/// анимации/UI может читать — `current_kind()` и кьюзы.
#[derive(Component)]
pub struct CombatMachine {
    machine: StateMachine<CombatState>,
}

impl CombatMachine {
    pub fn new() -> Self {
        Self {
            machine: StateMachine::new(combat_transition_table()),
        }
    }
}

impl Default for CombatMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for CombatMachine {
    type Target = StateMachine<CombatState>;

    fn deref(&self) -> &Self::Target {
        &self.machine
    }
}

impl DerefMut for CombatMachine {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.machine
    }
}

/// Состояние гарда актора (пишется входным слоем, читается Block/BlockHit).
#[derive(Component, Debug, Clone)]
pub struct Guard {
    pub held: bool,
    pub direction: BlockDirection,
}

impl Default for Guard {
    fn default() -> Self {
        Self {
            held: false,
            direction: BlockDirection::Forward,
        }
    }
}

/// Глобальный combat tuning.
#[derive(Resource, Debug, Clone)]
pub struct CombatTuning {
    /// Дистанция melee удара
    pub melee_range: f32,
    /// Запас дистанции пока актор уже замахивается (чтобы не дёргался
    /// от мелкого дрейфа цели)
    pub ready_range_slack: f32,
    /// Предпочтительная дистанция стрельбы
    pub ranged_range: f32,
    /// База телеграфа melee атаки
    pub ready_attack_duration: f32,
    /// Случайная добавка к телеграфу (0..jitter, seeded RNG)
    pub ready_attack_jitter: f32,
    /// Длительность самого действия (замах/выстрел + recovery)
    pub attack_duration: f32,
    /// Ranged: трекинг цели до лока
    pub ranged_track_duration: f32,
    /// Ranged: пауза между локом и выстрелом (окно уворота)
    pub ranged_lock_duration: f32,
    /// Hit-stun блока
    pub block_hit_duration: f32,
    pub melee_damage: u32,
    pub projectile_damage: u32,
    pub projectile_speed: f32,
    pub projectile_max_distance: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            melee_range: 1.8,
            ready_range_slack: 0.6,
            ranged_range: 6.0,
            ready_attack_duration: 0.4,
            ready_attack_jitter: 0.3,
            attack_duration: 0.6,
            ranged_track_duration: 0.5,
            ranged_lock_duration: 0.35,
            block_hit_duration: 0.5,
            melee_damage: 15,
            projectile_damage: 10,
            projectile_speed: 9.0,
            projectile_max_distance: 12.0,
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// Animation-facing факт из state hooks, адресованный конкретному актору.
#[derive(Event, Debug, Clone)]
pub struct CombatCueEvent {
    pub actor: Entity,
    pub cue: CombatCue,
}

/// Событие: урон нанесен (для UI/звука/эффектов).
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub target_died: bool,
}

/// Входной слой зажал/отпустил гард (вне ядра — input binding).
#[derive(Event, Debug, Clone)]
pub struct GuardInput {
    pub actor: Entity,
    pub held: bool,
    pub direction: BlockDirection,
}

/// Партнёр инициировал revive (interactable слой — вне ядра).
#[derive(Event, Debug, Clone)]
pub struct ReviveRequested {
    pub target: Entity,
}

/// Combat Plugin.
///
/// Порядок выполнения:
/// 1. apply_guard_input — вход гарда + ветка BlockHit
/// 2. execute_combat_machines — Execute текущих состояний
/// 3. resolve_melee_contacts — contact-факты → block/hurt/knockdown
/// 4. request_revive — интент revive → broadcast
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CombatCueEvent>()
            .add_event::<DamageDealt>()
            .add_event::<GuardInput>()
            .add_event::<ReviveRequested>();

        app.add_systems(
            FixedUpdate,
            (
                apply_guard_input,
                execute_combat_machines,
                resolve_melee_contacts,
                request_revive,
            )
                .chain()
                .in_set(SimSet::Combat),
        );
    }
}
