//! Movement state machines (ground + air archetypes) и кинематика.
//!
//! Два графа на одном наборе состояний:
//! - ground: Grounded ⇄ Jumping/Falling — обычная платформенная петля;
//! - air: Airborne со строкой без переходов — свободный полёт, из
//!   которого выбивает только внешняя сила. Включение гравитации (смерть
//!   дракона) применяется через forced entry point, выключение (revive)
//!   возвращает полёт тем же способом.
//!
//! Состояния пишут скорость; интеграция позиции — отдельной системой в
//! конце тика. Коллизии и опора под ногами приходят фактами от oracle.

use bevy::prelude::*;

use crate::components::{Health, MoveIntent, MovementTuning, NavProbe, Position, Velocity};
use crate::fsm::{State, StateCommand, StateMachine, TransitionTable};
use crate::net::{LocalPeer, NetOwner};
use crate::SimSet;

// ============================================================================
// States
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementStateKind {
    Grounded,
    Jumping,
    Falling,
    Airborne,
}

/// Shared mutable context for movement state hooks.
pub struct MovementCtx<'a> {
    pub dt: f32,
    /// Кэшированный интент (-1..1 по осям).
    pub intent: Vec2,
    /// Опора под ногами (oracle).
    pub grounded: bool,
    /// Может ли этот актор приземляться (дракон — нет).
    pub can_land: bool,
    pub tuning: &'a MovementTuning,
    pub velocity: &'a mut Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MovementState {
    /// Ходьба по земле.
    Grounded,
    /// Восходящая фаза прыжка.
    Jumping { vertical_speed: f32 },
    /// Свободное падение.
    Falling { vertical_speed: f32 },
    /// Свободный 2D полёт.
    Airborne,
}

impl MovementState {
    pub fn grounded() -> Self {
        MovementState::Grounded
    }

    pub fn jumping(jump_speed: f32) -> Self {
        MovementState::Jumping {
            vertical_speed: jump_speed,
        }
    }

    pub fn falling() -> Self {
        MovementState::Falling {
            vertical_speed: 0.0,
        }
    }

    pub fn airborne() -> Self {
        MovementState::Airborne
    }
}

impl State for MovementState {
    type Kind = MovementStateKind;
    type Ctx<'a> = MovementCtx<'a>;

    fn kind(&self) -> MovementStateKind {
        match self {
            MovementState::Grounded => MovementStateKind::Grounded,
            MovementState::Jumping { .. } => MovementStateKind::Jumping,
            MovementState::Falling { .. } => MovementStateKind::Falling,
            MovementState::Airborne => MovementStateKind::Airborne,
        }
    }

    fn on_execute(&mut self, ctx: &mut MovementCtx<'_>) -> StateCommand<Self> {
        match self {
            MovementState::Grounded => {
                ctx.velocity.x = ctx.intent.x * ctx.tuning.walk_speed;
                ctx.velocity.y = 0.0;

                if ctx.intent.y > 0.5 {
                    return StateCommand::ChangeTo(MovementState::jumping(ctx.tuning.jump_speed));
                }
                if !ctx.grounded {
                    return StateCommand::ChangeTo(MovementState::falling());
                }
                StateCommand::Stay
            }

            MovementState::Jumping { vertical_speed } => {
                *vertical_speed -= ctx.tuning.gravity * ctx.dt;
                ctx.velocity.x = ctx.intent.x * ctx.tuning.walk_speed;
                ctx.velocity.y = *vertical_speed;

                if *vertical_speed <= 0.0 {
                    return StateCommand::ChangeTo(MovementState::falling());
                }
                StateCommand::Stay
            }

            MovementState::Falling { vertical_speed } => {
                *vertical_speed -= ctx.tuning.gravity * ctx.dt;
                ctx.velocity.x = ctx.intent.x * ctx.tuning.walk_speed;
                ctx.velocity.y = *vertical_speed;

                if ctx.grounded && ctx.can_land {
                    ctx.velocity.y = 0.0;
                    return StateCommand::ChangeTo(MovementState::grounded());
                }
                StateCommand::Stay
            }

            MovementState::Airborne => {
                let dir = if ctx.intent.length_squared() > 1.0 {
                    ctx.intent.normalize()
                } else {
                    ctx.intent
                };
                *ctx.velocity = dir * ctx.tuning.fly_speed;
                StateCommand::Stay
            }
        }
    }
}

// ============================================================================
// Archetype machines
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementArchetype {
    Ground,
    Air,
}

/// Движковая обёртка: машина + архетип + гравитационный флаг дракона.
#[derive(Component)]
pub struct MovementMachine {
    pub machine: StateMachine<MovementState>,
    pub archetype: MovementArchetype,
    gravity_enabled: bool,
}

impl MovementMachine {
    /// Ground loop: полный платформенный граф.
    pub fn ground() -> Self {
        let table = TransitionTable::new()
            .allow(
                MovementStateKind::Grounded,
                [MovementStateKind::Jumping, MovementStateKind::Falling],
            )
            .allow(
                MovementStateKind::Jumping,
                [MovementStateKind::Falling, MovementStateKind::Grounded],
            )
            .allow(MovementStateKind::Falling, [MovementStateKind::Grounded]);

        Self {
            machine: StateMachine::new(table),
            archetype: MovementArchetype::Ground,
            gravity_enabled: true,
        }
    }

    /// Air loop: единственная строка без переходов — из Airborne не ведёт
    /// ни один нормальный переход, падение туда заносит только сила.
    pub fn air() -> Self {
        let table = TransitionTable::new().allow(MovementStateKind::Airborne, []);

        Self {
            machine: StateMachine::new(table),
            archetype: MovementArchetype::Air,
            gravity_enabled: false,
        }
    }

    /// Начальное состояние при спавне (вход из inactive всегда легален).
    pub fn enter_initial(&mut self, ctx: &mut MovementCtx<'_>) {
        let initial = match self.archetype {
            MovementArchetype::Ground => MovementState::grounded(),
            MovementArchetype::Air => MovementState::airborne(),
        };
        // Машина только что создана, current = None — reject невозможен.
        self.machine
            .change_state(initial, ctx)
            .expect("initial movement state from inactive");
    }

    pub fn is_gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Включение гравитации выбивает летуна в Falling мимо таблицы
    /// (строка Airborne пуста) — явный forced transition.
    pub fn toggle_gravity(&mut self, enabled: bool, ctx: &mut MovementCtx<'_>) {
        if self.archetype != MovementArchetype::Air {
            return;
        }
        self.gravity_enabled = enabled;
        if enabled {
            self.machine.force_state(MovementState::falling(), ctx);
        }
    }

    /// Возврат в полёт после revive; Falling не объявляет переходов,
    /// поэтому тоже через forced entry point.
    pub fn take_flight(&mut self, ctx: &mut MovementCtx<'_>) {
        if self.archetype != MovementArchetype::Air {
            return;
        }
        self.machine.force_state(MovementState::airborne(), ctx);
    }
}

// ============================================================================
// Systems
// ============================================================================

/// System: Execute текущего movement состояния у своих (authoritative)
/// актёров. Мёртвые пропускаются только для ground — падающий после
/// смерти дракон продолжает падать.
pub fn execute_movement_machines(
    mut query: Query<(
        Entity,
        &NetOwner,
        &mut MovementMachine,
        &MoveIntent,
        &NavProbe,
        &mut Velocity,
        &Health,
    )>,
    local: Res<LocalPeer>,
    tuning: Res<MovementTuning>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();

    for (entity, owner, mut mover, intent, probe, mut velocity, health) in query.iter_mut() {
        if owner.0 != local.0 {
            continue;
        }

        let intent_dir = if health.is_alive() {
            intent.direction
        } else {
            Vec2::ZERO
        };

        let can_land = mover.archetype == MovementArchetype::Ground;
        let mut ctx = MovementCtx {
            dt,
            intent: intent_dir,
            grounded: probe.grounded,
            can_land,
            tuning: &tuning,
            velocity: &mut velocity.0,
        };

        if mover.machine.is_inactive() {
            mover.enter_initial(&mut ctx);
        }

        if let Err(err) = mover.machine.execute(&mut ctx) {
            crate::log_warning(&format!("movement machine {:?}: {}", entity, err));
        }
    }
}

/// System: интеграция позиций из скоростей (kinematic step).
pub fn integrate_positions(
    mut query: Query<(&NetOwner, &mut Position, &Velocity)>,
    local: Res<LocalPeer>,
    time: Res<Time<Fixed>>,
) {
    let dt = time.delta_secs();
    for (owner, mut position, velocity) in query.iter_mut() {
        if owner.0 != local.0 {
            continue;
        }
        position.0 += velocity.0 * dt;
    }
}

/// Movement Plugin: state machines + интеграция, строго в этом порядке.
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (execute_movement_machines, integrate_positions)
                .chain()
                .in_set(SimSet::Movement),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        dt: f32,
        intent: Vec2,
        grounded: bool,
        can_land: bool,
        tuning: &'a MovementTuning,
        velocity: &'a mut Vec2,
    ) -> MovementCtx<'a> {
        MovementCtx {
            dt,
            intent,
            grounded,
            can_land,
            tuning,
            velocity,
        }
    }

    #[test]
    fn ground_loop_jump_then_land() {
        let tuning = MovementTuning::default();
        let mut velocity = Vec2::ZERO;
        let mut mover = MovementMachine::ground();

        let mut c = ctx(0.1, Vec2::ZERO, true, true, &tuning, &mut velocity);
        mover.enter_initial(&mut c);
        assert_eq!(
            mover.machine.current_kind(),
            Some(MovementStateKind::Grounded)
        );

        // Прыжок
        let mut c = ctx(0.1, Vec2::new(0.0, 1.0), true, true, &tuning, &mut velocity);
        mover.machine.execute(&mut c).unwrap();
        assert_eq!(
            mover.machine.current_kind(),
            Some(MovementStateKind::Jumping)
        );

        // Вершина дуги: vertical_speed истощается → Falling
        for _ in 0..10 {
            let mut c = ctx(0.1, Vec2::ZERO, false, true, &tuning, &mut velocity);
            mover.machine.execute(&mut c).unwrap();
        }
        assert_eq!(
            mover.machine.current_kind(),
            Some(MovementStateKind::Falling)
        );

        // Опора вернулась → Grounded
        let mut c = ctx(0.1, Vec2::ZERO, true, true, &tuning, &mut velocity);
        mover.machine.execute(&mut c).unwrap();
        assert_eq!(
            mover.machine.current_kind(),
            Some(MovementStateKind::Grounded)
        );
    }

    #[test]
    fn airborne_declares_no_transitions() {
        let tuning = MovementTuning::default();
        let mut velocity = Vec2::ZERO;
        let mut mover = MovementMachine::air();

        let mut c = ctx(0.1, Vec2::ZERO, false, false, &tuning, &mut velocity);
        mover.enter_initial(&mut c);

        let row = mover
            .machine
            .transitions()
            .allowed_from(MovementStateKind::Airborne)
            .unwrap();
        assert!(row.is_empty());

        // Нормальный переход из Airborne отклоняется...
        let err = mover
            .machine
            .change_state(MovementState::falling(), &mut c)
            .unwrap_err();
        assert_eq!(err.from, MovementStateKind::Airborne);
        assert_eq!(
            mover.machine.current_kind(),
            Some(MovementStateKind::Airborne)
        );

        // ...а гравитация выбивает силой.
        mover.toggle_gravity(true, &mut c);
        assert_eq!(
            mover.machine.current_kind(),
            Some(MovementStateKind::Falling)
        );
        assert!(mover.is_gravity_enabled());
    }

    #[test]
    fn air_faller_never_lands() {
        let tuning = MovementTuning::default();
        let mut velocity = Vec2::ZERO;
        let mut mover = MovementMachine::air();

        let mut c = ctx(0.1, Vec2::ZERO, false, false, &tuning, &mut velocity);
        mover.enter_initial(&mut c);
        mover.toggle_gravity(true, &mut c);

        // Опора есть, но can_land=false — остаёмся в Falling.
        for _ in 0..5 {
            let mut c = ctx(0.1, Vec2::ZERO, true, false, &tuning, &mut velocity);
            mover.machine.execute(&mut c).unwrap();
        }
        assert_eq!(
            mover.machine.current_kind(),
            Some(MovementStateKind::Falling)
        );

        // Revive: гравитация off + возврат в полёт.
        let mut c = ctx(0.1, Vec2::ZERO, true, false, &tuning, &mut velocity);
        mover.toggle_gravity(false, &mut c);
        mover.take_flight(&mut c);
        assert_eq!(
            mover.machine.current_kind(),
            Some(MovementStateKind::Airborne)
        );
    }
}
