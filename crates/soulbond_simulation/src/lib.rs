//! SOULBOND Simulation Core
//!
//! ECS-ядро решений и контроля исполнения для сетевых акторов:
//! behavior trees + combat/movement state machines + network authority.
//!
//! HYBRID ARCHITECTURE:
//! - ECS = strategic layer (деревья, машины состояний, сетевые факты)
//! - внешний tactical layer = физика, рендер, инпут, сцены; его факты
//!   приходят событиями (`OracleEvent`), его чтение — кьюзы и
//!   `current_kind()`.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod behavior;
pub mod combat;
pub mod components;
pub mod fsm;
pub mod logger;
pub mod movement;
pub mod net;
pub mod oracle;
pub mod projectile;
pub mod session;

// Re-export базовых типов для удобства
pub use ai::{melee_combat_tree, ranged_combat_tree, AIPlugin, BehaviorCtx, Brain, CombatLeaf,
    PositionIndex};
pub use behavior::{BehaviorNode, BehaviorTree, Leaf, Status};
pub use combat::{
    BlockDirection, CombatCtx, CombatCue, CombatCueEvent, CombatMachine, CombatPlugin, CombatState,
    CombatStateKind, CombatTuning, DamageDealt, Guard, GuardInput, ReviveRequested,
};
pub use components::*;
pub use fsm::{State, StateCommand, StateMachine, TransitionError, TransitionTable};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};
pub use movement::{
    MovementArchetype, MovementCtx, MovementMachine, MovementPlugin, MovementState,
    MovementStateKind,
};
pub use net::{
    LevelId, LocalPeer, MemoryTransport, NetEvent, NetId, NetIdAllocator, NetLink, NetOwner,
    NetPlugin, NetRegistry, NullTransport, Outbox, PeerId, Scope, Transport,
};
pub use oracle::{OracleEvent, ProjectileContactKind};
pub use projectile::{Projectile, ProjectilePlugin};
pub use session::{PeerDisconnected, Session, SessionInput, SessionPlugin};

/// Фазы fixed тика. Один строгий порядок — основа и детерминизма, и
/// сетевой модели (inbound применяется до решений, outbound уходит
/// после всех).
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Применение входящих сетевых фактов.
    Inbound,
    /// Oracle-факты → perception/nav views + позиционный индекс.
    Perception,
    /// Оценка behavior trees.
    Decision,
    /// Combat машины + hit resolution.
    Combat,
    /// Movement машины + интеграция.
    Movement,
    /// Снаряды.
    Projectiles,
    /// Session-координация.
    Session,
    /// Отправка исходящих фактов.
    Outbound,
}

/// Главный plugin симуляции (объединяет все подсистемы).
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(60.0));

        // Детерминистичный RNG (seed по умолчанию, хост может заменить)
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app.init_resource::<CombatTuning>()
            .init_resource::<MovementTuning>();

        app.configure_sets(
            FixedUpdate,
            (
                SimSet::Inbound,
                SimSet::Perception,
                SimSet::Decision,
                SimSet::Combat,
                SimSet::Movement,
                SimSet::Projectiles,
                SimSet::Session,
                SimSet::Outbound,
            )
                .chain(),
        );

        // Подсистемы (ECS strategic layer)
        app.add_plugins((
            NetPlugin,
            AIPlugin,
            CombatPlugin,
            MovementPlugin,
            ProjectilePlugin,
            SessionPlugin,
        ));
    }
}

/// Детерминистичный RNG resource (seeded).
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции.
///
/// Время двигается вручную ровно на один fixed step за `app.update()` —
/// wall clock в детерминизме не участвует.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(bevy::time::TimeUpdateStrategy::ManualDuration(
            std::time::Duration::from_secs_f64(1.0 / 60.0),
        ));

    app
}

/// Snapshot компонентов мира для сравнения детерминизма.
///
/// Сортировка по Entity ID + Debug-формат: простейший устойчивый вид.
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
