//! Facts from the external physics/world layer.
//!
//! Симуляция не владеет физикой: видимость, проходимость пути, контакты
//! и опору под ногами считает внешний tactical слой и присылает сюда
//! событиями. Ядро читает их как синхронные, side-effect-free факты
//! (perception/nav views обновляются в начале тика).

use bevy::prelude::*;

/// События от внешнего world oracle.
#[derive(Event, Debug, Clone)]
pub enum OracleEvent {
    /// Цель вошла в поле зрения наблюдателя.
    TargetSpotted { observer: Entity, target: Entity },

    /// Цель вышла из поля зрения (или пропала).
    TargetLost { observer: Entity, target: Entity },

    /// Путь актора к его nav target заблокирован/разблокирован.
    PathBlocked { actor: Entity },
    PathClear { actor: Entity },

    /// Изменилась опора под ногами (для ground/air движений).
    GroundedChanged { actor: Entity, grounded: bool },

    /// Melee swing задел цель (hitbox collision у внешнего слоя).
    MeleeContact { attacker: Entity, target: Entity },

    /// Снаряд столкнулся с чем-то.
    ProjectileContact {
        projectile: Entity,
        contact: ProjectileContactKind,
    },
}

/// Во что попал снаряд.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileContactKind {
    Actor(Entity),
    Obstacle,
}
