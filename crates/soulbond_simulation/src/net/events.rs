//! Wire-типы: идентификаторы и дискретные факты.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Участник сессии.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub u8);

/// Стабильный кросс-пировый идентификатор реплицируемой entity.
///
/// Старшие биты — пир-аллокатор, так что два пира никогда не выдадут
/// один id (см. `NetIdAllocator`).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetId(pub u64);

/// Scope доставки: как у оригинальных RPC — всем (включая отправителя,
/// через loopback) или всем кроме отправителя.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    All,
    Others,
}

/// Сцены, которые сессия может запросить у внешнего загрузчика.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelId {
    Room,
    Game,
}

/// Именованный, уже принятый факт. Payload минимален — ровно то, что
/// нужно для воспроизведения факта, без диффов состояния.
///
/// Доставка reliable-ordered per sender; между отправителями порядок не
/// гарантируется, поэтому применение всегда перепроверяет локальное
/// состояние (см. `apply_inbound`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetEvent {
    /// Авторитетный пир запустил снаряд.
    ProjectileSpawned {
        projectile: NetId,
        shooter: NetId,
        origin: [f32; 2],
        direction: [f32; 2],
    },

    /// Жизненный цикл снаряда закончился (дистанция или контакт).
    ProjectileExpired { projectile: NetId },

    /// Актор выбит в Death.
    KnockedDown { actor: NetId },

    /// Актор оживлён партнёром. Применяется только из Death.
    Revive { actor: NetId },

    /// Партнёр просит рестарт уровня.
    RequestRestart,
    CancelRestart,

    /// Загрузить сцену (рестарт подтверждён, выход игрока и т.п.).
    LoadLevel { level: LevelId },
}
