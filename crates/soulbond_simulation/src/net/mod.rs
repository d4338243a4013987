//! Network authority layer.
//!
//! Ровно один пир симулирует данного актора (`NetOwner` против
//! `LocalPeer`); остальные получают только дискретные, уже принятые
//! факты (`NetEvent`) reliable-ordered доставкой и применяют их через те
//! же входные точки state machine, что и локальная логика — под guard'ом
//! по текущему состоянию, так что дубликат или устаревшее событие
//! превращается в no-op, а не в нелегальный переход.
//!
//! Пер-тиковая оценка дерева и Running-прогресс НЕ реплицируются —
//! только терминальные факты.

use bevy::prelude::*;

pub mod events;
pub mod sync;
pub mod transport;

pub use events::{LevelId, NetEvent, NetId, PeerId, Scope};
pub use sync::{apply_inbound, drain_outbox, NetIdAllocator, NetRegistry, Outbox};
pub use transport::{MemoryTransport, NetLink, NullTransport, Transport};

use crate::SimSet;

/// Локальный пир этой инстанции симуляции.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalPeer(pub PeerId);

impl Default for LocalPeer {
    fn default() -> Self {
        Self(PeerId(0))
    }
}

/// Authoritative пир данного актора. Только он тикает дерево и машины.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetOwner(pub PeerId);

/// Net Plugin: inbound в начале тика, outbound в конце.
///
/// Ресурсы ставятся только если хост не вставил свои (пара пиров в
/// тестах вставляет MemoryTransport и свои PeerId до плагина).
pub struct NetPlugin;

impl Plugin for NetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LocalPeer>()
            .init_resource::<NetLink>()
            .init_resource::<NetIdAllocator>()
            .init_resource::<NetRegistry>()
            .init_resource::<Outbox>();

        app.add_systems(FixedUpdate, apply_inbound.in_set(SimSet::Inbound))
            .add_systems(FixedUpdate, drain_outbox.in_set(SimSet::Outbound));
    }
}
