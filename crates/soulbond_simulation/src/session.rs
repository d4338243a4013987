//! Session-level coordination: restart handshake + level facts.
//!
//! Повторяет протокол комнаты: первый запрос рестарта уходит остальным
//! (`RequestRestart`, Others); запрос при уже просящем партнёре — это
//! подтверждение, и рестарт коммитится фактом `LoadLevel` всем. Выход
//! игрока возвращает всех в room-сцену. Сам лобби/румзы/свойства комнаты
//! — внешний слой; ядро только выставляет `pending_level` для внешнего
//! загрузчика сцен.

use bevy::prelude::*;

use crate::net::{LevelId, NetEvent, Outbox, PeerId, Scope};
use crate::SimSet;

#[derive(Resource, Debug, Default)]
pub struct Session {
    /// Партнёр просит рестарт (выставляется входящим RequestRestart).
    pub partner_requesting_restart: bool,
    /// Мы просим рестарт и ждём подтверждения.
    pub local_requesting_restart: bool,
    /// Сцена, которую внешний загрузчик должен применить.
    pub pending_level: Option<LevelId>,
}

impl Session {
    pub fn reset_restart_flags(&mut self) {
        self.partner_requesting_restart = false;
        self.local_requesting_restart = false;
    }

    /// Внешний слой забирает запрошенную сцену (однократно).
    pub fn take_pending_level(&mut self) -> Option<LevelId> {
        self.pending_level.take()
    }
}

/// UI-интент (кнопка рестарта и т.п. — вне ядра).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    AttemptRestart,
    CancelRestart,
}

/// Пир покинул сессию (транспортный слой).
#[derive(Event, Debug, Clone, Copy)]
pub struct PeerDisconnected {
    pub peer: PeerId,
}

/// System: restart handshake.
pub fn handle_session_input(
    mut inputs: EventReader<SessionInput>,
    mut session: ResMut<Session>,
    mut outbox: ResMut<Outbox>,
) {
    for input in inputs.read() {
        match input {
            SessionInput::AttemptRestart => {
                if session.partner_requesting_restart {
                    // Партнёр уже просил — это подтверждение, коммитим.
                    outbox.push(
                        Scope::All,
                        NetEvent::LoadLevel {
                            level: LevelId::Game,
                        },
                    );
                } else if !session.local_requesting_restart {
                    session.local_requesting_restart = true;
                    outbox.push(Scope::Others, NetEvent::RequestRestart);
                    crate::log("requesting level restart");
                }
            }
            SessionInput::CancelRestart => {
                if session.local_requesting_restart {
                    session.local_requesting_restart = false;
                    outbox.push(Scope::Others, NetEvent::CancelRestart);
                }
            }
        }
    }
}

/// System: выход пира возвращает оставшихся в room-сцену.
pub fn handle_peer_left(
    mut events: EventReader<PeerDisconnected>,
    mut outbox: ResMut<Outbox>,
) {
    for event in events.read() {
        crate::log_info(&format!("peer {:?} has left the game", event.peer));
        outbox.push(
            Scope::All,
            NetEvent::LoadLevel {
                level: LevelId::Room,
            },
        );
    }
}

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Session>()
            .add_event::<SessionInput>()
            .add_event::<PeerDisconnected>();

        app.add_systems(
            FixedUpdate,
            (handle_session_input, handle_peer_left)
                .chain()
                .in_set(SimSet::Session),
        );
    }
}
