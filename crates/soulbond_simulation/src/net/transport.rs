//! Transport seam: куда уходят и откуда приходят факты.
//!
//! Ядро не знает про сокеты — только контракт: доставка надёжная и
//! сохраняет порядок отправителя. `Scope::All` обязан вернуться и самому
//! отправителю (loopback), чтобы локальное применение шло тем же
//! inbound-путём, что и удалённое.

use bevy::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::net::{NetEvent, Scope};

pub trait Transport: Send + Sync {
    /// Отправляет факт получателям scope'а. Реализация обязана сохранить
    /// порядок отправки.
    fn send(&mut self, scope: Scope, event: NetEvent);

    /// Забирает накопившиеся входящие факты в порядке получения.
    fn poll(&mut self) -> Vec<NetEvent>;
}

/// Транспорт-ресурс (boxed, хост подставляет реализацию).
#[derive(Resource)]
pub struct NetLink(pub Box<dyn Transport>);

impl Default for NetLink {
    fn default() -> Self {
        Self(Box::new(NullTransport::default()))
    }
}

/// Одиночная сессия: пиров нет, `All` просто возвращается себе.
#[derive(Default)]
pub struct NullTransport {
    inbound: VecDeque<NetEvent>,
}

impl Transport for NullTransport {
    fn send(&mut self, scope: Scope, event: NetEvent) {
        if scope == Scope::All {
            self.inbound.push_back(event);
        }
        // Others в пустой комнате уходит в никуда
    }

    fn poll(&mut self) -> Vec<NetEvent> {
        self.inbound.drain(..).collect()
    }
}

type SharedQueue = Arc<Mutex<VecDeque<NetEvent>>>;

/// Пара связанных in-memory транспортов для двух пиров (тесты и
/// локальная отладка). Очереди FIFO — порядок отправителя сохраняется.
pub struct MemoryTransport {
    own_inbound: SharedQueue,
    peer_inbound: SharedQueue,
}

impl MemoryTransport {
    pub fn pair() -> (Self, Self) {
        let a: SharedQueue = Arc::new(Mutex::new(VecDeque::new()));
        let b: SharedQueue = Arc::new(Mutex::new(VecDeque::new()));

        (
            Self {
                own_inbound: a.clone(),
                peer_inbound: b.clone(),
            },
            Self {
                own_inbound: b,
                peer_inbound: a,
            },
        )
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, scope: Scope, event: NetEvent) {
        self.peer_inbound.lock().unwrap().push_back(event.clone());
        if scope == Scope::All {
            self.own_inbound.lock().unwrap().push_back(event);
        }
    }

    fn poll(&mut self) -> Vec<NetEvent> {
        self.own_inbound.lock().unwrap().drain(..).collect()
    }
}
