//! AI-facing components: blackboard + oracle views.

use bevy::prelude::*;

/// Per-actor blackboard shared by behavior tree leaves.
///
/// Все ссылки слабые: `combat_target` — это отношение, не владение;
/// чужой актор не продлевает жизнь и перепроверяется каждый тик.
#[derive(Component, Debug, Clone, Default)]
pub struct Blackboard {
    /// Текущая боевая цель (выбирается `AcquireVisibleTarget`).
    pub combat_target: Option<Entity>,
    /// Куда идём/на кого смотрим.
    pub nav_target: Option<Vec2>,
    /// Setup-лист ranged дерева: реагировать на выстрелы цели.
    pub listen_for_target_attacks: bool,
}

/// Видимые враги (поддерживается из OracleEvent::TargetSpotted/TargetLost,
/// фильтр по фракциям, трупы выметаются каждый тик).
#[derive(Component, Debug, Clone, Default)]
pub struct Perception {
    pub visible: Vec<Entity>,
}

/// Синхронный view навигационных фактов внешнего слоя.
#[derive(Component, Debug, Clone)]
pub struct NavProbe {
    /// Путь к текущему nav target непроходим.
    pub path_blocked: bool,
    /// Есть опора под ногами.
    pub grounded: bool,
}

impl Default for NavProbe {
    fn default() -> Self {
        Self {
            path_blocked: false,
            grounded: true,
        }
    }
}
