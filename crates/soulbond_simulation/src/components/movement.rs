//! Movement компоненты: интент движения + tuning

use bevy::prelude::*;

/// Кэшированный интент движения актора (horizontal/vertical, -1..1).
///
/// Пишется leaf нодами дерева (AI) или входным слоем (игроки, вне ядра);
/// читается movement состояниями при Execute. Сам по себе ничего не
/// двигает — скорость выставляет текущее состояние движения.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MoveIntent {
    pub direction: Vec2,
}

impl MoveIntent {
    pub fn stop(&mut self) {
        self.direction = Vec2::ZERO;
    }
}

/// Глобальный tuning движения.
#[derive(Resource, Debug, Clone)]
pub struct MovementTuning {
    /// Скорость ходьбы по земле (m/s)
    pub walk_speed: f32,
    /// Скорость свободного полёта (m/s)
    pub fly_speed: f32,
    /// Начальная вертикальная скорость прыжка (m/s)
    pub jump_speed: f32,
    /// Гравитация (m/s^2), положительная величина
    pub gravity: f32,
    /// Дистанция на которой nav target считается достигнутым
    pub stopping_distance: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            walk_speed: 3.0,
            fly_speed: 4.0,
            jump_speed: 6.0,
            gravity: 20.0,
            stopping_distance: 1.4,
        }
    }
}
