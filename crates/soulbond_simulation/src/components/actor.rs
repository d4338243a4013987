//! Базовые компоненты акторов: Actor, Health, Position, Facing

use bevy::prelude::*;

/// Актор (игрок, враг) — базовый компонент для живых существ.
///
/// Required Components добавляют Health, Position, Facing, Velocity
/// автоматически.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, Position, Facing, Velocity)]
pub struct Actor {
    /// Stable ID фракции — perception считает врагами только чужие фракции.
    pub faction_id: u64,
}

/// Здоровье актора
///
/// Инвариант: 0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    /// Revive restores full health.
    pub fn restore_full(&mut self) {
        self.current = self.max;
    }
}

/// Позиция актора в мире (2D)
///
/// Симуляция кинематическая; collision response остаётся за внешним
/// physics слоем, сюда приходят только его факты (см. `oracle`).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Position(pub Vec2);

impl Position {
    pub fn distance_to(&self, other: Vec2) -> f32 {
        self.0.distance(other)
    }
}

/// Куда актор смотрит (2D side-view: либо вправо, либо влево).
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Facing {
    pub right: bool,
}

impl Default for Facing {
    fn default() -> Self {
        Self { right: true }
    }
}

impl Facing {
    /// Flip toward a horizontal direction; zero keeps the current facing.
    pub fn face_toward(&mut self, dx: f32) {
        if dx > 0.0 {
            self.right = true;
        } else if dx < 0.0 {
            self.right = false;
        }
    }

    pub fn horizontal(&self) -> f32 {
        if self.right {
            1.0
        } else {
            -1.0
        }
    }
}

/// Текущая скорость (выставляется movement состояниями, интегрируется
/// в FixedUpdate).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Velocity(pub Vec2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage() {
        let mut health = Health::new(100);
        health.take_damage(30);
        assert_eq!(health.current, 70);
        assert!(health.is_alive());

        health.take_damage(100); // saturating
        assert_eq!(health.current, 0);
        assert!(!health.is_alive());
    }

    #[test]
    fn test_health_restore_full() {
        let mut health = Health::new(80);
        health.take_damage(80);
        assert!(!health.is_alive());

        health.restore_full();
        assert_eq!(health.current, 80);
        assert!(health.is_alive());
    }

    #[test]
    fn test_facing_ignores_zero() {
        let mut facing = Facing::default();
        facing.face_toward(-1.0);
        assert!(!facing.right);

        facing.face_toward(0.0);
        assert!(!facing.right); // без изменений

        facing.face_toward(0.5);
        assert!(facing.right);
        assert_eq!(facing.horizontal(), 1.0);
    }
}
