//! ECS components для игровых entity
//!
//! Организация по доменам:
//! - actor: базовые характеристики (faction, health, позиция, facing)
//! - movement: интент движения и tuning
//! - ai: blackboard и oracle views (Perception, NavProbe)

pub mod actor;
pub mod ai;
pub mod movement;

pub use actor::*;
pub use ai::*;
pub use movement::*;
