//! Behavior tree core (status, nodes, tree driver)
//!
//! Чистый Rust без ECS зависимостей — деревья живут внутри компонентов,
//! но сами ничего не знают про bevy. Leaf vocabulary подключается через
//! generic параметр (см. `ai::leaves`).

pub mod node;
pub mod status;
pub mod tree;

pub use node::{BehaviorNode, Leaf};
pub use status::Status;
pub use tree::BehaviorTree;
