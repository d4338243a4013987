//! Behavior tree driver.

use crate::behavior::node::{BehaviorNode, Leaf};
use crate::behavior::Status;

/// Owns a root node and an optional one-time setup node.
///
/// The setup node (e.g. registering interest in a target's attacks) runs
/// exactly once for the tree's lifetime, before the first root tick. A full
/// root Success/Failure cycle does not re-arm it.
///
/// The tree itself has no Success/Failure semantics at the top level — its
/// observable effect is entirely the leaf actions and state machine
/// transitions it triggers. Lifetime equals the owning actor's lifetime.
pub struct BehaviorTree<L: Leaf> {
    setup: Option<BehaviorNode<L>>,
    root: BehaviorNode<L>,
    setup_done: bool,
}

impl<L: Leaf> BehaviorTree<L> {
    pub fn new(root: BehaviorNode<L>) -> Self {
        Self {
            setup: None,
            root,
            setup_done: false,
        }
    }

    pub fn with_setup(setup: BehaviorNode<L>, root: BehaviorNode<L>) -> Self {
        Self {
            setup: Some(setup),
            root,
            setup_done: false,
        }
    }

    /// One evaluation pass, called once per fixed simulation step by the
    /// owning peer. The root's result is discarded.
    pub fn tick(&mut self, ctx: &mut L::Ctx<'_>) {
        let _ = self.tick_reporting(ctx);
    }

    /// Ticks the root and reports its status. Used by tests that assert on
    /// propagation; gameplay code goes through [`BehaviorTree::tick`].
    pub fn tick_reporting(&mut self, ctx: &mut L::Ctx<'_>) -> Status {
        if !self.setup_done {
            if let Some(setup) = self.setup.as_mut() {
                let _ = setup.tick(ctx);
            }
            self.setup_done = true;
        }
        self.root.tick(ctx)
    }

    /// Last root status is not retained; expose the setup latch for tests.
    pub fn setup_has_run(&self) -> bool {
        self.setup_done
    }
}
