//! Behavior nodes: composites with cursor memory + the leaf seam.
//!
//! Composite vocabulary is closed (Sequence, Selector, Inverter, Succeeder);
//! leaves stay open through the [`Leaf`] trait so each actor domain brings
//! its own vocabulary without touching the engine.

use crate::behavior::Status;

/// A leaf behavior: either a read-only condition or a side-effecting action.
///
/// Leaves close over nothing — all actor/world access goes through the
/// context passed down at tick time (shared mutable blackboard, no hidden
/// global state).
pub trait Leaf {
    /// The blackboard type handed to every tick.
    type Ctx<'a>;

    /// Conditions return Success/Failure and must not mutate the context.
    /// Actions may mutate and may report Running across ticks.
    fn tick(&mut self, ctx: &mut Self::Ctx<'_>) -> Status;
}

/// A behavior tree node over the leaf vocabulary `L`.
///
/// Composite nodes carry per-instance cursor state: the index of the child
/// currently reporting Running, persisted across ticks. The cursor is what
/// lets one tree evaluation per fixed step express multi-tick behaviors —
/// a coroutine resumed at its suspension point, expressed as plain data.
pub enum BehaviorNode<L: Leaf> {
    /// Runs children in order; fails fast, succeeds when all succeed.
    Sequence {
        children: Vec<BehaviorNode<L>>,
        cursor: usize,
    },
    /// Runs children in order; succeeds fast, fails when all fail.
    Selector {
        children: Vec<BehaviorNode<L>>,
        cursor: usize,
    },
    /// Swaps Success and Failure of its child.
    Inverter(Box<BehaviorNode<L>>),
    /// Converts a child Failure into Success.
    Succeeder(Box<BehaviorNode<L>>),
    Leaf(L),
}

impl<L: Leaf> BehaviorNode<L> {
    /// # Panics
    ///
    /// Panics if `children` is empty — a sequence with no children is a
    /// construction bug, not a runtime condition.
    pub fn sequence(children: Vec<BehaviorNode<L>>) -> Self {
        assert!(!children.is_empty(), "Sequence must have at least one child");
        BehaviorNode::Sequence { children, cursor: 0 }
    }

    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn selector(children: Vec<BehaviorNode<L>>) -> Self {
        assert!(!children.is_empty(), "Selector must have at least one child");
        BehaviorNode::Selector { children, cursor: 0 }
    }

    pub fn inverter(child: BehaviorNode<L>) -> Self {
        BehaviorNode::Inverter(Box::new(child))
    }

    pub fn succeeder(child: BehaviorNode<L>) -> Self {
        BehaviorNode::Succeeder(Box::new(child))
    }

    pub fn leaf(leaf: L) -> Self {
        BehaviorNode::Leaf(leaf)
    }

    /// Ticks this node once.
    ///
    /// Sequence: resumes at its cursor. Child Success advances the cursor;
    /// all children done → Success, cursor reset. Child Failure → Failure,
    /// cursor reset (short-circuit). Child Running → Running, cursor kept so
    /// the same child is re-evaluated first next tick.
    ///
    /// Selector: resumes at its cursor. Child Success → Success, cursor
    /// reset on the same tick (first success wins). Child Failure advances;
    /// all failed → Failure, cursor reset. Running → Running, cursor kept.
    pub fn tick(&mut self, ctx: &mut L::Ctx<'_>) -> Status {
        match self {
            BehaviorNode::Sequence { children, cursor } => {
                while *cursor < children.len() {
                    match children[*cursor].tick(ctx) {
                        Status::Success => *cursor += 1,
                        Status::Failure => {
                            *cursor = 0;
                            return Status::Failure;
                        }
                        Status::Running => return Status::Running,
                    }
                }
                *cursor = 0;
                Status::Success
            }
            BehaviorNode::Selector { children, cursor } => {
                while *cursor < children.len() {
                    match children[*cursor].tick(ctx) {
                        Status::Success => {
                            *cursor = 0;
                            return Status::Success;
                        }
                        Status::Failure => *cursor += 1,
                        Status::Running => return Status::Running,
                    }
                }
                *cursor = 0;
                Status::Failure
            }
            BehaviorNode::Inverter(child) => child.tick(ctx).invert(),
            BehaviorNode::Succeeder(child) => match child.tick(ctx) {
                Status::Running => Status::Running,
                _ => Status::Success,
            },
            BehaviorNode::Leaf(leaf) => leaf.tick(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted leaf: returns statuses from a queue, records how often it
    /// was ticked. Последний статус повторяется когда очередь пуста.
    struct Scripted {
        script: Vec<Status>,
        at: usize,
        pub ticks: u32,
    }

    impl Scripted {
        fn new(script: Vec<Status>) -> Self {
            Self { script, at: 0, ticks: 0 }
        }
    }

    /// Shared tick log so tests can assert evaluation order.
    #[derive(Default)]
    struct TickLog {
        order: Vec<&'static str>,
    }

    struct Named {
        name: &'static str,
        inner: Scripted,
    }

    impl Leaf for Named {
        type Ctx<'a> = TickLog;

        fn tick(&mut self, ctx: &mut TickLog) -> Status {
            ctx.order.push(self.name);
            self.inner.ticks += 1;
            let status = self.inner.script[self.inner.at.min(self.inner.script.len() - 1)];
            self.inner.at += 1;
            status
        }
    }

    fn leaf(name: &'static str, script: Vec<Status>) -> BehaviorNode<Named> {
        BehaviorNode::leaf(Named {
            name,
            inner: Scripted::new(script),
        })
    }

    #[test]
    fn sequence_resumes_at_running_child() {
        // Child 1 runs for two ticks; child 0 must not be re-run meanwhile.
        let mut seq = BehaviorNode::sequence(vec![
            leaf("a", vec![Status::Success]),
            leaf("b", vec![Status::Running, Status::Running, Status::Success]),
            leaf("c", vec![Status::Success]),
        ]);

        let mut log = TickLog::default();
        assert_eq!(seq.tick(&mut log), Status::Running);
        assert_eq!(seq.tick(&mut log), Status::Running);
        assert_eq!(seq.tick(&mut log), Status::Success);
        // "a" ticked exactly once, "b" resumed directly on ticks 2 and 3
        assert_eq!(log.order, vec!["a", "b", "b", "b", "c"]);
    }

    #[test]
    fn sequence_failure_resets_cursor() {
        let mut seq = BehaviorNode::sequence(vec![
            leaf("a", vec![Status::Success, Status::Success]),
            leaf("b", vec![Status::Failure, Status::Success]),
            leaf("c", vec![Status::Success]),
        ]);

        let mut log = TickLog::default();
        assert_eq!(seq.tick(&mut log), Status::Failure);
        // Cursor reset: next tick starts over at "a", and "c" was never
        // reached on the failing pass.
        assert_eq!(seq.tick(&mut log), Status::Success);
        assert_eq!(log.order, vec!["a", "b", "a", "b", "c"]);
    }

    #[test]
    fn selector_success_resets_cursor_same_tick() {
        let mut sel = BehaviorNode::selector(vec![
            leaf("a", vec![Status::Failure, Status::Success]),
            leaf("b", vec![Status::Success]),
        ]);

        let mut log = TickLog::default();
        assert_eq!(sel.tick(&mut log), Status::Success);
        if let BehaviorNode::Selector { cursor, .. } = &sel {
            assert_eq!(*cursor, 0, "cursor must reset on the returning tick");
        } else {
            unreachable!();
        }
        // Next tick starts from child 0 again.
        assert_eq!(sel.tick(&mut log), Status::Success);
        assert_eq!(log.order, vec!["a", "b", "a"]);
    }

    #[test]
    fn selector_resumes_at_running_child() {
        let mut sel = BehaviorNode::selector(vec![
            leaf("a", vec![Status::Failure, Status::Failure]),
            leaf("b", vec![Status::Running, Status::Success]),
        ]);

        let mut log = TickLog::default();
        assert_eq!(sel.tick(&mut log), Status::Running);
        assert_eq!(sel.tick(&mut log), Status::Success);
        // Second tick resumed at "b" without re-running "a".
        assert_eq!(log.order, vec!["a", "b", "b"]);
    }

    #[test]
    fn selector_all_fail() {
        let mut sel = BehaviorNode::selector(vec![
            leaf("a", vec![Status::Failure]),
            leaf("b", vec![Status::Failure]),
        ]);

        let mut log = TickLog::default();
        assert_eq!(sel.tick(&mut log), Status::Failure);
        if let BehaviorNode::Selector { cursor, .. } = &sel {
            assert_eq!(*cursor, 0);
        }
    }

    #[test]
    fn inverter_truth_table() {
        let mut log = TickLog::default();

        let mut inv = BehaviorNode::inverter(leaf("s", vec![Status::Success]));
        assert_eq!(inv.tick(&mut log), Status::Failure);

        let mut inv = BehaviorNode::inverter(leaf("f", vec![Status::Failure]));
        assert_eq!(inv.tick(&mut log), Status::Success);

        let mut inv = BehaviorNode::inverter(leaf("r", vec![Status::Running]));
        assert_eq!(inv.tick(&mut log), Status::Running);
    }

    #[test]
    fn succeeder_truth_table() {
        let mut log = TickLog::default();

        let mut suc = BehaviorNode::succeeder(leaf("s", vec![Status::Success]));
        assert_eq!(suc.tick(&mut log), Status::Success);

        let mut suc = BehaviorNode::succeeder(leaf("f", vec![Status::Failure]));
        assert_eq!(suc.tick(&mut log), Status::Success);

        let mut suc = BehaviorNode::succeeder(leaf("r", vec![Status::Running]));
        assert_eq!(suc.tick(&mut log), Status::Running);
    }

    #[test]
    #[should_panic(expected = "at least one child")]
    fn empty_sequence_panics() {
        let _ = BehaviorNode::<Named>::sequence(vec![]);
    }

    #[test]
    fn abandoned_running_child_is_simply_not_ticked() {
        // Selector where child 0 recovers on the second tick: the Running
        // child 1 is abandoned without any explicit cancellation.
        let mut sel = BehaviorNode::selector(vec![
            leaf("a", vec![Status::Failure, Status::Success]),
            leaf("b", vec![Status::Running, Status::Failure]),
        ]);

        let mut log = TickLog::default();
        assert_eq!(sel.tick(&mut log), Status::Running); // stuck in "b"
        assert_eq!(sel.tick(&mut log), Status::Failure); // "b" fails, all failed
        assert_eq!(sel.tick(&mut log), Status::Success); // cursor reset, "a" wins
        assert_eq!(log.order, vec!["a", "b", "b", "a"]);
    }
}
