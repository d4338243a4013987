//! Generic finite state machine framework.
//!
//! Машина владеет текущим состоянием (`None` = inactive/terminal) и
//! декларативной таблицей переходов. Состояния — это behavior units с
//! Enter/Execute/Exit хуками; сами переходы они не применяют, а
//! возвращают [`StateCommand`], который машина валидирует и применяет.
//!
//! Two entry points, deliberately:
//! - `change_state` — strict, rejects anything absent from the table;
//! - `force_state` — explicit bypass for transitions that must ignore
//!   normal gameplay preconditions (knockdown, gravity toggle).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// Closed tag identifying a state kind. One tag per concrete state variant.
pub trait StateTag: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static> StateTag for T {}

/// A single behavior unit owned by a state machine slot.
///
/// States are replaced, not mutated, on transition: the machine exclusively
/// owns whatever occupies its slot.
pub trait State: Sized + Send + Sync {
    /// Enumerable tag for transition table lookup.
    type Kind: StateTag;

    /// Shared mutable context handed to every hook (timers advance off it,
    /// cues are emitted into it). Passed by reference at call time — states
    /// hold no references of their own.
    type Ctx<'a>;

    fn kind(&self) -> Self::Kind;

    fn on_enter(&mut self, _ctx: &mut Self::Ctx<'_>) {}

    /// Invoked every relevant tick while this state is current.
    fn on_execute(&mut self, ctx: &mut Self::Ctx<'_>) -> StateCommand<Self>;

    fn on_exit(&mut self, _ctx: &mut Self::Ctx<'_>) {}
}

/// What a state's Execute hook wants the machine to do next.
pub enum StateCommand<S> {
    /// Keep executing the current state.
    Stay,
    /// Transition to `S` through the normal (table-checked) path.
    ChangeTo(S),
    /// Terminate the machine back to the inactive (`None`) state.
    Exit,
}

/// Transition not permitted by the declared table. State is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError<K: StateTag> {
    pub from: K,
    pub to: K,
}

impl<K: StateTag> fmt::Display for TransitionError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal transition {:?} -> {:?}", self.from, self.to)
    }
}

impl<K: StateTag> std::error::Error for TransitionError<K> {}

/// Declared transition table: state kind → set of reachable next kinds.
///
/// The table is data, inspectable at runtime; strictness lives in
/// [`StateMachine::change_state`].
#[derive(Debug, Clone, Default)]
pub struct TransitionTable<K: StateTag> {
    allowed: HashMap<K, HashSet<K>>,
}

impl<K: StateTag> TransitionTable<K> {
    pub fn new() -> Self {
        Self {
            allowed: HashMap::new(),
        }
    }

    /// Declares a row. An empty `to` list is meaningful: the kind exists in
    /// the graph but no normal transition leaves it.
    pub fn allow(mut self, from: K, to: impl IntoIterator<Item = K>) -> Self {
        self.allowed.entry(from).or_default().extend(to);
        self
    }

    pub fn is_allowed(&self, from: K, to: K) -> bool {
        self.allowed
            .get(&from)
            .map(|set| set.contains(&to))
            .unwrap_or(false)
    }

    pub fn allowed_from(&self, from: K) -> Option<&HashSet<K>> {
        self.allowed.get(&from)
    }

    /// Every kind referenced in an allowed set must carry its own row.
    ///
    /// # Panics
    ///
    /// Panics on a dangling reference — a malformed table is a construction
    /// bug, and the machine must not come up partially usable.
    fn validate(&self) {
        for (from, set) in &self.allowed {
            for to in set {
                assert!(
                    self.allowed.contains_key(to),
                    "transition table references {:?} (from {:?}) but declares no row for it",
                    to,
                    from
                );
            }
        }
    }
}

/// Holds the current state and drives Enter/Execute/Exit.
pub struct StateMachine<S: State> {
    current: Option<S>,
    transitions: TransitionTable<S::Kind>,
}

impl<S: State> StateMachine<S> {
    /// # Panics
    ///
    /// Panics if the table references a kind it declares no row for.
    pub fn new(transitions: TransitionTable<S::Kind>) -> Self {
        transitions.validate();
        Self {
            current: None,
            transitions,
        }
    }

    /// Strict transition: rejected (state unchanged, no hooks run) when the
    /// current row does not list the target kind. Entering from the inactive
    /// state is always permitted.
    ///
    /// On success the outgoing state's Exit hook runs before the incoming
    /// state's Enter hook, always.
    pub fn change_state(
        &mut self,
        new: S,
        ctx: &mut S::Ctx<'_>,
    ) -> Result<(), TransitionError<S::Kind>> {
        if let Some(current) = &self.current {
            let from = current.kind();
            let to = new.kind();
            if !self.transitions.is_allowed(from, to) {
                return Err(TransitionError { from, to });
            }
        }
        self.apply(new, ctx);
        Ok(())
    }

    /// Forced transition: applied outside normal gameplay preconditions
    /// (external knockdown, gravity toggle). Bypasses the table but still
    /// runs Exit/Enter in order.
    pub fn force_state(&mut self, new: S, ctx: &mut S::Ctx<'_>) {
        self.apply(new, ctx);
    }

    fn apply(&mut self, mut new: S, ctx: &mut S::Ctx<'_>) {
        if let Some(mut old) = self.current.take() {
            old.on_exit(ctx);
        }
        new.on_enter(ctx);
        self.current = Some(new);
    }

    /// No-op while inactive. Otherwise runs the current state's Execute
    /// hook and applies whatever command it returns; a command targeting an
    /// undeclared transition is reported and leaves the state unchanged.
    pub fn execute(&mut self, ctx: &mut S::Ctx<'_>) -> Result<(), TransitionError<S::Kind>> {
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };

        match current.on_execute(ctx) {
            StateCommand::Stay => Ok(()),
            StateCommand::ChangeTo(next) => self.change_state(next, ctx),
            StateCommand::Exit => {
                self.exit(ctx);
                Ok(())
            }
        }
    }

    /// Terminates the machine back to the inactive state, running the
    /// current state's Exit hook.
    pub fn exit(&mut self, ctx: &mut S::Ctx<'_>) {
        if let Some(mut old) = self.current.take() {
            old.on_exit(ctx);
        }
    }

    pub fn current(&self) -> Option<&S> {
        self.current.as_ref()
    }

    /// Mutable access to the occupying state — how other systems poke
    /// externally-settable flags (e.g. "will return to block").
    pub fn current_mut(&mut self) -> Option<&mut S> {
        self.current.as_mut()
    }

    /// The read surface for animation/UI layers.
    pub fn current_kind(&self) -> Option<S::Kind> {
        self.current.as_ref().map(|s| s.kind())
    }

    pub fn is_in(&self, kind: S::Kind) -> bool {
        self.current_kind() == Some(kind)
    }

    pub fn is_inactive(&self) -> bool {
        self.current.is_none()
    }

    pub fn transitions(&self) -> &TransitionTable<S::Kind> {
        &self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        A,
        B,
        C,
    }

    /// Hook trace shared through the context.
    #[derive(Default)]
    struct Trace {
        calls: Vec<String>,
    }

    struct TestState {
        kind: TestKind,
        command: Option<Box<StateCommand<TestState>>>,
    }

    impl TestState {
        fn new(kind: TestKind) -> Self {
            Self {
                kind,
                command: None,
            }
        }

        fn with_command(kind: TestKind, command: StateCommand<TestState>) -> Self {
            Self {
                kind,
                command: Some(Box::new(command)),
            }
        }
    }

    impl State for TestState {
        type Kind = TestKind;
        type Ctx<'a> = Trace;

        fn kind(&self) -> TestKind {
            self.kind
        }

        fn on_enter(&mut self, ctx: &mut Trace) {
            ctx.calls.push(format!("enter {:?}", self.kind));
        }

        fn on_execute(&mut self, ctx: &mut Trace) -> StateCommand<Self> {
            ctx.calls.push(format!("execute {:?}", self.kind));
            self.command.take().map(|c| *c).unwrap_or(StateCommand::Stay)
        }

        fn on_exit(&mut self, ctx: &mut Trace) {
            ctx.calls.push(format!("exit {:?}", self.kind));
        }
    }

    fn table() -> TransitionTable<TestKind> {
        TransitionTable::new()
            .allow(TestKind::A, [TestKind::B])
            .allow(TestKind::B, [TestKind::A, TestKind::C])
            .allow(TestKind::C, [])
    }

    #[test]
    fn execute_on_inactive_machine_is_noop() {
        let mut machine: StateMachine<TestState> = StateMachine::new(table());
        let mut trace = Trace::default();

        assert!(machine.execute(&mut trace).is_ok());
        assert!(trace.calls.is_empty());
        assert!(machine.is_inactive());
    }

    #[test]
    fn exit_runs_before_enter() {
        let mut machine = StateMachine::new(table());
        let mut trace = Trace::default();

        machine
            .change_state(TestState::new(TestKind::A), &mut trace)
            .unwrap();
        machine
            .change_state(TestState::new(TestKind::B), &mut trace)
            .unwrap();

        assert_eq!(trace.calls, vec!["enter A", "exit A", "enter B"]);
    }

    #[test]
    fn illegal_transition_is_rejected_and_state_unchanged() {
        let mut machine = StateMachine::new(table());
        let mut trace = Trace::default();

        machine
            .change_state(TestState::new(TestKind::A), &mut trace)
            .unwrap();
        let err = machine
            .change_state(TestState::new(TestKind::C), &mut trace)
            .unwrap_err();

        assert_eq!(
            err,
            TransitionError {
                from: TestKind::A,
                to: TestKind::C
            }
        );
        assert_eq!(machine.current_kind(), Some(TestKind::A));
        // Никаких хуков на отклонённом переходе
        assert_eq!(trace.calls, vec!["enter A"]);
    }

    #[test]
    fn forced_transition_bypasses_table() {
        let mut machine = StateMachine::new(table());
        let mut trace = Trace::default();

        machine
            .change_state(TestState::new(TestKind::A), &mut trace)
            .unwrap();
        machine.force_state(TestState::new(TestKind::C), &mut trace);

        assert_eq!(machine.current_kind(), Some(TestKind::C));
        assert_eq!(trace.calls, vec!["enter A", "exit A", "enter C"]);
    }

    #[test]
    fn execute_applies_change_command() {
        let mut machine = StateMachine::new(table());
        let mut trace = Trace::default();

        machine
            .change_state(
                TestState::with_command(
                    TestKind::A,
                    StateCommand::ChangeTo(TestState::new(TestKind::B)),
                ),
                &mut trace,
            )
            .unwrap();
        machine.execute(&mut trace).unwrap();

        assert_eq!(machine.current_kind(), Some(TestKind::B));
        assert_eq!(
            trace.calls,
            vec!["enter A", "execute A", "exit A", "enter B"]
        );
    }

    #[test]
    fn execute_applies_exit_command() {
        let mut machine = StateMachine::new(table());
        let mut trace = Trace::default();

        machine
            .change_state(
                TestState::with_command(TestKind::A, StateCommand::Exit),
                &mut trace,
            )
            .unwrap();
        machine.execute(&mut trace).unwrap();

        assert!(machine.is_inactive());
        assert_eq!(trace.calls, vec!["enter A", "execute A", "exit A"]);
    }

    #[test]
    #[should_panic(expected = "declares no row")]
    fn dangling_table_reference_panics() {
        let bad = TransitionTable::new().allow(TestKind::A, [TestKind::B]);
        let _: StateMachine<TestState> = StateMachine::new(bad);
    }

    #[test]
    fn table_is_inspectable() {
        let machine: StateMachine<TestState> = StateMachine::new(table());
        let from_b = machine.transitions().allowed_from(TestKind::B).unwrap();
        assert!(from_b.contains(&TestKind::A));
        assert!(from_b.contains(&TestKind::C));
        assert!(machine.transitions().is_allowed(TestKind::A, TestKind::B));
        assert!(!machine.transitions().is_allowed(TestKind::C, TestKind::A));
    }
}
