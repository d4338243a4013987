//! Tests for the combat state graph.

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use crate::combat::{
        BlockDirection, CombatCtx, CombatCue, CombatMachine, CombatState, CombatStateKind,
        CombatTuning,
    };

    const DT: f32 = 0.1;

    struct Harness {
        machine: CombatMachine,
        tuning: CombatTuning,
        cues: Vec<CombatCue>,
        guard_held: bool,
        aim_pos: Option<Vec2>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                machine: CombatMachine::new(),
                tuning: CombatTuning::default(),
                cues: Vec::new(),
                guard_held: true,
                aim_pos: None,
            }
        }

        fn enter(&mut self, state: CombatState) {
            let mut ctx = CombatCtx {
                dt: DT,
                guard_held: self.guard_held,
                aim_pos: self.aim_pos,
                tuning: &self.tuning,
                cues: &mut self.cues,
            };
            self.machine.change_state(state, &mut ctx).unwrap();
        }

        fn tick(&mut self) {
            let mut ctx = CombatCtx {
                dt: DT,
                guard_held: self.guard_held,
                aim_pos: self.aim_pos,
                tuning: &self.tuning,
                cues: &mut self.cues,
            };
            self.machine.execute(&mut ctx).unwrap();
        }

        fn kind(&self) -> Option<CombatStateKind> {
            self.machine.current_kind()
        }
    }

    /// BlockHit с duration=0.5 и не тронутым флагом: по истечении
    /// возвращаемся в Block, не наружу.
    #[test]
    fn block_hit_returns_to_block_after_duration() {
        let mut h = Harness::new();
        h.enter(CombatState::block(BlockDirection::Forward));
        h.enter(CombatState::block_hit(0.5, BlockDirection::Forward));
        assert_eq!(h.kind(), Some(CombatStateKind::BlockHit));

        // 0.5s ровно — ещё в стане (строго "больше", как и было)
        for _ in 0..5 {
            h.tick();
        }
        assert_eq!(h.kind(), Some(CombatStateKind::BlockHit));

        h.tick();
        assert_eq!(h.kind(), Some(CombatStateKind::Block));
        assert!(h.cues.contains(&CombatCue::BlockHitStarted));
        assert!(h.cues.contains(&CombatCue::BlockHitEnded));
    }

    /// Тот же стан, но флаг сброшен другой системой до истечения —
    /// машина выходит в inactive.
    #[test]
    fn block_hit_exits_machine_when_flag_cleared() {
        let mut h = Harness::new();
        h.enter(CombatState::block(BlockDirection::Forward));
        h.enter(CombatState::block_hit(0.5, BlockDirection::Forward));

        h.tick();
        h.tick();

        // Гард отпущен во время стана: внешний setter, не сам стан.
        h.guard_held = false;
        h.machine
            .current_mut()
            .unwrap()
            .set_will_return_to_block(false);

        for _ in 0..5 {
            h.tick();
        }
        assert_eq!(h.kind(), None);
        assert!(h.cues.contains(&CombatCue::BlockHitEnded));
        // Block не перезаходился: единственный BlockStarted — начальный.
        let block_starts = h
            .cues
            .iter()
            .filter(|c| matches!(c, CombatCue::BlockStarted { .. }))
            .count();
        assert_eq!(block_starts, 1);
    }

    #[test]
    fn ready_attack_rolls_into_action_then_exits() {
        let mut h = Harness::new();
        h.enter(CombatState::ready_attack(0.3));
        assert_eq!(h.kind(), Some(CombatStateKind::ReadyAttack));

        h.tick();
        h.tick();
        h.tick(); // elapsed 0.3 >= 0.3 → Action
        assert_eq!(h.kind(), Some(CombatStateKind::Action));
        assert!(h.cues.contains(&CombatCue::AttackStarted { ranged: false }));

        // Action истекает → машина inactive
        for _ in 0..((h.tuning.attack_duration / DT) as usize + 1) {
            h.tick();
        }
        assert_eq!(h.kind(), None);
        assert!(h.cues.contains(&CombatCue::ActionFinished));
    }

    #[test]
    fn ranged_telegraph_locks_then_launches() {
        let mut h = Harness::new();
        h.aim_pos = Some(Vec2::new(5.0, 2.0));
        h.enter(CombatState::ready_ranged_attack(0.2, 0.2));

        h.tick();
        h.tick(); // elapsed 0.2 → лок по текущему aim
        assert_eq!(
            h.machine.current().unwrap().locked_target_pos(),
            Some(Vec2::new(5.0, 2.0))
        );

        // Цель сместилась — лок не обновляется.
        h.aim_pos = Some(Vec2::new(9.0, 9.0));
        h.tick();
        h.tick(); // elapsed 0.4 → launch
        assert_eq!(h.kind(), Some(CombatStateKind::Action));
        assert!(h.cues.contains(&CombatCue::TargetLocked {
            pos: Vec2::new(5.0, 2.0)
        }));
        assert!(h.cues.contains(&CombatCue::RangedAttackLaunched {
            target_pos: Vec2::new(5.0, 2.0)
        }));
    }

    #[test]
    fn ranged_telegraph_cancels_without_aim() {
        let mut h = Harness::new();
        h.aim_pos = None; // цель потеряна до лока
        h.enter(CombatState::ready_ranged_attack(0.2, 0.2));

        h.tick();
        h.tick();
        assert_eq!(h.kind(), None);
        assert!(!h
            .cues
            .iter()
            .any(|c| matches!(c, CombatCue::RangedAttackLaunched { .. })));
    }

    #[test]
    fn block_exits_when_guard_released() {
        let mut h = Harness::new();
        h.enter(CombatState::block(BlockDirection::Upwards));
        h.tick();
        assert_eq!(h.kind(), Some(CombatStateKind::Block));

        h.guard_held = false;
        h.tick();
        assert_eq!(h.kind(), None);
        assert!(h.cues.contains(&CombatCue::BlockEnded));
    }

    #[test]
    fn death_is_terminal_for_normal_transitions() {
        let mut h = Harness::new();

        // Смерть применяется силой из любого состояния.
        h.enter(CombatState::ready_attack(0.5));
        {
            let mut ctx = CombatCtx {
                dt: DT,
                guard_held: false,
                aim_pos: None,
                tuning: &h.tuning,
                cues: &mut h.cues,
            };
            h.machine.force_state(CombatState::death(), &mut ctx);
        }
        assert_eq!(h.kind(), Some(CombatStateKind::Death));
        assert!(h.cues.contains(&CombatCue::Died));

        // Из Death нормальным путём не выйти.
        {
            let mut ctx = CombatCtx {
                dt: DT,
                guard_held: false,
                aim_pos: None,
                tuning: &h.tuning,
                cues: &mut h.cues,
            };
            let err = h
                .machine
                .change_state(CombatState::block(BlockDirection::Forward), &mut ctx);
            assert!(err.is_err());
        }
        assert_eq!(h.kind(), Some(CombatStateKind::Death));

        // Revive = exit; hook шлёт Revived.
        {
            let mut ctx = CombatCtx {
                dt: DT,
                guard_held: false,
                aim_pos: None,
                tuning: &h.tuning,
                cues: &mut h.cues,
            };
            h.machine.exit(&mut ctx);
        }
        assert_eq!(h.kind(), None);
        assert!(h.cues.contains(&CombatCue::Revived));
    }

    #[test]
    fn declared_graph_matches_expectations() {
        let machine = CombatMachine::new();
        let table = machine.transitions();

        assert!(table.is_allowed(CombatStateKind::Block, CombatStateKind::BlockHit));
        assert!(table.is_allowed(CombatStateKind::BlockHit, CombatStateKind::Block));
        assert!(table.is_allowed(CombatStateKind::ReadyAttack, CombatStateKind::Action));
        // Смерть не объявлена в обычных строках — только forced путь.
        assert!(!table.is_allowed(CombatStateKind::Block, CombatStateKind::Death));
        assert!(table.allowed_from(CombatStateKind::Death).unwrap().is_empty());
    }
}
