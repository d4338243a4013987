//! Archetype decision trees, собранные из leaf vocabulary.
//!
//! Общая форма обоих деревьев: найти видимую цель (иначе прибрать
//! подвисший замах и провалиться из дерева) → если уже замахиваемся или
//! мид-экшен — решить, держать или бросать → иначе выйти на дистанцию и
//! атаковать, с fallback'ом "встать и смотреть на цель" когда пути нет.

use crate::ai::leaves::CombatLeaf;
use crate::behavior::{BehaviorNode, BehaviorTree};
use crate::combat::CombatStateKind;

type Node = BehaviorNode<CombatLeaf>;

fn leaf(leaf: CombatLeaf) -> Node {
    BehaviorNode::leaf(leaf)
}

/// Дерево ближнего боя (наземный рыцарь-враг).
pub fn melee_combat_tree() -> BehaviorTree<CombatLeaf> {
    BehaviorTree::with_setup(
        // setup: первичный захват цели
        leaf(CombatLeaf::AcquireVisibleTarget),
        BehaviorNode::sequence(vec![
            // есть ли видимая цель
            BehaviorNode::selector(vec![
                leaf(CombatLeaf::AcquireVisibleTarget),
                // цели нет: прибрать подвисший замах и провалиться из дерева
                BehaviorNode::inverter(BehaviorNode::succeeder(BehaviorNode::sequence(vec![
                    leaf(CombatLeaf::CombatMachineInState(
                        CombatStateKind::ReadyAttack,
                    )),
                    leaf(CombatLeaf::ExitCombatMachine),
                ]))),
            ]),
            // цель найдена
            BehaviorNode::selector(vec![
                // уже замахиваемся: держим, пока цель в расширенной дистанции
                BehaviorNode::sequence(vec![
                    leaf(CombatLeaf::CombatMachineInState(
                        CombatStateKind::ReadyAttack,
                    )),
                    BehaviorNode::inverter(BehaviorNode::sequence(vec![
                        BehaviorNode::inverter(leaf(CombatLeaf::TargetInMeleeRange {
                            ready_range: true,
                        })),
                        leaf(CombatLeaf::ExitCombatMachine),
                    ])),
                ]),
                // мид-экшен: даём доиграть
                leaf(CombatLeaf::CombatMachineInState(CombatStateKind::Action)),
                // преследование
                BehaviorNode::sequence(vec![
                    leaf(CombatLeaf::SetMeleeNavTarget),
                    BehaviorNode::selector(vec![
                        BehaviorNode::sequence(vec![
                            // дойти и ударить, если в дистанции
                            leaf(CombatLeaf::GoToNavTarget),
                            leaf(CombatLeaf::StopMoving),
                            leaf(CombatLeaf::FaceNavTarget),
                            leaf(CombatLeaf::TargetInMeleeRange { ready_range: false }),
                            leaf(CombatLeaf::StartMeleeAttack),
                        ]),
                        BehaviorNode::sequence(vec![
                            // не в дистанции и пути нет
                            leaf(CombatLeaf::StopMoving),
                            leaf(CombatLeaf::FaceNavTarget),
                        ]),
                    ]),
                ]),
            ]),
        ]),
    )
}

/// Дерево дальнего боя (летающий дракон-враг).
pub fn ranged_combat_tree() -> BehaviorTree<CombatLeaf> {
    BehaviorTree::with_setup(
        // setup: захват цели + подписка на её выстрелы
        BehaviorNode::sequence(vec![
            leaf(CombatLeaf::AcquireVisibleTarget),
            leaf(CombatLeaf::ListenForTargetRangedAttacks),
        ]),
        BehaviorNode::sequence(vec![
            // есть ли видимая цель
            BehaviorNode::selector(vec![
                leaf(CombatLeaf::AcquireVisibleTarget),
                BehaviorNode::inverter(BehaviorNode::succeeder(BehaviorNode::sequence(vec![
                    leaf(CombatLeaf::CombatMachineInState(
                        CombatStateKind::ReadyRangedAttack,
                    )),
                    leaf(CombatLeaf::ExitCombatMachine),
                ]))),
            ]),
            // цель найдена
            BehaviorNode::selector(vec![
                // телеграф: вести цель, пока позиция не залочена
                BehaviorNode::sequence(vec![
                    leaf(CombatLeaf::CombatMachineInState(
                        CombatStateKind::ReadyRangedAttack,
                    )),
                    BehaviorNode::inverter(leaf(CombatLeaf::HasLockedTargetPosition)),
                    leaf(CombatLeaf::SetCombatTargetPos),
                    leaf(CombatLeaf::FaceNavTarget),
                ]),
                leaf(CombatLeaf::CombatMachineInState(CombatStateKind::Action)),
                // выход на дистанцию стрельбы
                BehaviorNode::sequence(vec![
                    leaf(CombatLeaf::SetRangedNavTarget),
                    BehaviorNode::selector(vec![
                        BehaviorNode::sequence(vec![
                            leaf(CombatLeaf::GoToNavTarget),
                            leaf(CombatLeaf::StopMoving),
                            leaf(CombatLeaf::StartRangedAttack),
                        ]),
                        BehaviorNode::sequence(vec![
                            leaf(CombatLeaf::StopMoving),
                            leaf(CombatLeaf::FaceNavTarget),
                        ]),
                    ]),
                ]),
            ]),
        ]),
    )
}
