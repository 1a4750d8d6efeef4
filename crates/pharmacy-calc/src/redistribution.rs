//! 調撥規劃（本地滿足 + 貪婪配對）

use pharmacy_core::quantity::{non_negative, round_quantity};
use pharmacy_core::{BranchId, MoveKind, PlanningConfig, ProductAggregate, TransferMove};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// 單一分店在規劃過程中的狀態
#[derive(Debug, Clone)]
struct BranchState {
    id: BranchId,

    /// 原始需求
    need: Decimal,

    /// 自身庫存滿足的數量
    local_covered: Decimal,

    /// 剩餘可調出庫存
    surplus: Decimal,

    /// 剩餘缺口
    deficit: Decimal,
}

/// 調撥規劃器
///
/// 規劃分三步：
/// 1. 本地滿足：每個分店先用扣除保留庫存後的自身庫存滿足需求
/// 2. 分類：仍有剩餘庫存者為調出方，仍有缺口者為調入方，各自依數量遞減排序
/// 3. 配對：依序為每個調入方從調出方取貨，直到缺口補滿或調出方用盡
pub struct RedistributionPlanner;

impl RedistributionPlanner {
    /// 規劃一組產品彙總
    ///
    /// 只處理在任一已配置分店有需求的產品，移動依產品順序串接。
    pub fn plan(aggregates: &[ProductAggregate], config: &PlanningConfig) -> Vec<TransferMove> {
        aggregates
            .iter()
            .filter(|a| a.has_need_in(config.branch_ids()))
            .flat_map(|a| Self::plan_product(a, config))
            .collect()
    }

    /// 規劃單一產品
    pub fn plan_product(aggregate: &ProductAggregate, config: &PlanningConfig) -> Vec<TransferMove> {
        Self::run(aggregate, config).0
    }

    fn run(aggregate: &ProductAggregate, config: &PlanningConfig) -> (Vec<TransferMove>, Vec<BranchState>) {
        let mut states: Vec<BranchState> = config
            .branch_ids()
            .map(|id| {
                let quantities = aggregate.branch(id);
                BranchState {
                    id: id.to_string(),
                    need: non_negative(quantities.need),
                    local_covered: Decimal::ZERO,
                    surplus: non_negative(quantities.stock - config.reserve_buffer(id)),
                    deficit: non_negative(quantities.need),
                }
            })
            .collect();
        let mut moves = Vec::new();

        // Step 1: 本地滿足（與配對相同，以四捨五入後的數量扣減）
        for i in 0..states.len() {
            let moved = non_negative(round_quantity(states[i].deficit.min(states[i].surplus)));
            if moved <= Decimal::ZERO {
                continue;
            }

            let snapshot = Self::snapshot(&states);
            let state = &mut states[i];
            let deficit_before = round_quantity(state.deficit);

            state.local_covered = moved;
            state.surplus = non_negative(state.surplus - moved);
            state.deficit = non_negative(state.deficit - moved);

            moves.push(TransferMove {
                product: aggregate.key.clone(),
                code: aggregate.code.clone(),
                from_branch: state.id.clone(),
                to_branch: state.id.clone(),
                quantity: moved,
                kind: MoveKind::LocalCoverage,
                destination_need: state.need,
                destination_local_covered: moved,
                deficit_before,
                deficit_after: non_negative(round_quantity(deficit_before - moved)),
                stock_snapshot: snapshot,
            });
        }

        // Step 2: 分類調出方與調入方（穩定排序，同值保持配置順序）
        let donors = Self::sorted_indices(&states, |s| s.surplus);
        let receivers = Self::sorted_indices(&states, |s| s.deficit);

        // Step 3: 貪婪配對
        for &r in &receivers {
            for &d in &donors {
                if states[r].deficit <= Decimal::ZERO {
                    break;
                }
                if states[d].surplus <= Decimal::ZERO {
                    continue;
                }

                let moved = non_negative(round_quantity(states[r].deficit.min(states[d].surplus)));
                if moved <= Decimal::ZERO {
                    continue;
                }

                let snapshot = Self::snapshot(&states);
                let deficit_before = round_quantity(states[r].deficit);
                let deficit_after = non_negative(round_quantity(states[r].deficit - moved));

                moves.push(TransferMove {
                    product: aggregate.key.clone(),
                    code: aggregate.code.clone(),
                    from_branch: states[d].id.clone(),
                    to_branch: states[r].id.clone(),
                    quantity: moved,
                    kind: MoveKind::Transfer,
                    destination_need: states[r].need,
                    destination_local_covered: states[r].local_covered,
                    deficit_before,
                    deficit_after,
                    stock_snapshot: snapshot,
                });

                states[d].surplus = non_negative(round_quantity(states[d].surplus - moved));
                states[r].deficit = deficit_after;
            }

            // 所有調出方用盡時提前結束
            if donors.iter().all(|&d| states[d].surplus <= Decimal::ZERO) {
                break;
            }
        }

        tracing::trace!(
            "產品 {} 規劃完成：{} 筆移動",
            aggregate.key,
            moves.len()
        );

        (moves, states)
    }

    /// 依數值遞減排序的分店索引（只含數值 > 0 者）
    fn sorted_indices(states: &[BranchState], value: impl Fn(&BranchState) -> Decimal) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..states.len())
            .filter(|&i| value(&states[i]) > Decimal::ZERO)
            .collect();
        indices.sort_by(|&a, &b| value(&states[b]).cmp(&value(&states[a])));
        indices
    }

    fn snapshot(states: &[BranchState]) -> BTreeMap<BranchId, Decimal> {
        states
            .iter()
            .map(|s| (s.id.clone(), round_quantity(s.surplus)))
            .collect()
    }
}
