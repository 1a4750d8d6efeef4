//! 採購建議計算

use pharmacy_core::quantity::{non_negative, round_quantity};
use pharmacy_core::{AggregateKey, PlanningConfig, ProductAggregate, PurchaseSuggestion, TransferMove};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// 單一產品、單一分店的調撥總量
#[derive(Debug, Clone, Copy, Default)]
struct TransferTotals {
    incoming: Decimal,
    outgoing: Decimal,
}

/// 採購建議計算器
pub struct PurchaseSuggestionCalculator;

impl PurchaseSuggestionCalculator {
    /// 計算調撥後的採購建議
    ///
    /// 只計入分店間調撥；本地滿足已由自身庫存計算。調出量只供參考，
    /// 不會增加調出方的建議採購量。需求與可用庫存皆為 0 的分店不產生建議。
    pub fn calculate(
        aggregates: &[ProductAggregate],
        moves: &[TransferMove],
        config: &PlanningConfig,
    ) -> Vec<PurchaseSuggestion> {
        let totals = Self::transfer_totals(moves);
        let mut suggestions = Vec::new();

        for aggregate in aggregates {
            for branch_id in config.branch_ids() {
                let quantities = aggregate.branch(branch_id);
                let need = non_negative(quantities.need);
                let available = non_negative(quantities.stock - config.reserve_buffer(branch_id));
                if need.is_zero() && available.is_zero() {
                    continue;
                }

                let transfer = totals
                    .get(&(&aggregate.key, branch_id))
                    .copied()
                    .unwrap_or_default();

                let local_covered = need.min(available);
                let remaining = non_negative(need - local_covered);
                let transfer_covered = remaining.min(transfer.incoming);
                let new_to_order = non_negative(need - local_covered - transfer_covered);

                suggestions.push(PurchaseSuggestion {
                    product: aggregate.key.clone(),
                    code: aggregate.code.clone(),
                    branch_id: branch_id.to_string(),
                    need: round_quantity(need),
                    local_covered: round_quantity(local_covered),
                    transfer_covered: round_quantity(transfer_covered),
                    incoming: round_quantity(transfer.incoming),
                    outgoing: round_quantity(transfer.outgoing),
                    new_to_order: round_quantity(new_to_order),
                });
            }
        }

        suggestions
    }

    fn transfer_totals(moves: &[TransferMove]) -> HashMap<(&AggregateKey, &str), TransferTotals> {
        let mut totals: HashMap<(&AggregateKey, &str), TransferTotals> = HashMap::new();
        for m in moves.iter().filter(|m| !m.is_local()) {
            totals
                .entry((&m.product, m.to_branch.as_str()))
                .or_default()
                .incoming += m.quantity;
            totals
                .entry((&m.product, m.from_branch.as_str()))
                .or_default()
                .outgoing += m.quantity;
        }
        totals
    }
}
