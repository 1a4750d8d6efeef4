//! 將調撥計劃套用回資料列

use pharmacy_core::quantity::{non_negative, round_quantity};
use pharmacy_core::{AggregateKey, AggregateUnit, ProductRow, RedistributionPlan};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::aggregation::QuantityAggregator;

/// 資料列索引鍵：(識別鍵, 描述, 彙總單位, 分店)
type RowKey = (String, String, AggregateUnit, String);

/// 計劃套用器
///
/// 依 (識別鍵, 描述, 彙總單位, 分店) 找到對應的資料列，調整庫存並以建議採購量
/// 取代待訂購數量。同一鍵有多筆資料列時，以最後一筆為準。數量會換算回資料列
/// 自身的單位，無法換算時略過該資料列。
pub struct RedistributionApplier;

impl RedistributionApplier {
    /// 套用計劃，返回新的資料列（不修改輸入）
    pub fn apply(rows: &[ProductRow], plan: &RedistributionPlan) -> Vec<ProductRow> {
        let mut updated = rows.to_vec();

        let mut index: HashMap<RowKey, usize> = HashMap::new();
        for (i, row) in updated.iter().enumerate() {
            if let Some(identity) = row.identity_key() {
                let unit = QuantityAggregator::convert_row(row).unit;
                index.insert(
                    (identity.to_string(), row.description.clone(), unit, row.branch_id.clone()),
                    i,
                );
            }
        }
        let position = |product: &AggregateKey, branch: &str| {
            index
                .get(&(
                    product.identity.clone(),
                    product.description.clone(),
                    product.unit.clone(),
                    branch.to_string(),
                ))
                .copied()
        };

        let mut applied = 0usize;
        let mut skipped = 0usize;
        for m in plan.transfers() {
            if let Some(i) = position(&m.product, &m.from_branch) {
                let row = &mut updated[i];
                match m.product.unit.convert_to_label(m.quantity, &row.unit) {
                    Some(qty) => {
                        let current = row.stock_qty.unwrap_or(Decimal::ZERO);
                        row.stock_qty = Some(non_negative(round_quantity(current - qty)));
                    }
                    None => skipped += 1,
                }
            }
            if let Some(i) = position(&m.product, &m.to_branch) {
                let row = &mut updated[i];
                match m.product.unit.convert_to_label(m.quantity, &row.unit) {
                    Some(qty) => {
                        let current = row.stock_qty.unwrap_or(Decimal::ZERO);
                        row.stock_qty = Some(round_quantity(current + qty));
                    }
                    None => skipped += 1,
                }
            }
            applied += 1;
        }

        for s in &plan.suggestions {
            if let Some(i) = position(&s.product, &s.branch_id) {
                let row = &mut updated[i];
                match s.product.unit.convert_to_label(s.new_to_order, &row.unit) {
                    Some(qty) => row.order_qty = Some(round_quantity(qty)),
                    None => skipped += 1,
                }
            }
        }

        tracing::info!(
            "套用調撥計劃：{} 筆調撥，{} 筆採購建議，{} 筆無法換算而略過",
            applied,
            plan.suggestions.len(),
            skipped
        );

        updated
    }
}
