//! 調撥明細表

use pharmacy_core::{MoveKind, RedistributionPlan, TransferMove};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ReportBuilder;

/// 調撥明細的一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRow {
    pub drugstore: String,
    pub code: String,
    pub product: String,
    pub from_branch: String,
    pub to_branch: String,
    pub quantity: Decimal,
    pub unit: String,
    pub kind: MoveKind,

    /// (分店名稱, 剩餘可用庫存)，依配置順序
    pub stock_snapshot: Vec<(String, Decimal)>,
}

impl ReportBuilder<'_> {
    /// 調撥明細（`include_local` 為 false 時略過本地滿足記錄）
    pub fn movement_rows(&self, plan: &RedistributionPlan, include_local: bool) -> Vec<MovementRow> {
        plan.moves
            .iter()
            .filter(|m| include_local || !m.is_local())
            .map(|m| self.movement_row(m))
            .collect()
    }

    fn movement_row(&self, m: &TransferMove) -> MovementRow {
        let (quantity, unit) = self.packaged(&m.product.identity, m.quantity, m.product.unit.human_label());

        let description = if m.product.description.is_empty() {
            m.product.identity.as_str()
        } else {
            m.product.description.as_str()
        };

        MovementRow {
            drugstore: self.catalog.name_of(&m.product.drugstore_id).to_string(),
            code: m.code.clone(),
            product: description.to_string(),
            from_branch: self.config.branch_name(&m.from_branch).to_string(),
            to_branch: self.config.branch_name(&m.to_branch).to_string(),
            quantity,
            unit,
            kind: m.kind,
            stock_snapshot: self
                .config
                .branches
                .iter()
                .filter_map(|b| m.stock_snapshot.get(&b.id).map(|v| (b.name.clone(), *v)))
                .collect(),
        }
    }
}
