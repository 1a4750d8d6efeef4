//! 批發商彙總表與產品摘要

use pharmacy_core::{AggregateKey, BranchId, BranchQuantities, ProductAggregate, TransferMove};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::format::{DecimalStyle, NumberFormat};
use crate::ReportBuilder;

/// 彙總表中單一分店的欄位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchColumns {
    pub branch_id: BranchId,
    pub branch_name: String,
    pub stock: Decimal,
    pub sales: Decimal,
    pub need: Decimal,
}

/// 批發商彙總表的一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugstoreSummaryRow {
    pub drugstore_id: String,
    pub drugstore_name: String,
    pub code: String,
    pub product: String,
    pub family: String,

    /// 顯示用單位（pieza/otro 顯示為 unidad）
    pub unit_label: String,

    /// 各分店欄位（依配置順序）
    pub branches: Vec<BranchColumns>,

    /// 所有分店的換算後需求合計
    pub total_need: Decimal,

    /// 總金額
    pub total_value: Decimal,

    /// 來源待訂購數量的小數位數
    pub source_decimals: u32,
}

impl DrugstoreSummaryRow {
    /// 以來源小數位數格式化需求合計
    pub fn formatted_total_need(&self, style: DecimalStyle) -> String {
        NumberFormat::new(self.source_decimals, style).format(self.total_need)
    }
}

/// 單一產品的摘要（產品詳細頁）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product: AggregateKey,
    pub code: String,
    pub unit_label: String,
    pub branches: Vec<BranchColumns>,
    pub total_stock: Decimal,
    pub total_need: Decimal,

    /// 此產品的所有移動（含本地滿足）
    pub moves: Vec<TransferMove>,
}

impl ProductSummary {
    /// 調入某分店的總量
    pub fn incoming_to(&self, branch_id: &str) -> Decimal {
        self.moves
            .iter()
            .filter(|m| !m.is_local() && m.to_branch == branch_id)
            .map(|m| m.quantity)
            .sum()
    }
}

impl ReportBuilder<'_> {
    fn branch_columns(&self, aggregate: &ProductAggregate) -> Vec<BranchColumns> {
        self.config
            .branches
            .iter()
            .map(|branch| {
                let BranchQuantities { need, stock, sales } = aggregate.branch(&branch.id);
                BranchColumns {
                    branch_id: branch.id.clone(),
                    branch_name: branch.name.clone(),
                    stock,
                    sales,
                    need,
                }
            })
            .collect()
    }

    /// 批發商彙總表
    pub fn drugstore_summary(&self, aggregates: &[ProductAggregate]) -> Vec<DrugstoreSummaryRow> {
        aggregates
            .iter()
            .map(|aggregate| {
                let branches = self.branch_columns(aggregate);
                let total_need = branches.iter().map(|b| b.need).sum();
                DrugstoreSummaryRow {
                    drugstore_id: aggregate.key.drugstore_id.clone(),
                    drugstore_name: self.catalog.name_of(&aggregate.key.drugstore_id).to_string(),
                    code: aggregate.code.clone(),
                    product: aggregate.description().to_string(),
                    family: aggregate.family().to_string(),
                    unit_label: aggregate.unit().human_label().to_string(),
                    branches,
                    total_need,
                    total_value: aggregate.total_value,
                    source_decimals: aggregate.max_source_decimals,
                }
            })
            .collect()
    }

    /// 產品摘要
    pub fn product_summary<'m>(
        &self,
        aggregate: &ProductAggregate,
        moves: impl IntoIterator<Item = &'m TransferMove>,
    ) -> ProductSummary {
        let branches = self.branch_columns(aggregate);
        ProductSummary {
            product: aggregate.key.clone(),
            code: aggregate.code.clone(),
            unit_label: aggregate.unit().human_label().to_string(),
            total_stock: branches.iter().map(|b| b.stock).sum(),
            total_need: branches.iter().map(|b| b.need).sum(),
            branches,
            moves: moves
                .into_iter()
                .filter(|m| m.product == aggregate.key)
                .cloned()
                .collect(),
        }
    }
}
