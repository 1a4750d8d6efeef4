//! 產品彙總模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::units::AggregateUnit;
use crate::{BranchId, DrugstoreId};

/// 彙總鍵（同一批發商內唯一識別一個產品）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregateKey {
    /// 批發商ID
    pub drugstore_id: DrugstoreId,

    /// 識別碼（代碼優先，否則為描述）
    pub identity: String,

    /// 產品描述
    pub description: String,

    /// 彙總單位
    pub unit: AggregateUnit,

    /// 藥廠/系列
    pub family: String,
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}",
            self.drugstore_id, self.identity, self.description, self.unit, self.family
        )
    }
}

/// 單一分店的數量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchQuantities {
    /// 待訂購數量（需求）
    pub need: Decimal,

    /// 現有庫存
    pub stock: Decimal,

    /// 月平均銷量
    pub sales: Decimal,
}

impl BranchQuantities {
    /// 創建新的分店數量
    pub fn new(need: Decimal, stock: Decimal) -> Self {
        Self {
            need,
            stock,
            sales: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置月銷量
    pub fn with_sales(mut self, sales: Decimal) -> Self {
        self.sales = sales;
        self
    }
}

/// 產品彙總（一個批發商範圍內的一個產品）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAggregate {
    /// 彙總鍵
    pub key: AggregateKey,

    /// 產品代碼（可能為空）
    pub code: String,

    /// 各分店數量
    pub branches: BTreeMap<BranchId, BranchQuantities>,

    /// 總金額（換算後需求 × 單價）
    pub total_value: Decimal,

    /// 來源待訂購數量的最大小數位數（僅供顯示）
    pub max_source_decimals: u32,
}

impl ProductAggregate {
    /// 創建新的產品彙總
    pub fn new(key: AggregateKey, code: impl Into<String>) -> Self {
        Self {
            key,
            code: code.into(),
            branches: BTreeMap::new(),
            total_value: Decimal::ZERO,
            max_source_decimals: 0,
        }
    }

    /// 建構器模式：設置分店數量
    pub fn with_branch(mut self, branch_id: impl Into<BranchId>, quantities: BranchQuantities) -> Self {
        self.branches.insert(branch_id.into(), quantities);
        self
    }

    /// 累加分店數量
    pub fn accumulate(&mut self, branch_id: &str, quantities: BranchQuantities) {
        let slot = self.branches.entry(branch_id.to_string()).or_default();
        slot.need += quantities.need;
        slot.stock += quantities.stock;
        slot.sales += quantities.sales;
    }

    /// 記錄觀察到的來源小數位數
    pub fn observe_source_decimals(&mut self, decimals: u32) {
        self.max_source_decimals = self.max_source_decimals.max(decimals);
    }

    /// 取得分店數量（沒有資料時為 0）
    pub fn branch(&self, branch_id: &str) -> BranchQuantities {
        self.branches.get(branch_id).copied().unwrap_or_default()
    }

    /// 產品描述
    pub fn description(&self) -> &str {
        &self.key.description
    }

    /// 彙總單位
    pub fn unit(&self) -> &AggregateUnit {
        &self.key.unit
    }

    /// 藥廠/系列
    pub fn family(&self) -> &str {
        &self.key.family
    }

    /// 所有分店的總需求
    pub fn total_need(&self) -> Decimal {
        self.branches.values().map(|b| b.need).sum()
    }

    /// 所有分店的總庫存
    pub fn total_stock(&self) -> Decimal {
        self.branches.values().map(|b| b.stock).sum()
    }

    /// 指定分店中是否有任一分店需要訂購
    pub fn has_need_in<'a>(&self, branch_ids: impl IntoIterator<Item = &'a str>) -> bool {
        branch_ids
            .into_iter()
            .any(|id| self.branch(id).need > Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::CanonicalUnit;

    fn key() -> AggregateKey {
        AggregateKey {
            drugstore_id: "dist-norte".to_string(),
            identity: "A-100".to_string(),
            description: "JARABE".to_string(),
            unit: AggregateUnit::Canonical(CanonicalUnit::Ml),
            family: "GENFAR".to_string(),
        }
    }

    #[test]
    fn test_accumulate_branch_quantities() {
        let mut aggregate = ProductAggregate::new(key(), "A-100");
        aggregate.accumulate("b1", BranchQuantities::new(Decimal::from(5), Decimal::from(2)));
        aggregate.accumulate(
            "b1",
            BranchQuantities::new(Decimal::from(3), Decimal::ONE).with_sales(Decimal::TEN),
        );
        aggregate.accumulate("b2", BranchQuantities::new(Decimal::ZERO, Decimal::from(20)));

        let b1 = aggregate.branch("b1");
        assert_eq!(b1.need, Decimal::from(8));
        assert_eq!(b1.stock, Decimal::from(3));
        assert_eq!(b1.sales, Decimal::TEN);
        assert_eq!(aggregate.total_need(), Decimal::from(8));
        assert_eq!(aggregate.total_stock(), Decimal::from(23));
        assert_eq!(aggregate.branch("missing"), BranchQuantities::default());
    }

    #[test]
    fn test_has_need_in_configured_branches() {
        let aggregate = ProductAggregate::new(key(), "A-100")
            .with_branch("b1", BranchQuantities::new(Decimal::ZERO, Decimal::from(4)))
            .with_branch("b9", BranchQuantities::new(Decimal::ONE, Decimal::ZERO));

        assert!(!aggregate.has_need_in(["b1", "b2"]));
        assert!(aggregate.has_need_in(["b1", "b9"]));
    }

    #[test]
    fn test_key_display() {
        assert_eq!(key().to_string(), "dist-norte|A-100|JARABE|ml|GENFAR");
    }
}
