//! 調撥計劃模型（規劃結果）

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::AggregateKey;
use crate::BranchId;

/// 移動類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    /// 分店以自身庫存滿足需求（來源 = 目的，僅供稽核）
    LocalCoverage,
    /// 分店間調撥
    Transfer,
}

/// 一筆調撥（規劃結果的最小單位）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferMove {
    /// 產品彙總鍵
    pub product: AggregateKey,

    /// 產品代碼
    pub code: String,

    /// 來源分店
    pub from_branch: BranchId,

    /// 目的分店
    pub to_branch: BranchId,

    /// 數量（已捨入到 4 位小數）
    pub quantity: Decimal,

    /// 移動類型
    pub kind: MoveKind,

    /// 目的分店的原始需求
    pub destination_need: Decimal,

    /// 目的分店以自身庫存滿足的數量
    pub destination_local_covered: Decimal,

    /// 此筆移動前的缺口
    pub deficit_before: Decimal,

    /// 此筆移動後的缺口
    pub deficit_after: Decimal,

    /// 產生此筆移動時各分店的剩餘可用庫存
    pub stock_snapshot: BTreeMap<BranchId, Decimal>,
}

impl TransferMove {
    /// 是否為本地滿足記錄
    pub fn is_local(&self) -> bool {
        self.kind == MoveKind::LocalCoverage
    }
}

/// 最終採購建議（每個產品、每個分店一筆）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseSuggestion {
    /// 產品彙總鍵
    pub product: AggregateKey,

    /// 產品代碼
    pub code: String,

    /// 分店
    pub branch_id: BranchId,

    /// 原始需求
    pub need: Decimal,

    /// 自身庫存滿足的數量
    pub local_covered: Decimal,

    /// 調入滿足的數量
    pub transfer_covered: Decimal,

    /// 調入總量
    pub incoming: Decimal,

    /// 調出總量（僅供參考，不影響建議量）
    pub outgoing: Decimal,

    /// 調撥後仍需採購的數量
    pub new_to_order: Decimal,
}

/// 調撥計劃
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedistributionPlan {
    /// 依產生順序排列的移動
    pub moves: Vec<TransferMove>,

    /// 最終採購建議
    pub suggestions: Vec<PurchaseSuggestion>,
}

impl RedistributionPlan {
    /// 創建空的計劃
    pub fn empty() -> Self {
        Self::default()
    }

    /// 是否沒有任何移動
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// 合併另一份計劃（保持順序）
    pub fn extend(&mut self, other: RedistributionPlan) {
        self.moves.extend(other.moves);
        self.suggestions.extend(other.suggestions);
    }

    /// 分店間調撥（不含本地滿足記錄）
    pub fn transfers(&self) -> impl Iterator<Item = &TransferMove> + '_ {
        self.moves.iter().filter(|m| !m.is_local())
    }

    /// 某產品的所有移動
    pub fn moves_for<'a>(&'a self, product: &'a AggregateKey) -> impl Iterator<Item = &'a TransferMove> + 'a {
        self.moves.iter().filter(move |m| &m.product == product)
    }

    /// 調撥後總採購量
    pub fn total_to_order(&self) -> Decimal {
        self.suggestions.iter().map(|s| s.new_to_order).sum()
    }
}
