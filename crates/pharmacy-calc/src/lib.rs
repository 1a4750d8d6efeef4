//! # Pharmacy Calculation Engine
//!
//! 彙總、調撥規劃與採購建議計算引擎

pub mod aggregation;
pub mod apply;
pub mod calculator;
pub mod redistribution;
pub mod suggestion;

use pharmacy_core::{DrugstoreId, ProductAggregate, RedistributionPlan};
use serde::Serialize;
use std::collections::BTreeMap;

// Re-export 主要類型
pub use aggregation::{AggregationOutcome, QuantityAggregator};
pub use apply::RedistributionApplier;
pub use calculator::ConsolidationCalculator;
pub use redistribution::RedistributionPlanner;
pub use suggestion::PurchaseSuggestionCalculator;

/// 整合計算結果
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationResult {
    /// 各批發商的產品彙總（依首次出現順序）
    pub aggregates: BTreeMap<DrugstoreId, Vec<ProductAggregate>>,

    /// 各批發商的調撥計劃
    pub plans: BTreeMap<DrugstoreId, RedistributionPlan>,

    /// 輸入資料列數
    pub rows_read: usize,

    /// 因缺少代碼與描述而捨棄的資料列數
    pub rows_dropped: usize,

    /// 警告信息
    pub warnings: Vec<ConsolidationWarning>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl ConsolidationResult {
    /// 創建空的計算結果
    pub fn empty() -> Self {
        Self {
            aggregates: BTreeMap::new(),
            plans: BTreeMap::new(),
            rows_read: 0,
            rows_dropped: 0,
            warnings: Vec::new(),
            calculation_time_ms: None,
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: ConsolidationWarning) {
        self.warnings.push(warning);
    }

    /// 單一批發商的計劃
    pub fn plan_for(&self, drugstore_id: &str) -> Option<&RedistributionPlan> {
        self.plans.get(drugstore_id)
    }

    /// 單一批發商的產品彙總
    pub fn aggregates_for(&self, drugstore_id: &str) -> &[ProductAggregate] {
        self.aggregates
            .get(drugstore_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// 合併所有批發商的計劃（依批發商ID排序）
    pub fn combined_plan(&self) -> RedistributionPlan {
        let mut combined = RedistributionPlan::empty();
        for plan in self.plans.values() {
            combined.extend(plan.clone());
        }
        combined
    }

    /// 是否有錯誤等級的警告
    pub fn has_errors(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.severity == WarningSeverity::Error)
    }
}

/// 整合計算警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidationWarning {
    /// 相關對象（分店、產品或資料列）
    pub subject: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ConsolidationWarning {
    pub fn new(subject: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            subject,
            message,
            severity,
        }
    }

    pub fn info(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Info)
    }

    pub fn warning(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Warning)
    }

    pub fn error(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}
