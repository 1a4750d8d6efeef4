//! # Pharmacy Report
//!
//! 將彙總與調撥計劃投影成匯出用的表格資料列

pub mod format;
pub mod movements;
pub mod packaging;
pub mod purchase;
pub mod summary;

use pharmacy_core::{DrugstoreCatalog, PlanningConfig};
use rust_decimal::Decimal;

// Re-export 主要類型
pub use format::{export_file_name, format_currency_with_source, format_with_source, DecimalStyle, NumberFormat};
pub use movements::MovementRow;
pub use packaging::{PackagingConversion, PackagingTable};
pub use purchase::PurchaseRow;
pub use summary::{BranchColumns, DrugstoreSummaryRow, ProductSummary};

/// 報表建構器
///
/// 持有產生報表所需的配置與目錄（分店名稱、批發商名稱、包裝換算）。
pub struct ReportBuilder<'a> {
    config: &'a PlanningConfig,
    catalog: &'a DrugstoreCatalog,
    packaging: Option<&'a PackagingTable>,
}

impl<'a> ReportBuilder<'a> {
    /// 創建新的報表建構器
    pub fn new(config: &'a PlanningConfig, catalog: &'a DrugstoreCatalog) -> Self {
        Self {
            config,
            catalog,
            packaging: None,
        }
    }

    /// 建構器模式：設置包裝換算
    pub fn with_packaging(mut self, packaging: &'a PackagingTable) -> Self {
        self.packaging = Some(packaging);
        self
    }

    /// 套用包裝換算，返回 (數量, 單位標籤)
    fn packaged(&self, identity: &str, qty: Decimal, unit_label: &str) -> (Decimal, String) {
        let (qty, unit) = match self.packaging {
            Some(table) => table.convert(identity, qty, unit_label),
            None => (qty, unit_label),
        };
        (qty, unit.to_string())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use pharmacy_core::{
        AggregateKey, AggregateUnit, BranchQuantities, CanonicalUnit, DrugstoreCatalog, LabMapping, PlanningConfig,
        ProductAggregate,
    };
    use rust_decimal::Decimal;

    pub fn config() -> PlanningConfig {
        PlanningConfig::new()
            .with_branch("b1", "Centro")
            .with_branch("b2", "Norte")
    }

    pub fn catalog() -> DrugstoreCatalog {
        DrugstoreCatalog::from_lab_mappings(&[LabMapping {
            laboratory: "GENFAR".to_string(),
            drugstore: "Distribuidora Norte".to_string(),
        }])
    }

    /// (分店ID, 需求, 庫存)
    pub fn aggregate(branches: &[(&str, i64, i64)]) -> ProductAggregate {
        let key = AggregateKey {
            drugstore_id: "distribuidora-norte".to_string(),
            identity: "A-100".to_string(),
            description: "ACETAMINOFEN 500MG".to_string(),
            unit: AggregateUnit::Canonical(CanonicalUnit::Pieza),
            family: "GENFAR".to_string(),
        };
        branches
            .iter()
            .fold(ProductAggregate::new(key, "A-100"), |agg, (id, need, stock)| {
                agg.with_branch(*id, BranchQuantities::new(Decimal::from(*need), Decimal::from(*stock)))
            })
    }
}
