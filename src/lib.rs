//! # Pharmacy
//!
//! 連鎖藥局庫存整合與分店間調撥規劃
//!
//! - [`pharmacy_core`]：資料模型（單位、資料列、彙總、分類、配置、計劃）
//! - [`pharmacy_calc`]：彙總、調撥規劃、採購建議與計劃套用
//! - [`pharmacy_report`]：匯出用報表

pub use pharmacy_calc;
pub use pharmacy_core;
pub use pharmacy_report;

pub use pharmacy_calc::{ConsolidationCalculator, ConsolidationResult, ConsolidationWarning, WarningSeverity};
pub use pharmacy_core::{
    Classifier, DrugstoreCatalog, PharmacyError, PlanningConfig, ProductRow, RawRecord, RedistributionPlan, Result,
};
pub use rust_decimal::Decimal;

use chrono::NaiveDate;
use pharmacy_report::{DrugstoreSummaryRow, MovementRow, PurchaseRow, ReportBuilder};

/// 單一批發商的匯出資料
#[derive(Debug, Clone)]
pub struct DrugstoreExport {
    /// 批發商ID
    pub drugstore_id: String,

    /// 彙總表檔名
    pub file_name: String,

    /// 彙總表
    pub summary: Vec<DrugstoreSummaryRow>,
}

/// 一次計算的完整匯出資料
#[derive(Debug, Clone)]
pub struct ExportBundle {
    /// 調撥明細檔名
    pub movements_file: String,

    /// 調撥明細（不含本地滿足）
    pub movements: Vec<MovementRow>,

    /// 最終採購檔名
    pub purchases_file: String,

    /// 最終採購表
    pub purchases: Vec<PurchaseRow>,

    /// 各批發商彙總表
    pub drugstores: Vec<DrugstoreExport>,
}

impl ExportBundle {
    /// 由計算結果建立匯出資料
    pub fn build(result: &ConsolidationResult, builder: &ReportBuilder<'_>, date: NaiveDate) -> Self {
        let plan = result.combined_plan();

        let drugstores = result
            .aggregates
            .iter()
            .map(|(drugstore_id, aggregates)| DrugstoreExport {
                drugstore_id: drugstore_id.clone(),
                file_name: pharmacy_report::export_file_name(&format!("Pedidos_{drugstore_id}"), date),
                summary: builder.drugstore_summary(aggregates),
            })
            .collect();

        Self {
            movements_file: pharmacy_report::export_file_name("Redistribucion", date),
            movements: builder.movement_rows(&plan, false),
            purchases_file: pharmacy_report::export_file_name("CompraFinal", date),
            purchases: builder.purchase_rows(&plan),
            drugstores,
        }
    }
}
