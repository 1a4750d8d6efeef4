//! # Pharmacy Core
//!
//! 核心資料模型與類型定義

pub mod aggregate;
pub mod classification;
pub mod config;
pub mod plan;
pub mod quantity;
pub mod row;
pub mod units;

// Re-export 主要類型
pub use aggregate::{AggregateKey, BranchQuantities, ProductAggregate};
pub use classification::{
    Classification, Classifier, Drugstore, DrugstoreCatalog, DrugstoreResolver, FamilyMapResolver, FamilyMapping,
    LabMapping, ProductOverride, UNASSIGNED_DRUGSTORE_ID, UNASSIGNED_DRUGSTORE_NAME,
};
pub use config::{Branch, PlanningConfig};
pub use plan::{MoveKind, PurchaseSuggestion, RedistributionPlan, TransferMove};
pub use row::{ProductRow, RawRecord};
pub use units::{AggregateUnit, CanonicalUnit};

/// 分店ID
pub type BranchId = String;

/// 藥品批發商（droguería）ID
pub type DrugstoreId = String;

/// 錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PharmacyError {
    #[error("分店ID不可為空")]
    EmptyBranchId,

    #[error("分店重複: {0}")]
    DuplicateBranch(String),

    #[error("分店 {branch} 的保留庫存不可為負數: {buffer}")]
    NegativeReserveBuffer {
        branch: String,
        buffer: rust_decimal::Decimal,
    },

    #[error("產品 {product} 的包裝係數必須大於 0: {factor}")]
    InvalidPackagingFactor {
        product: String,
        factor: rust_decimal::Decimal,
    },

    #[error("配置解析錯誤: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PharmacyError>;
