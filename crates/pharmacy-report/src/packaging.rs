//! 包裝換算
//!
//! 每個產品可設定 `1 目標單位 = factor 來源單位`，匯出時以目標單位顯示數量。

use pharmacy_core::{PharmacyError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 單一產品的包裝換算
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingConversion {
    /// 來源單位（彙總單位）
    pub source_unit: String,

    /// 目標單位
    pub target_unit: String,

    /// 1 目標單位等於多少來源單位
    pub factor: Decimal,

    /// 是否無條件進位
    #[serde(default)]
    pub round_up: bool,
}

impl PackagingConversion {
    /// 創建新的包裝換算（係數必須大於 0）
    pub fn new(
        product: &str,
        source_unit: impl Into<String>,
        target_unit: impl Into<String>,
        factor: Decimal,
    ) -> Result<Self> {
        if factor <= Decimal::ZERO {
            return Err(PharmacyError::InvalidPackagingFactor {
                product: product.to_string(),
                factor,
            });
        }

        Ok(Self {
            source_unit: source_unit.into(),
            target_unit: target_unit.into(),
            factor,
            round_up: false,
        })
    }

    /// 建構器模式：設置無條件進位
    pub fn with_round_up(mut self, round_up: bool) -> Self {
        self.round_up = round_up;
        self
    }

    /// 將來源單位數量換算為目標單位
    pub fn apply(&self, qty: Decimal) -> Decimal {
        let converted = qty.checked_div(self.factor).unwrap_or(qty);
        if self.round_up {
            converted.ceil()
        } else {
            converted
        }
    }
}

/// 包裝換算表（依產品識別鍵）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingTable {
    conversions: HashMap<String, PackagingConversion>,
}

impl PackagingTable {
    /// 創建空的換算表
    pub fn new() -> Self {
        Self::default()
    }

    /// 建構器模式：加入換算
    pub fn with_conversion(mut self, identity: impl Into<String>, conversion: PackagingConversion) -> Self {
        self.conversions.insert(identity.into(), conversion);
        self
    }

    /// 取得產品的換算
    pub fn get(&self, identity: &str) -> Option<&PackagingConversion> {
        self.conversions.get(identity)
    }

    /// 換算數量，返回 (數量, 單位標籤)；沒有設定時原樣返回
    pub fn convert<'a>(&'a self, identity: &str, qty: Decimal, unit_label: &'a str) -> (Decimal, &'a str) {
        match self.get(identity) {
            Some(conversion) => (conversion.apply(qty), conversion.target_unit.as_str()),
            None => (qty, unit_label),
        }
    }
}
