//! 匯入資料列模型
//!
//! `RawRecord` 是外部讀檔器產生的「欄位名稱 → 儲存格文字」對應，
//! 欄位別名在這裡統一解析成強型別的 `ProductRow`，之後的彙總與規劃
//! 只接觸 `ProductRow`。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::quantity::parse_quantity;
use crate::BranchId;

/// 缺少單位欄位時的預設單位
pub const DEFAULT_UNIT_LABEL: &str = "Unidad";

const CODE_ALIASES: &[&str] = &["CODIGO", "CODE"];
const DESCRIPTION_ALIASES: &[&str] = &["DESCRIPCION", "NAME"];
const UNIT_ALIASES: &[&str] = &["UNI_MED", "UNIDAD", "UNIT"];
const ORDER_ALIASES: &[&str] = &["A_PEDIR", "APEDIR"];
const STOCK_ALIASES: &[&str] = &["EXISTENCIA", "EXISTEN", "STOCK"];
const SALES_ALIASES: &[&str] = &[
    "VTA_PROMMENSUAL",
    "VTA_PROM_MENSUAL",
    "VTA_PROM.MENSUAL",
    "VTA_PROM",
    "PROM_MENS",
];
const PRICE_ALIASES: &[&str] = &["VALOR_UNIT", "VALOR_UNITARIO", "PRECIO"];
const FAMILY_ALIASES: &[&str] = &["FAMILIA"];

/// 單一分店的一筆產品資料（已正規化）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    /// 分店ID
    pub branch_id: BranchId,

    /// 產品代碼（可能為空）
    pub code: String,

    /// 產品描述（可能為空）
    pub description: String,

    /// 原始單位文字
    pub unit: String,

    /// 藥廠/系列
    pub family: String,

    /// 待訂購數量（無法解析時為 None）
    pub order_qty: Option<Decimal>,

    /// 現有庫存
    pub stock_qty: Option<Decimal>,

    /// 月平均銷量
    pub sales_qty: Option<Decimal>,

    /// 單價
    pub unit_price: Option<Decimal>,
}

impl ProductRow {
    /// 創建新的資料列
    pub fn new(branch_id: impl Into<BranchId>, code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            branch_id: branch_id.into(),
            code: code.into().trim().to_string(),
            description: description.into().trim().to_string(),
            unit: DEFAULT_UNIT_LABEL.to_string(),
            family: String::new(),
            order_qty: None,
            stock_qty: None,
            sales_qty: None,
            unit_price: None,
        }
    }

    /// 建構器模式：設置單位
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into().trim().to_string();
        self
    }

    /// 建構器模式：設置藥廠/系列
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// 建構器模式：設置待訂購數量
    pub fn with_order_qty(mut self, qty: Decimal) -> Self {
        self.order_qty = Some(qty);
        self
    }

    /// 建構器模式：設置庫存
    pub fn with_stock_qty(mut self, qty: Decimal) -> Self {
        self.stock_qty = Some(qty);
        self
    }

    /// 建構器模式：設置月銷量
    pub fn with_sales_qty(mut self, qty: Decimal) -> Self {
        self.sales_qty = Some(qty);
        self
    }

    /// 建構器模式：設置單價
    pub fn with_unit_price(mut self, price: Decimal) -> Self {
        self.unit_price = Some(price);
        self
    }

    /// 產品識別鍵：優先使用代碼，沒有代碼時使用描述
    pub fn identity_key(&self) -> Option<&str> {
        if !self.code.is_empty() {
            Some(&self.code)
        } else if !self.description.is_empty() {
            Some(&self.description)
        } else {
            None
        }
    }
}

/// 外部讀檔器產生的原始資料列
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// 分店ID（通常來自工作表名稱）
    pub branch_id: BranchId,

    /// 欄位名稱（大寫）→ 儲存格文字
    pub fields: HashMap<String, String>,
}

impl RawRecord {
    /// 創建新的原始資料列
    pub fn new(branch_id: impl Into<BranchId>) -> Self {
        Self {
            branch_id: branch_id.into(),
            fields: HashMap::new(),
        }
    }

    /// 建構器模式：加入欄位
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// 加入欄位（欄位名稱不分大小寫）
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .insert(name.trim().to_uppercase(), value.into());
    }

    /// 依別名順序取第一個非空白的欄位值
    fn lookup(&self, aliases: &[&str]) -> Option<&str> {
        aliases
            .iter()
            .filter_map(|alias| self.fields.get(*alias))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    fn text(&self, aliases: &[&str]) -> String {
        self.lookup(aliases).unwrap_or_default().to_string()
    }

    fn number(&self, aliases: &[&str]) -> Option<Decimal> {
        self.lookup(aliases).and_then(parse_quantity)
    }

    /// 解析欄位別名，轉換為強型別資料列
    pub fn to_product_row(&self) -> ProductRow {
        let unit = self
            .lookup(UNIT_ALIASES)
            .unwrap_or(DEFAULT_UNIT_LABEL)
            .to_string();

        ProductRow {
            branch_id: self.branch_id.trim().to_string(),
            code: self.text(CODE_ALIASES),
            description: self.text(DESCRIPTION_ALIASES),
            unit,
            family: self.text(FAMILY_ALIASES),
            order_qty: self.number(ORDER_ALIASES),
            stock_qty: self.number(STOCK_ALIASES),
            sales_qty: self.number(SALES_ALIASES),
            unit_price: self.number(PRICE_ALIASES),
        }
    }
}
