//! 單位標準化與換算
//!
//! 只做「邏輯上」安全的換算：
//! - 公制容量（ml ↔ l）
//! - 公制質量（g ↔ kg）
//! - 件數（unidad ↔ pieza，1:1）
//!
//! 需要包裝係數的換算（例如 caja ↔ tableta）一律視為不可換算。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 標準單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalUnit {
    Ml,
    L,
    G,
    Kg,
    /// 瓶、罐、分配器等容器都視為 pieza
    Pieza,
    Unidad,
    Caja,
    Blister,
    Tableta,
    Sobre,
    Paquete,
    Bolsa,
    /// 未知單位（不可換算）
    Otro,
}

/// 公制換算係數
const METRIC_FACTOR: Decimal = Decimal::ONE_THOUSAND;

impl CanonicalUnit {
    /// 將任意單位文字對應到標準單位，未知單位返回 `Otro`
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "ML" | "M L" => Self::Ml,
            "L" | "LT" | "LITRO" | "LITROS" => Self::L,
            "G" | "GR" | "GRAMO" | "GRAMOS" => Self::G,
            "KG" | "KGS" | "KILOGRAMO" | "KILOGRAMOS" => Self::Kg,
            "FRASCO" | "BOTELLA" | "BOTE" | "DISPENSADOR" | "PIEZA" | "PIEZAS" => Self::Pieza,
            "UNIDAD" | "UNIDADES" => Self::Unidad,
            "CAJA" | "CAJAS" => Self::Caja,
            "BLISTER" | "BLISTERES" | "BLISTERS" => Self::Blister,
            "TABLETA" | "TABLETAS" => Self::Tableta,
            "SOBRE" | "SOBRES" => Self::Sobre,
            "PAQUETE" | "PAQUETES" => Self::Paquete,
            "BOLSA" | "BOLSAS" => Self::Bolsa,
            _ => Self::Otro,
        }
    }

    /// 標準單位代碼
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ml => "ml",
            Self::L => "l",
            Self::G => "g",
            Self::Kg => "kg",
            Self::Pieza => "pieza",
            Self::Unidad => "unidad",
            Self::Caja => "caja",
            Self::Blister => "blister",
            Self::Tableta => "tableta",
            Self::Sobre => "sobre",
            Self::Paquete => "paquete",
            Self::Bolsa => "bolsa",
            Self::Otro => "otro",
        }
    }

    /// 彙總用的基準單位：公制取小單位，unidad 統一為 pieza
    pub fn aggregation_base(self) -> Self {
        match self {
            Self::L => Self::Ml,
            Self::Kg => Self::G,
            Self::Unidad => Self::Pieza,
            other => other,
        }
    }

    /// 顯示用標籤
    pub fn human_label(self) -> &'static str {
        match self {
            Self::Pieza | Self::Unidad | Self::Otro => "unidad",
            other => other.as_str(),
        }
    }

    /// 兩個標準單位之間是否可換算
    pub fn can_convert_to(self, to: Self) -> bool {
        self == to
            || matches!(
                (self, to),
                (Self::Ml, Self::L)
                    | (Self::L, Self::Ml)
                    | (Self::G, Self::Kg)
                    | (Self::Kg, Self::G)
                    | (Self::Unidad, Self::Pieza)
                    | (Self::Pieza, Self::Unidad)
            )
    }

    /// 換算數量，不可換算時返回 `None`
    pub fn convert(self, qty: Decimal, to: Self) -> Option<Decimal> {
        if self == Self::Otro || to == Self::Otro {
            return (self == to).then_some(qty);
        }
        if self == to {
            return Some(qty);
        }

        match (self, to) {
            (Self::Ml, Self::L) | (Self::G, Self::Kg) => qty.checked_div(METRIC_FACTOR),
            (Self::L, Self::Ml) | (Self::Kg, Self::G) => qty.checked_mul(METRIC_FACTOR),
            (Self::Unidad, Self::Pieza) | (Self::Pieza, Self::Unidad) => Some(qty),
            _ => None,
        }
    }
}

impl fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單位文字正規化：去除前後空白、轉大寫、合併連續空白
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// 任意單位文字是否可換算
pub fn can_convert(from: &str, to: &str) -> bool {
    CanonicalUnit::from_label(from).can_convert_to(CanonicalUnit::from_label(to))
}

/// 依單位文字換算數量
///
/// 返回 `None` 表示「不可換算」，這是一個正常信號而非錯誤；
/// 呼叫端需自行決定後備策略。
pub fn convert(qty: Decimal, from: &str, to: &str) -> Option<Decimal> {
    CanonicalUnit::from_label(from).convert(qty, CanonicalUnit::from_label(to))
}

/// 彙總時使用的基準單位
pub fn base_canonical_for(label: &str) -> CanonicalUnit {
    CanonicalUnit::from_label(label).aggregation_base()
}

/// 彙總記錄的單位
///
/// 一般為標準單位；當一筆資料完全無法換算時保留原始單位文字。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateUnit {
    Canonical(CanonicalUnit),
    Raw(String),
}

impl AggregateUnit {
    /// 將此單位的數量換算回某筆資料的原始單位
    pub fn convert_to_label(&self, qty: Decimal, label: &str) -> Option<Decimal> {
        match self {
            Self::Canonical(unit) => unit.convert(qty, CanonicalUnit::from_label(label)),
            Self::Raw(raw) => (normalize_label(raw) == normalize_label(label)).then_some(qty),
        }
    }

    /// 顯示用標籤
    pub fn human_label(&self) -> &str {
        match self {
            Self::Canonical(unit) => unit.human_label(),
            Self::Raw(raw) => raw,
        }
    }
}

impl fmt::Display for AggregateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical(unit) => write!(f, "{unit}"),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}
