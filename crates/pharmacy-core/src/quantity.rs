//! 數量工具（解析、捨入）

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// 調撥數量保留的小數位數
pub const QUANTITY_DECIMALS: u32 = 4;

/// 捨入到 4 位小數（四捨五入，遠離零）
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// 負數視為 0
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// 來源數值的小數位數（由解析後的 scale 取得）
pub fn decimal_places(value: Decimal) -> u32 {
    value.scale()
}

/// 解析試算表儲存格文字
///
/// 支援的格式：
/// - `1.234,56`：點為千分位、逗號為小數點
/// - `1,234.56`：逗號為千分位、點為小數點
/// - `12,5`：只有逗號（小數點）
/// - `12.5` 或純數字
///
/// 空白或無法解析時返回 `None`。
pub fn parse_quantity(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let normalized = if is_grouped(s, '.', ',') {
        s.replace('.', "").replacen(',', ".", 1)
    } else if is_grouped(s, ',', '.') {
        s.replace(',', "")
    } else if is_comma_decimal(s) {
        s.replacen(',', ".", 1)
    } else {
        s.to_string()
    };

    let unsigned = normalized.strip_prefix('+').unwrap_or(normalized.as_str());
    Decimal::from_str(unsigned)
        .or_else(|_| Decimal::from_scientific(unsigned))
        .ok()
}

/// 檢查 `\d{1,3}(<group>\d{3})+(<decimal>\d+)?` 格式
fn is_grouped(s: &str, group: char, decimal: char) -> bool {
    let (int_part, frac_part) = match s.split_once(decimal) {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };

    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
    }

    let mut groups = int_part.split(group);
    let head = match groups.next() {
        Some(h) => h,
        None => return false,
    };
    if head.is_empty() || head.len() > 3 || !head.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let mut tail_count = 0;
    for g in groups {
        if g.len() != 3 || !g.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        tail_count += 1;
    }
    tail_count > 0
}

/// 檢查 `[-+]?\d+(,\d+)?` 格式
fn is_comma_decimal(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int_part, frac_part) = match body.split_once(',') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };
    let digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
    digits(int_part) && frac_part.map_or(true, digits)
}
