//! 數字格式化與匯出檔名
//!
//! 依來源儲存格文字決定小數位數與小數點樣式：來源以逗號為小數點時輸出
//! `1.234,56`，否則輸出 `1,234.56`。

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// 來源文字為空時的最大小數位數
const MAX_FREE_DECIMALS: u32 = 4;

/// 金額的預設小數位數
const CURRENCY_DECIMALS: u32 = 2;

/// 小數點樣式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalStyle {
    /// `1,234.56`
    #[default]
    Dot,
    /// `1.234,56`
    Comma,
}

impl DecimalStyle {
    fn separators(self) -> (char, char) {
        match self {
            Self::Dot => ('.', ','),
            Self::Comma => (',', '.'),
        }
    }
}

/// 數字格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    /// 固定小數位數；`None` 表示最多 4 位並去除尾端 0
    pub decimals: Option<u32>,
    pub style: DecimalStyle,
}

impl NumberFormat {
    /// 創建固定小數位數的格式
    pub fn new(decimals: u32, style: DecimalStyle) -> Self {
        Self {
            decimals: Some(decimals),
            style,
        }
    }

    /// 由來源文字推斷格式，來源沒有小數部分時使用 `default_decimals`
    pub fn from_source(source: &str, default_decimals: u32) -> Self {
        let raw = source.trim();
        if raw.is_empty() {
            return Self {
                decimals: None,
                style: DecimalStyle::Dot,
            };
        }

        // 同時出現兩種符號時，最後出現者為小數點
        let last = raw.rfind(['.', ',']);
        let style = match last {
            Some(i) if raw[i..].starts_with(',') => DecimalStyle::Comma,
            _ => DecimalStyle::Dot,
        };
        let decimals = last
            .map(|i| {
                raw[i + 1..]
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .count() as u32
            })
            .filter(|n| *n > 0)
            .unwrap_or(default_decimals);

        Self::new(decimals, style)
    }

    /// 格式化數值
    pub fn format(&self, value: Decimal) -> String {
        let rounded = match self.decimals {
            Some(dp) => {
                let mut v = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
                v.rescale(dp);
                v
            }
            None => value
                .round_dp_with_strategy(MAX_FREE_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        };

        let (decimal_sep, group_sep) = self.style.separators();
        let text = rounded.abs().to_string();
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (text.as_str(), None),
        };

        let mut out = String::new();
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        out.push_str(&group_digits(int_part, group_sep));
        if let Some(frac) = frac_part {
            out.push(decimal_sep);
            out.push_str(frac);
        }
        out
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// 依來源文字格式化數量
pub fn format_with_source(source: &str, value: Decimal) -> String {
    NumberFormat::from_source(source, 0).format(value)
}

/// 依來源文字格式化金額（來源沒有小數時使用 2 位）
pub fn format_currency_with_source(source: &str, value: Decimal) -> String {
    let mut format = NumberFormat::from_source(source, CURRENCY_DECIMALS);
    if format.decimals.is_none() {
        format.decimals = Some(CURRENCY_DECIMALS);
    }
    format.format(value)
}

/// 帶日期的匯出檔名，例如 `Redistribucion_2025-11-03.xlsx`
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.xlsx", prefix, date.format("%Y-%m-%d"))
}
