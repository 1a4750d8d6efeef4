//! 最終採購表

use pharmacy_core::{PurchaseSuggestion, RedistributionPlan};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ReportBuilder;

/// 最終採購表的一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRow {
    pub drugstore: String,
    pub code: String,
    pub product: String,
    pub branch: String,
    pub need: Decimal,
    pub local_covered: Decimal,
    pub transfer_covered: Decimal,
    pub new_to_order: Decimal,
    pub unit: String,
}

impl ReportBuilder<'_> {
    /// 最終採購表
    ///
    /// 配置要求隱藏零採購時，只保留新採購量大於 0 的資料列。
    pub fn purchase_rows(&self, plan: &RedistributionPlan) -> Vec<PurchaseRow> {
        let rows: Vec<PurchaseRow> = plan
            .suggestions
            .iter()
            .filter(|s| !self.config.hide_zero_suggestions || s.new_to_order > Decimal::ZERO)
            .map(|s| self.purchase_row(s))
            .collect();

        tracing::debug!(
            "採購表：建議 {} 筆，輸出 {} 筆",
            plan.suggestions.len(),
            rows.len()
        );

        rows
    }

    fn purchase_row(&self, s: &PurchaseSuggestion) -> PurchaseRow {
        let identity = s.product.identity.as_str();
        let unit_label = s.product.unit.human_label();
        let convert = |qty: Decimal| self.packaged(identity, qty, unit_label).0;
        let (new_to_order, unit) = self.packaged(identity, s.new_to_order, unit_label);

        PurchaseRow {
            drugstore: self.catalog.name_of(&s.product.drugstore_id).to_string(),
            code: s.code.clone(),
            product: s.product.description.clone(),
            branch: self.config.branch_name(&s.branch_id).to_string(),
            need: convert(s.need),
            local_covered: convert(s.local_covered),
            transfer_covered: convert(s.transfer_covered),
            new_to_order,
            unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{aggregate, catalog, config};

    fn suggestion(branch: &str, need: i64, new_to_order: i64) -> PurchaseSuggestion {
        PurchaseSuggestion {
            product: aggregate(&[]).key,
            code: "A-100".to_string(),
            branch_id: branch.to_string(),
            need: Decimal::from(need),
            local_covered: Decimal::ZERO,
            transfer_covered: Decimal::from(need - new_to_order),
            incoming: Decimal::from(need - new_to_order),
            outgoing: Decimal::ZERO,
            new_to_order: Decimal::from(new_to_order),
        }
    }

    fn plan() -> RedistributionPlan {
        RedistributionPlan {
            moves: Vec::new(),
            suggestions: vec![suggestion("b1", 10, 4), suggestion("b2", 3, 0)],
        }
    }

    #[test]
    fn test_purchase_rows_keep_zero_rows_by_default() {
        let (config, catalog) = (config(), catalog());
        let rows = ReportBuilder::new(&config, &catalog).purchase_rows(&plan());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].branch, "Centro");
        assert_eq!(rows[0].new_to_order, Decimal::from(4));
        assert_eq!(rows[0].transfer_covered, Decimal::from(6));
        assert_eq!(rows[1].new_to_order, Decimal::ZERO);
    }

    #[test]
    fn test_purchase_rows_hide_zeros() {
        let (config, catalog) = (config().with_hide_zero_suggestions(true), catalog());
        let rows = ReportBuilder::new(&config, &catalog).purchase_rows(&plan());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].branch, "Centro");
    }
}
