//! 整合主計算器

use pharmacy_core::{Classifier, PlanningConfig, ProductAggregate, ProductRow, RawRecord, RedistributionPlan};
use rayon::prelude::*;
use std::collections::BTreeSet;

use crate::aggregation::QuantityAggregator;
use crate::redistribution::RedistributionPlanner;
use crate::suggestion::PurchaseSuggestionCalculator;
use crate::{ConsolidationResult, ConsolidationWarning};

/// 整合計算器
pub struct ConsolidationCalculator {
    /// 規劃配置
    config: PlanningConfig,

    /// 產品分類器
    classifier: Classifier,
}

impl ConsolidationCalculator {
    /// 創建新的整合計算器
    pub fn new(config: PlanningConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }

    /// 規劃配置
    pub fn config(&self) -> &PlanningConfig {
        &self.config
    }

    /// 由原始資料列計算
    pub fn calculate_records(&self, records: &[RawRecord]) -> pharmacy_core::Result<ConsolidationResult> {
        let rows: Vec<ProductRow> = records.iter().map(RawRecord::to_product_row).collect();
        self.calculate(&rows)
    }

    /// 主計算入口
    pub fn calculate(&self, rows: &[ProductRow]) -> pharmacy_core::Result<ConsolidationResult> {
        tracing::info!(
            "開始整合計算：資料列 {} 筆，分店 {} 間",
            rows.len(),
            self.config.branches.len()
        );

        let start_time = std::time::Instant::now();

        self.config.validate()?;

        let mut result = ConsolidationResult::empty();
        self.check_config(&mut result);
        self.check_rows(rows, &mut result);

        // Step 1: 彙總
        tracing::debug!("Step 1: 數量彙總");
        let outcome = QuantityAggregator::aggregate(rows, &self.classifier);
        result.rows_read = outcome.rows_read;
        result.rows_dropped = outcome.rows_dropped;
        if outcome.rows_dropped > 0 {
            result.add_warning(ConsolidationWarning::warning(
                "rows".to_string(),
                format!("{} 筆資料列缺少代碼與描述，已略過", outcome.rows_dropped),
            ));
        }
        tracing::debug!("批發商數量: {}", outcome.by_drugstore.len());

        // Step 2: 逐批發商規劃（批發商之間互不影響，可平行計算）
        tracing::debug!("Step 2: 調撥規劃");
        let drugstores: Vec<_> = outcome.by_drugstore.iter().collect();
        let plans: Vec<_> = drugstores
            .par_iter()
            .map(|(drugstore_id, aggregates)| ((*drugstore_id).clone(), self.plan_drugstore(aggregates)))
            .collect();

        for (drugstore_id, plan) in plans {
            tracing::debug!(
                "批發商 {}: {} 筆移動，{} 筆建議",
                drugstore_id,
                plan.moves.len(),
                plan.suggestions.len()
            );
            result.plans.insert(drugstore_id, plan);
        }
        result.aggregates = outcome.by_drugstore;

        let elapsed = start_time.elapsed();
        result.calculation_time_ms = Some(elapsed.as_millis());

        tracing::info!(
            "整合計算完成：產品 {} 項，調撥 {} 筆，耗時 {:?}",
            result.aggregates.values().map(Vec::len).sum::<usize>(),
            result.plans.values().map(|p| p.transfers().count()).sum::<usize>(),
            elapsed
        );

        Ok(result)
    }

    /// 規劃單一批發商的產品
    pub fn plan_drugstore(&self, aggregates: &[ProductAggregate]) -> RedistributionPlan {
        let planned: Vec<ProductAggregate> = aggregates
            .iter()
            .filter(|a| a.has_need_in(self.config.branch_ids()))
            .cloned()
            .collect();

        let moves = RedistributionPlanner::plan(&planned, &self.config);
        let suggestions = PurchaseSuggestionCalculator::calculate(&planned, &moves, &self.config);

        RedistributionPlan { moves, suggestions }
    }

    fn check_config(&self, result: &mut ConsolidationResult) {
        if self.config.branches.is_empty() {
            result.add_warning(ConsolidationWarning::warning(
                "config".to_string(),
                "未配置任何分店，不會產生調撥".to_string(),
            ));
        }

        for branch in self.config.unknown_buffer_branches() {
            tracing::warn!("保留庫存設定的分店未配置: {}", branch);
            result.add_warning(ConsolidationWarning::warning(
                branch.to_string(),
                "保留庫存設定的分店未配置，已忽略".to_string(),
            ));
        }
    }

    fn check_rows(&self, rows: &[ProductRow], result: &mut ConsolidationResult) {
        let unknown: BTreeSet<&str> = rows
            .iter()
            .map(|r| r.branch_id.as_str())
            .filter(|id| !id.is_empty() && !self.config.branch_ids().any(|b| b == *id))
            .collect();

        for branch in unknown {
            result.add_warning(ConsolidationWarning::info(
                branch.to_string(),
                "資料列的分店未配置，不參與調撥".to_string(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WarningSeverity;
    use pharmacy_core::{FamilyMapResolver, FamilyMapping, PharmacyError};
    use rust_decimal::Decimal;

    fn calculator(config: PlanningConfig) -> ConsolidationCalculator {
        let classifier = Classifier::new(FamilyMapResolver::new(&[
            FamilyMapping::new("GENFAR", "dist-norte"),
            FamilyMapping::new("MK", "dist-sur"),
        ]));
        ConsolidationCalculator::new(config, classifier)
    }

    fn config() -> PlanningConfig {
        PlanningConfig::new()
            .with_branch("jerusalen-1", "Jerusalen 1")
            .with_branch("jerusalen-2", "Jerusalen 2")
    }

    #[test]
    fn test_calculate_plans_each_drugstore_separately() {
        let rows = vec![
            ProductRow::new("jerusalen-1", "A-1", "ACETAMINOFEN")
                .with_family("GENFAR")
                .with_order_qty(Decimal::from(6)),
            ProductRow::new("jerusalen-2", "A-1", "ACETAMINOFEN")
                .with_family("GENFAR")
                .with_stock_qty(Decimal::from(4)),
            ProductRow::new("jerusalen-1", "M-1", "LOSARTAN")
                .with_family("MK")
                .with_stock_qty(Decimal::from(9)),
            ProductRow::new("jerusalen-2", "M-1", "LOSARTAN")
                .with_family("MK")
                .with_order_qty(Decimal::from(2)),
        ];

        let result = calculator(config()).calculate(&rows).unwrap();

        assert_eq!(result.plans.len(), 2);

        let norte = result.plan_for("dist-norte").unwrap();
        let transfers: Vec<_> = norte.transfers().collect();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from_branch, "jerusalen-2");
        assert_eq!(transfers[0].quantity, Decimal::from(4));
        assert_eq!(norte.total_to_order(), Decimal::from(2));

        let sur = result.plan_for("dist-sur").unwrap();
        assert_eq!(sur.transfers().count(), 1);
        assert_eq!(sur.total_to_order(), Decimal::ZERO);

        assert!(result.calculation_time_ms.is_some());
    }

    #[test]
    fn test_products_without_need_are_not_planned() {
        let rows = vec![
            ProductRow::new("jerusalen-1", "A-1", "ACETAMINOFEN").with_stock_qty(Decimal::from(6)),
            ProductRow::new("jerusalen-2", "A-1", "ACETAMINOFEN").with_stock_qty(Decimal::from(4)),
        ];

        let result = calculator(config()).calculate(&rows).unwrap();
        let plan = result.plan_for(pharmacy_core::UNASSIGNED_DRUGSTORE_ID).unwrap();

        assert!(plan.is_empty());
        assert!(plan.suggestions.is_empty());
        assert_eq!(result.aggregates_for(pharmacy_core::UNASSIGNED_DRUGSTORE_ID).len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let cfg = config().with_reserve_buffer("jerusalen-1", Decimal::from(-2));

        assert!(matches!(
            calculator(cfg).calculate(&[]),
            Err(PharmacyError::NegativeReserveBuffer { .. })
        ));
    }

    #[test]
    fn test_warnings_for_unknown_branches_and_dropped_rows() {
        let cfg = config().with_reserve_buffer("bodega", Decimal::ONE);
        let rows = vec![
            ProductRow::new("jerusalen-9", "A-1", "ACETAMINOFEN").with_order_qty(Decimal::ONE),
            ProductRow::new("jerusalen-1", "", "").with_order_qty(Decimal::ONE),
        ];

        let result = calculator(cfg).calculate(&rows).unwrap();

        assert_eq!(result.rows_read, 2);
        assert_eq!(result.rows_dropped, 1);
        assert!(result.warnings.iter().any(|w| w.subject == "bodega"));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.subject == "jerusalen-9" && w.severity == WarningSeverity::Info));
        assert!(!result.has_errors());
    }

    #[test]
    fn test_calculate_records_uses_aliases() {
        let records = vec![
            RawRecord::new("jerusalen-1")
                .with_field("CODIGO", "A-1")
                .with_field("A_PEDIR", "3")
                .with_field("FAMILIA", "GENFAR"),
            RawRecord::new("jerusalen-2")
                .with_field("CODE", "A-1")
                .with_field("STOCK", "10")
                .with_field("FAMILIA", "GENFAR"),
        ];

        let result = calculator(config()).calculate_records(&records).unwrap();
        let plan = result.plan_for("dist-norte").unwrap();

        assert_eq!(plan.transfers().count(), 1);
        assert_eq!(plan.total_to_order(), Decimal::ZERO);
    }

    #[test]
    fn test_calculation_is_repeatable() {
        let rows = vec![
            ProductRow::new("jerusalen-1", "A-1", "ACETAMINOFEN")
                .with_family("GENFAR")
                .with_order_qty(Decimal::new(75, 1)),
            ProductRow::new("jerusalen-2", "A-1", "ACETAMINOFEN")
                .with_family("GENFAR")
                .with_stock_qty(Decimal::new(33, 1)),
        ];
        let calc = calculator(config());

        let first = calc.calculate(&rows).unwrap();
        let second = calc.calculate(&rows).unwrap();
        assert_eq!(first.combined_plan(), second.combined_plan());
    }
}
