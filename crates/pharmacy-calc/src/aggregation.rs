//! 數量彙總
//!
//! 將各分店的資料列換算成標準單位後，依 (批發商, 識別鍵, 描述, 單位, 系列)
//! 彙總成 `ProductAggregate`。

use pharmacy_core::quantity::{decimal_places, non_negative};
use pharmacy_core::units::{base_canonical_for, normalize_label, CanonicalUnit};
use pharmacy_core::{
    AggregateKey, AggregateUnit, BranchQuantities, Classifier, DrugstoreId, ProductAggregate, ProductRow,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// 彙總結果
#[derive(Debug, Clone, Default)]
pub struct AggregationOutcome {
    /// 各批發商的產品彙總（批發商內依首次出現順序）
    pub by_drugstore: BTreeMap<DrugstoreId, Vec<ProductAggregate>>,

    /// 讀取的資料列數
    pub rows_read: usize,

    /// 無識別鍵而捨棄的資料列數
    pub rows_dropped: usize,
}

impl AggregationOutcome {
    /// 彙總記錄總數
    pub fn aggregate_count(&self) -> usize {
        self.by_drugstore.values().map(Vec::len).sum()
    }
}

/// 單筆資料列換算後的數量
pub(crate) struct ConvertedRow {
    pub(crate) unit: AggregateUnit,
    pub(crate) quantities: BranchQuantities,
}

/// 數量彙總器
pub struct QuantityAggregator;

impl QuantityAggregator {
    /// 彙總所有資料列
    pub fn aggregate(rows: &[ProductRow], classifier: &Classifier) -> AggregationOutcome {
        let mut outcome = AggregationOutcome {
            rows_read: rows.len(),
            ..Default::default()
        };
        let mut index: HashMap<AggregateKey, usize> = HashMap::new();

        for row in rows {
            let Some(identity) = row.identity_key() else {
                outcome.rows_dropped += 1;
                continue;
            };

            let classification = classifier.classify(identity, &row.family);
            let converted = Self::convert_row(row);

            let key = AggregateKey {
                drugstore_id: classification.drugstore_id,
                identity: identity.to_string(),
                description: row.description.clone(),
                unit: converted.unit,
                family: classification.family,
            };

            let bucket = outcome.by_drugstore.entry(key.drugstore_id.clone()).or_default();
            let position = *index.entry(key.clone()).or_insert_with(|| {
                bucket.push(ProductAggregate::new(key, row.code.clone()));
                bucket.len() - 1
            });
            let aggregate = &mut bucket[position];

            // 沒有分店的資料列只建立彙總記錄
            if row.branch_id.is_empty() {
                continue;
            }

            aggregate.accumulate(&row.branch_id, converted.quantities);
            if let Some(price) = row.unit_price {
                aggregate.total_value += converted.quantities.need * price;
            }
            aggregate.observe_source_decimals(row.order_qty.map(decimal_places).unwrap_or(0));
        }

        tracing::debug!(
            "彙總完成：讀取 {} 筆，捨棄 {} 筆，產品 {} 項",
            outcome.rows_read,
            outcome.rows_dropped,
            outcome.aggregate_count()
        );

        outcome
    }

    /// 換算單筆資料列的數量
    ///
    /// 缺少的數量視為 0。未知單位全部歸入 `otro`，不同文字的未知單位會合併。
    /// 三個數量都無法換算時（例如數值溢位），保留正規化後的原始單位與原始數值；
    /// 部分失敗時，失敗的欄位保留原始數值。
    pub(crate) fn convert_row(row: &ProductRow) -> ConvertedRow {
        let source = CanonicalUnit::from_label(&row.unit);
        let base = base_canonical_for(&row.unit);
        let convert = |qty: Option<Decimal>| source.convert(qty.unwrap_or(Decimal::ZERO), base);

        let need = convert(row.order_qty);
        let stock = convert(row.stock_qty);
        let sales = convert(row.sales_qty);

        let raw = |qty: Option<Decimal>| non_negative(qty.unwrap_or(Decimal::ZERO));

        if need.is_none() && stock.is_none() && sales.is_none() {
            return ConvertedRow {
                unit: AggregateUnit::Raw(normalize_label(&row.unit)),
                quantities: BranchQuantities::new(raw(row.order_qty), raw(row.stock_qty))
                    .with_sales(raw(row.sales_qty)),
            };
        }

        let pick = |converted: Option<Decimal>, original: Option<Decimal>| {
            non_negative(converted.or(original).unwrap_or(Decimal::ZERO))
        };

        ConvertedRow {
            unit: AggregateUnit::Canonical(base),
            quantities: BranchQuantities::new(pick(need, row.order_qty), pick(stock, row.stock_qty))
                .with_sales(pick(sales, row.sales_qty)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmacy_core::{FamilyMapResolver, FamilyMapping, ProductOverride};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn classifier() -> Classifier {
        Classifier::new(FamilyMapResolver::new(&[
            FamilyMapping::new("GENFAR", "dist-norte"),
            FamilyMapping::new("MK", "dist-sur"),
        ]))
    }

    #[test]
    fn test_aggregate_converts_to_base_unit() {
        let rows = vec![
            ProductRow::new("jerusalen-1", "A-100", "ALCOHOL")
                .with_unit("L")
                .with_family("GENFAR")
                .with_order_qty(dec("1.5"))
                .with_stock_qty(Decimal::ZERO),
            ProductRow::new("jerusalen-2", "A-100", "ALCOHOL")
                .with_unit("ml")
                .with_family("GENFAR")
                .with_order_qty(Decimal::ZERO)
                .with_stock_qty(Decimal::from(2000)),
        ];

        let outcome = QuantityAggregator::aggregate(&rows, &classifier());
        let aggregates = &outcome.by_drugstore["dist-norte"];
        assert_eq!(aggregates.len(), 1);

        let aggregate = &aggregates[0];
        assert_eq!(aggregate.key.unit, AggregateUnit::Canonical(CanonicalUnit::Ml));
        assert_eq!(aggregate.branch("jerusalen-1").need, Decimal::from(1500));
        assert_eq!(aggregate.branch("jerusalen-2").stock, Decimal::from(2000));
    }

    #[test]
    fn test_aggregate_sums_duplicate_rows() {
        let rows = vec![
            ProductRow::new("jerusalen-1", "B-1", "IBUPROFENO")
                .with_family("MK")
                .with_order_qty(Decimal::from(4))
                .with_unit_price(Decimal::from(100)),
            ProductRow::new("jerusalen-1", "B-1", "IBUPROFENO")
                .with_family("MK")
                .with_order_qty(dec("2.25"))
                .with_stock_qty(Decimal::ONE)
                .with_unit_price(Decimal::from(100)),
        ];

        let outcome = QuantityAggregator::aggregate(&rows, &classifier());
        let aggregate = &outcome.by_drugstore["dist-sur"][0];

        assert_eq!(aggregate.branch("jerusalen-1").need, dec("6.25"));
        assert_eq!(aggregate.branch("jerusalen-1").stock, Decimal::ONE);
        assert_eq!(aggregate.total_value, dec("625.00"));
        assert_eq!(aggregate.max_source_decimals, 2);
    }

    #[test]
    fn test_unkeyable_rows_are_dropped() {
        let rows = vec![
            ProductRow::new("jerusalen-1", "", "").with_order_qty(Decimal::TEN),
            ProductRow::new("jerusalen-1", "", "GASA ESTERIL").with_order_qty(Decimal::ONE),
        ];

        let outcome = QuantityAggregator::aggregate(&rows, &classifier());
        assert_eq!(outcome.rows_read, 2);
        assert_eq!(outcome.rows_dropped, 1);
        assert_eq!(outcome.aggregate_count(), 1);

        let aggregate = &outcome.by_drugstore[pharmacy_core::UNASSIGNED_DRUGSTORE_ID][0];
        assert_eq!(aggregate.key.identity, "GASA ESTERIL");
        assert!(aggregate.code.is_empty());
    }

    #[test]
    fn test_unknown_units_share_otro_aggregate() {
        let rows = vec![
            ProductRow::new("jerusalen-1", "C-9", "CREMA")
                .with_unit("Tubo")
                .with_order_qty(Decimal::from(3)),
            ProductRow::new("jerusalen-2", "C-9", "CREMA")
                .with_unit("TUBO ")
                .with_stock_qty(Decimal::from(4)),
            ProductRow::new("jerusalen-3", "C-9", "CREMA")
                .with_unit("Ampolla")
                .with_stock_qty(Decimal::ONE),
        ];

        let outcome = QuantityAggregator::aggregate(&rows, &classifier());
        let aggregates = &outcome.by_drugstore[pharmacy_core::UNASSIGNED_DRUGSTORE_ID];
        assert_eq!(aggregates.len(), 1);

        let aggregate = &aggregates[0];
        assert_eq!(aggregate.key.unit, AggregateUnit::Canonical(CanonicalUnit::Otro));
        assert_eq!(aggregate.branch("jerusalen-1").need, Decimal::from(3));
        assert_eq!(aggregate.branch("jerusalen-2").stock, Decimal::from(4));
        assert_eq!(aggregate.branch("jerusalen-3").stock, Decimal::ONE);
    }

    #[test]
    fn test_overflowing_row_keeps_normalized_raw_unit() {
        let rows = vec![ProductRow::new("jerusalen-1", "C-10", "ALCOHOL")
            .with_unit(" litro ")
            .with_order_qty(Decimal::MAX)
            .with_stock_qty(Decimal::MAX)
            .with_sales_qty(Decimal::MAX)];

        let outcome = QuantityAggregator::aggregate(&rows, &classifier());
        let aggregate = &outcome.by_drugstore[pharmacy_core::UNASSIGNED_DRUGSTORE_ID][0];

        assert_eq!(aggregate.key.unit, AggregateUnit::Raw("LITRO".to_string()));
        assert_eq!(aggregate.branch("jerusalen-1").need, Decimal::MAX);
    }

    #[test]
    fn test_negative_quantities_are_clamped() {
        let rows = vec![ProductRow::new("jerusalen-1", "D-1", "SUERO")
            .with_order_qty(Decimal::from(-3))
            .with_stock_qty(Decimal::from(-8))];

        let outcome = QuantityAggregator::aggregate(&rows, &classifier());
        let quantities = outcome.by_drugstore[pharmacy_core::UNASSIGNED_DRUGSTORE_ID][0].branch("jerusalen-1");

        assert_eq!(quantities.need, Decimal::ZERO);
        assert_eq!(quantities.stock, Decimal::ZERO);
    }

    #[test]
    fn test_override_moves_product_to_other_drugstore() {
        let classifier = classifier().with_override(
            "E-5",
            ProductOverride::default().with_drugstore_id("dist-sur"),
        );
        let rows = vec![ProductRow::new("jerusalen-1", "E-5", "VITAMINA C")
            .with_family("GENFAR")
            .with_order_qty(Decimal::ONE)];

        let outcome = QuantityAggregator::aggregate(&rows, &classifier);
        assert!(!outcome.by_drugstore.contains_key("dist-norte"));
        assert_eq!(outcome.by_drugstore["dist-sur"][0].family(), "GENFAR");
    }

    #[test]
    fn test_identity_switches_when_code_missing() {
        // 同一產品在某分店缺少代碼時，會以描述為識別鍵而分成兩筆彙總
        let rows = vec![
            ProductRow::new("jerusalen-1", "K-1", "KETOPROFENO").with_order_qty(Decimal::from(5)),
            ProductRow::new("jerusalen-2", "", "KETOPROFENO").with_stock_qty(Decimal::from(5)),
        ];

        let outcome = QuantityAggregator::aggregate(&rows, &classifier());
        let identities: Vec<_> = outcome.by_drugstore[pharmacy_core::UNASSIGNED_DRUGSTORE_ID]
            .iter()
            .map(|a| a.key.identity.as_str())
            .collect();

        assert_eq!(identities, vec!["K-1", "KETOPROFENO"]);
    }

    #[test]
    fn test_insertion_order_within_drugstore() {
        let rows = vec![
            ProductRow::new("jerusalen-1", "Z-1", "ZINC").with_order_qty(Decimal::ONE),
            ProductRow::new("jerusalen-1", "A-1", "ASPIRINA").with_order_qty(Decimal::ONE),
            ProductRow::new("jerusalen-2", "Z-1", "ZINC").with_stock_qty(Decimal::ONE),
        ];

        let outcome = QuantityAggregator::aggregate(&rows, &classifier());
        let identities: Vec<_> = outcome.by_drugstore[pharmacy_core::UNASSIGNED_DRUGSTORE_ID]
            .iter()
            .map(|a| a.key.identity.as_str())
            .collect();

        assert_eq!(identities, vec!["Z-1", "A-1"]);
    }
}
