//! # 分店間調撥規劃範例
//!
//! 三間分店、兩家批發商：
//! - 從原始資料列（欄位名稱與 Excel 匯出相同）開始
//! - 依藥廠對應批發商
//! - 規劃調撥並計算最終採購量
//! - 產生匯出表格
//!
//! 執行：`RUST_LOG=debug cargo run --example redistribution_demo`

use anyhow::Context;
use chrono::Local;
use pharmacy::pharmacy_report::{format_with_source, PackagingConversion, PackagingTable, ReportBuilder};
use pharmacy::{Classifier, ConsolidationCalculator, Decimal, DrugstoreCatalog, ExportBundle, PlanningConfig, RawRecord};
use tracing_subscriber::EnvFilter;

const CONFIG_JSON: &str = r#"{
    "branches": [
        {"id": "jerusalen-1", "name": "Jerusalen 1"},
        {"id": "jerusalen-2", "name": "Jerusalen 2"},
        {"id": "jerusalen-3", "name": "Jerusalen 3"}
    ],
    "reserve_buffer_by_branch": {"jerusalen-3": "5"},
    "hide_zero_suggestions": true
}"#;

const CATALOG_JSON: &str = r#"[
    {"LABORATORIO": "GENFAR", "DROGUERIA": "Droguería Cruz Verde"},
    {"LABORATORIO": "MK", "DROGUERIA": "Droguería La Rebaja"},
    {"LABORATORIO": "TECNOQUIMICAS", "DROGUERIA": "Droguería La Rebaja"}
]"#;

fn record(branch: &str, fields: &[(&str, &str)]) -> RawRecord {
    fields
        .iter()
        .fold(RawRecord::new(branch), |rec, (name, value)| rec.with_field(name, *value))
}

fn load_records() -> Vec<RawRecord> {
    vec![
        record(
            "jerusalen-1",
            &[
                ("CODIGO", "7702605"),
                ("DESCRIPCION", "ACETAMINOFEN 500MG X 100"),
                ("UNI_MED", "Tableta"),
                ("A_PEDIR", "300"),
                ("EXISTENCIA", "40"),
                ("VALOR_UNIT", "85,50"),
                ("FAMILIA", "Genfar"),
            ],
        ),
        record(
            "jerusalen-2",
            &[
                ("CODE", "7702605"),
                ("NAME", "ACETAMINOFEN 500MG X 100"),
                ("UNIDAD", "Tabletas"),
                ("APEDIR", "0"),
                ("STOCK", "180"),
                ("FAMILIA", "Genfar"),
            ],
        ),
        record(
            "jerusalen-3",
            &[
                ("CODIGO", "7702605"),
                ("DESCRIPCION", "ACETAMINOFEN 500MG X 100"),
                ("UNI_MED", "Tableta"),
                ("A_PEDIR", "20"),
                ("EXISTENCIA", "12"),
                ("FAMILIA", "Genfar"),
            ],
        ),
        record(
            "jerusalen-1",
            &[
                ("CODIGO", "ALC-700"),
                ("DESCRIPCION", "ALCOHOL ANTISEPTICO"),
                ("UNI_MED", "Litro"),
                ("A_PEDIR", "2,5"),
                ("EXISTENCIA", "0"),
                ("FAMILIA", "Tecnoquímicas"),
            ],
        ),
        record(
            "jerusalen-2",
            &[
                ("CODIGO", "ALC-700"),
                ("DESCRIPCION", "ALCOHOL ANTISEPTICO"),
                ("UNI_MED", "ml"),
                ("A_PEDIR", "0"),
                ("EXISTENCIA", "1.500"),
                ("FAMILIA", "Tecnoquímicas"),
            ],
        ),
        // 沒有代碼與描述，會被略過
        record("jerusalen-3", &[("A_PEDIR", "7")]),
    ]
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ========== 1. 配置 ==========
    let config = PlanningConfig::from_json(CONFIG_JSON).context("配置無效")?;
    let catalog = DrugstoreCatalog::from_json(CATALOG_JSON).context("批發商目錄無效")?;
    tracing::info!(
        "分店 {} 間，批發商 {} 家",
        config.branches.len(),
        catalog.drugstores.len()
    );

    // ========== 2. 計算 ==========
    let calculator = ConsolidationCalculator::new(config.clone(), Classifier::new(catalog.resolver()));
    let result = calculator.calculate_records(&load_records())?;

    for warning in &result.warnings {
        tracing::warn!("[{:?}] {}: {}", warning.severity, warning.subject, warning.message);
    }

    for (drugstore_id, plan) in &result.plans {
        println!("== {} ==", catalog.name_of(drugstore_id));
        for m in plan.transfers() {
            println!(
                "  {} -> {}: {} {} ({})",
                config.branch_name(&m.from_branch),
                config.branch_name(&m.to_branch),
                format_with_source("", m.quantity),
                m.product.unit.human_label(),
                m.product.description
            );
        }
        println!("  por comprar: {}", format_with_source("", plan.total_to_order()));
    }

    // ========== 3. 匯出 ==========
    let packaging = PackagingTable::new().with_conversion(
        "7702605",
        PackagingConversion::new("7702605", "tableta", "caja", Decimal::from(100))?.with_round_up(true),
    );
    let builder = ReportBuilder::new(&config, &catalog).with_packaging(&packaging);
    let bundle = ExportBundle::build(&result, &builder, Local::now().date_naive());

    println!("\n{}", bundle.movements_file);
    println!("{}", serde_json::to_string_pretty(&bundle.movements)?);
    println!("\n{}", bundle.purchases_file);
    println!("{}", serde_json::to_string_pretty(&bundle.purchases)?);
    for export in &bundle.drugstores {
        println!("{} ({} productos)", export.file_name, export.summary.len());
    }

    Ok(())
}
