//! 產品分類：藥廠/系列 → 藥品批發商（droguería）

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::DrugstoreId;

/// 未分類產品的批發商ID
pub const UNASSIGNED_DRUGSTORE_ID: &str = "sin-drogueria";

/// 未分類產品的批發商名稱
pub const UNASSIGNED_DRUGSTORE_NAME: &str = "Sin Droguería";

/// 去除西班牙文重音符號（輸入需已轉大寫）
fn strip_diacritics(c: char) -> char {
    match c {
        'Á' | 'À' | 'Ä' | 'Â' | 'Ã' => 'A',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'Ó' | 'Ò' | 'Ö' | 'Ô' | 'Õ' => 'O',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        'Ñ' => 'N',
        'Ç' => 'C',
        other => other,
    }
}

/// 系列名稱正規化：大寫、去重音、合併空白
pub fn normalize_family(family: &str) -> String {
    family
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
        .chars()
        .map(strip_diacritics)
        .collect()
}

/// 產生 URL 友善的ID（小寫、去重音、非英數字元轉為 `-`）
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in normalize_family(name).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}

/// 系列 → 批發商對應
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMapping {
    pub family: String,
    pub drugstore_id: DrugstoreId,
}

impl FamilyMapping {
    pub fn new(family: impl Into<String>, drugstore_id: impl Into<DrugstoreId>) -> Self {
        Self {
            family: family.into(),
            drugstore_id: drugstore_id.into(),
        }
    }
}

/// 批發商解析器
///
/// 分類來源（資料庫、檔案、記憶體）由呼叫端注入。
pub trait DrugstoreResolver: Send + Sync {
    /// 依系列名稱解析批發商ID，找不到時返回後備ID
    fn resolve(&self, family: &str) -> DrugstoreId;
}

/// 以對應表解析批發商
#[derive(Debug, Clone)]
pub struct FamilyMapResolver {
    /// (正規化系列名稱, 批發商ID)
    entries: Vec<(String, DrugstoreId)>,

    /// 後備批發商ID
    fallback_id: DrugstoreId,
}

impl FamilyMapResolver {
    /// 創建新的解析器
    pub fn new(mappings: &[FamilyMapping]) -> Self {
        Self {
            entries: mappings
                .iter()
                .map(|m| (normalize_family(&m.family), m.drugstore_id.clone()))
                .collect(),
            fallback_id: UNASSIGNED_DRUGSTORE_ID.to_string(),
        }
    }

    /// 建構器模式：設置後備批發商ID
    pub fn with_fallback_id(mut self, fallback_id: impl Into<DrugstoreId>) -> Self {
        self.fallback_id = fallback_id.into();
        self
    }
}

impl DrugstoreResolver for FamilyMapResolver {
    /// 1. 完全相符
    /// 2. 部分相符：任一方包含另一方，取較短長度最長者（同分取先出現者）
    /// 3. 後備ID
    fn resolve(&self, family: &str) -> DrugstoreId {
        let fam = normalize_family(family);

        if let Some((_, id)) = self.entries.iter().find(|(mf, _)| *mf == fam) {
            return id.clone();
        }

        let mut best: Option<(usize, &DrugstoreId)> = None;
        for (mf, id) in &self.entries {
            if !(fam.contains(mf.as_str()) || mf.contains(fam.as_str())) {
                continue;
            }
            let score = mf.chars().count().min(fam.chars().count());
            if score > 0 && best.map_or(true, |(s, _)| score > s) {
                best = Some((score, id));
            }
        }

        best.map(|(_, id)| id.clone())
            .unwrap_or_else(|| self.fallback_id.clone())
    }
}

/// 單一產品的人工分類覆寫
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOverride {
    /// 指定批發商
    pub drugstore_id: Option<DrugstoreId>,

    /// 指定藥廠/系列
    pub family: Option<String>,
}

impl ProductOverride {
    /// 建構器模式：設置批發商
    pub fn with_drugstore_id(mut self, drugstore_id: impl Into<DrugstoreId>) -> Self {
        self.drugstore_id = Some(drugstore_id.into());
        self
    }

    /// 建構器模式：設置系列
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }
}

/// 分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub family: String,
    pub drugstore_id: DrugstoreId,
}

/// 產品分類器（解析器 + 人工覆寫）
pub struct Classifier {
    resolver: Box<dyn DrugstoreResolver>,

    /// 識別鍵（代碼或描述）→ 覆寫
    overrides: HashMap<String, ProductOverride>,
}

impl Classifier {
    /// 創建新的分類器
    pub fn new(resolver: impl DrugstoreResolver + 'static) -> Self {
        Self {
            resolver: Box::new(resolver),
            overrides: HashMap::new(),
        }
    }

    /// 建構器模式：加入覆寫
    pub fn with_override(mut self, identity: impl Into<String>, product_override: ProductOverride) -> Self {
        self.overrides.insert(identity.into(), product_override);
        self
    }

    /// 建構器模式：批次設置覆寫
    pub fn with_overrides(mut self, overrides: HashMap<String, ProductOverride>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// 分類產品：覆寫的系列先套用，再解析批發商，最後套用覆寫的批發商
    pub fn classify(&self, identity: &str, family: &str) -> Classification {
        let product_override = self.overrides.get(identity);

        let family = product_override
            .and_then(|o| o.family.clone())
            .unwrap_or_else(|| family.to_string());

        let drugstore_id = match product_override.and_then(|o| o.drugstore_id.clone()) {
            Some(id) => id,
            None => self.resolver.resolve(&family),
        };

        Classification {
            family,
            drugstore_id,
        }
    }
}

/// 批發商
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drugstore {
    pub id: DrugstoreId,
    pub name: String,
}

/// 藥廠 → 批發商種子資料（`[{ "LABORATORIO": ..., "DROGUERIA": ... }]`）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabMapping {
    #[serde(rename = "LABORATORIO", default)]
    pub laboratory: String,

    #[serde(rename = "DROGUERIA", default)]
    pub drugstore: String,
}

/// 批發商目錄
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrugstoreCatalog {
    /// 批發商清單（第一個永遠是未分類批發商）
    pub drugstores: Vec<Drugstore>,

    /// 系列對應
    pub families: Vec<FamilyMapping>,
}

impl DrugstoreCatalog {
    /// 由種子資料建立目錄
    pub fn from_lab_mappings(mappings: &[LabMapping]) -> Self {
        let mut drugstores = vec![Drugstore {
            id: UNASSIGNED_DRUGSTORE_ID.to_string(),
            name: UNASSIGNED_DRUGSTORE_NAME.to_string(),
        }];
        let mut families = Vec::new();

        for mapping in mappings {
            let family = mapping.laboratory.trim();
            let name = mapping.drugstore.trim();
            if family.is_empty() || name.is_empty() {
                continue;
            }

            let id = Some(slug(name))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNASSIGNED_DRUGSTORE_ID.to_string());

            if !drugstores.iter().any(|d| d.id == id) {
                drugstores.push(Drugstore {
                    id: id.clone(),
                    name: name.to_string(),
                });
            }
            families.push(FamilyMapping::new(family, id));
        }

        Self {
            drugstores,
            families,
        }
    }

    /// 由 JSON 種子資料建立目錄
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let mappings: Vec<LabMapping> = serde_json::from_str(json)?;
        Ok(Self::from_lab_mappings(&mappings))
    }

    /// 建立對應表解析器
    pub fn resolver(&self) -> FamilyMapResolver {
        FamilyMapResolver::new(&self.families)
    }

    /// 批發商顯示名稱（找不到時返回ID）
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.drugstores
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.name.as_str())
            .unwrap_or(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> FamilyMapResolver {
        FamilyMapResolver::new(&[
            FamilyMapping::new("Genfar", "dist-norte"),
            FamilyMapping::new("LABORATORIOS MK", "dist-sur"),
            FamilyMapping::new("MK", "dist-centro"),
            FamilyMapping::new("Tecnoquímicas", "dist-sur"),
        ])
    }

    #[test]
    fn test_normalize_family() {
        assert_eq!(normalize_family("  tecnoquímicas   s.a. "), "TECNOQUIMICAS S.A.");
        assert_eq!(normalize_family("Compañía"), "COMPANIA");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Droguería Del Norte"), "drogueria-del-norte");
        assert_eq!(slug("  --Coopidrogas S.A.-- "), "coopidrogas-s-a");
        assert_eq!(slug("***"), "");
    }

    #[test]
    fn test_resolve_exact_match() {
        assert_eq!(resolver().resolve("genfar"), "dist-norte");
        assert_eq!(resolver().resolve("TECNOQUIMICAS"), "dist-sur");
    }

    #[test]
    fn test_resolve_longest_containment() {
        // "LABORATORIOS MK LTDA" contiene "LABORATORIOS MK"（15）y "MK"（2）
        assert_eq!(resolver().resolve("Laboratorios MK Ltda"), "dist-sur");
        // "GENFAR" está contenido en la familia consultada
        assert_eq!(resolver().resolve("GENFAR GENERICOS"), "dist-norte");
    }

    #[test]
    fn test_resolve_fallback() {
        assert_eq!(resolver().resolve("BAYER"), UNASSIGNED_DRUGSTORE_ID);
        assert_eq!(resolver().resolve(""), UNASSIGNED_DRUGSTORE_ID);
        assert_eq!(
            resolver().with_fallback_id("otros").resolve("BAYER"),
            "otros"
        );
    }

    #[test]
    fn test_classifier_override_precedence() {
        let classifier = Classifier::new(resolver())
            .with_override("A-1", ProductOverride::default().with_family("Genfar"))
            .with_override("A-2", ProductOverride::default().with_drugstore_id("dist-x"))
            .with_override(
                "A-3",
                ProductOverride::default()
                    .with_family("MK")
                    .with_drugstore_id("dist-y"),
            );

        let a1 = classifier.classify("A-1", "BAYER");
        assert_eq!(a1.family, "Genfar");
        assert_eq!(a1.drugstore_id, "dist-norte");

        let a2 = classifier.classify("A-2", "Genfar");
        assert_eq!(a2.family, "Genfar");
        assert_eq!(a2.drugstore_id, "dist-x");

        let a3 = classifier.classify("A-3", "Genfar");
        assert_eq!(a3.family, "MK");
        assert_eq!(a3.drugstore_id, "dist-y");

        let plain = classifier.classify("A-9", "Genfar");
        assert_eq!(plain.drugstore_id, "dist-norte");
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"[
            {"LABORATORIO": "Genfar", "DROGUERIA": "Droguería Norte"},
            {"LABORATORIO": "MK", "DROGUERIA": "Droguería Norte"},
            {"LABORATORIO": "Bayer", "DROGUERIA": "Copidrogas"},
            {"LABORATORIO": "", "DROGUERIA": "Vacía"},
            {"LABORATORIO": "Sanofi"}
        ]"#;

        let catalog = DrugstoreCatalog::from_json(json).unwrap();
        let ids: Vec<_> = catalog.drugstores.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![UNASSIGNED_DRUGSTORE_ID, "drogueria-norte", "copidrogas"]);
        assert_eq!(catalog.families.len(), 3);
        assert_eq!(catalog.name_of("drogueria-norte"), "Droguería Norte");
        assert_eq!(catalog.name_of("desconocida"), "desconocida");
        assert_eq!(catalog.resolver().resolve("mk"), "drogueria-norte");
    }

    #[test]
    fn test_catalog_from_invalid_json() {
        assert!(DrugstoreCatalog::from_json("{not json").is_err());
    }
}
