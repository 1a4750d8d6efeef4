//! 規劃配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::{BranchId, PharmacyError};

/// 分店
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// 分店ID
    pub id: BranchId,

    /// 顯示名稱
    pub name: String,
}

impl Branch {
    /// 創建新的分店
    pub fn new(id: impl Into<BranchId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// 調撥規劃配置
///
/// 每次規劃都以此配置為輸入，規劃器本身不保存任何狀態。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// 參與規劃的分店（順序即為同值排序時的順序）
    pub branches: Vec<Branch>,

    /// 各分店保留庫存（不可調出的最低庫存）
    #[serde(default)]
    pub reserve_buffer_by_branch: BTreeMap<BranchId, Decimal>,

    /// 匯出採購建議時隱藏新採購量為 0 的資料列
    #[serde(default)]
    pub hide_zero_suggestions: bool,
}

impl PlanningConfig {
    /// 創建空的配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 JSON 建立配置並驗證
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：加入分店
    pub fn with_branch(mut self, id: impl Into<BranchId>, name: impl Into<String>) -> Self {
        self.branches.push(Branch::new(id, name));
        self
    }

    /// 建構器模式：設置分店保留庫存
    pub fn with_reserve_buffer(mut self, branch_id: impl Into<BranchId>, buffer: Decimal) -> Self {
        self.reserve_buffer_by_branch.insert(branch_id.into(), buffer);
        self
    }

    /// 建構器模式：設置是否隱藏零採購建議
    pub fn with_hide_zero_suggestions(mut self, hide: bool) -> Self {
        self.hide_zero_suggestions = hide;
        self
    }

    /// 分店保留庫存（未設置時為 0）
    pub fn reserve_buffer(&self, branch_id: &str) -> Decimal {
        self.reserve_buffer_by_branch
            .get(branch_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// 所有分店ID（依配置順序）
    pub fn branch_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.branches.iter().map(|b| b.id.as_str())
    }

    /// 分店顯示名稱（找不到時返回ID）
    pub fn branch_name<'a>(&'a self, branch_id: &'a str) -> &'a str {
        self.branches
            .iter()
            .find(|b| b.id == branch_id)
            .map(|b| b.name.as_str())
            .unwrap_or(branch_id)
    }

    /// 保留庫存中未配置的分店
    pub fn unknown_buffer_branches(&self) -> Vec<&str> {
        self.reserve_buffer_by_branch
            .keys()
            .map(String::as_str)
            .filter(|id| !self.branches.iter().any(|b| b.id == *id))
            .collect()
    }

    /// 驗證配置
    pub fn validate(&self) -> crate::Result<()> {
        let mut seen = HashSet::new();
        for branch in &self.branches {
            if branch.id.trim().is_empty() {
                return Err(PharmacyError::EmptyBranchId);
            }
            if !seen.insert(branch.id.as_str()) {
                return Err(PharmacyError::DuplicateBranch(branch.id.clone()));
            }
        }

        for (branch, buffer) in &self.reserve_buffer_by_branch {
            if *buffer < Decimal::ZERO {
                return Err(PharmacyError::NegativeReserveBuffer {
                    branch: branch.clone(),
                    buffer: *buffer,
                });
            }
        }

        Ok(())
    }
}
