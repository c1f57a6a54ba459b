//! 手術目錄

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::procedure::{ProcedureRecord, ProcedureType};
use crate::{AllocError, Result};

/// 手術目錄
///
/// 建構後不可變。順序為插入順序，只影響顯示與求解器的變數排列，
/// 不影響最佳解的目標值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ProcedureType>", into = "Vec<ProcedureType>")]
pub struct Catalog {
    procedures: Vec<ProcedureType>,
}

impl Catalog {
    /// 由已型別化的手術類型建立目錄
    pub fn new(procedures: Vec<ProcedureType>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(procedures.len());
        for (row, procedure) in procedures.iter().enumerate() {
            procedure.validate(row)?;
            if !seen.insert(procedure.id.as_str()) {
                return Err(AllocError::Validation {
                    row,
                    field: "id",
                    value: procedure.id.clone(),
                    reason: "手術類型ID重複".to_string(),
                });
            }
        }

        Ok(Self { procedures })
    }

    /// 由匯入記錄建立目錄
    pub fn load<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = ProcedureRecord>,
    {
        let procedures = rows
            .into_iter()
            .enumerate()
            .map(|(row, record)| record.into_procedure(row))
            .collect::<Result<Vec<_>>>()?;

        Self::new(procedures)
    }

    /// 依 ID 查找手術類型
    pub fn get(&self, id: &str) -> Result<&ProcedureType> {
        self.procedures
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AllocError::NotFound(id.to_string()))
    }

    /// 手術類型在目錄中的位置
    pub fn position(&self, id: &str) -> Option<usize> {
        self.procedures.iter().position(|p| p.id == id)
    }

    /// 依插入順序遍歷所有手術類型（可重複呼叫）
    pub fn all(&self) -> impl Iterator<Item = &ProcedureType> + Clone + '_ {
        self.procedures.iter()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcedureType> {
        self.procedures.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.procedures.iter().map(|p| p.id.as_str())
    }

    pub fn as_slice(&self) -> &[ProcedureType] {
        &self.procedures
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// 轉回匯入記錄（輸出 CSV/JSON 用）
    pub fn to_records(&self) -> Vec<ProcedureRecord> {
        self.procedures.iter().map(ProcedureRecord::from).collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ProcedureType;
    type IntoIter = std::slice::Iter<'a, ProcedureType>;

    fn into_iter(self) -> Self::IntoIter {
        self.procedures.iter()
    }
}

impl TryFrom<Vec<ProcedureType>> for Catalog {
    type Error = AllocError;

    fn try_from(procedures: Vec<ProcedureType>) -> Result<Self> {
        Self::new(procedures)
    }
}

impl From<Catalog> for Vec<ProcedureType> {
    fn from(catalog: Catalog) -> Self {
        catalog.procedures
    }
}
