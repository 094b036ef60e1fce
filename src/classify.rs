// Header-name column classifier

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const TIME_KEYWORDS: &[&str] = &["月份", "日期", "时间", "季度", "年份", "month", "date", "time"];

pub const METRIC_KEYWORDS: &[&str] = &[
    "销售额", "收入", "利润", "数量", "库存", "价格", "销量", "业绩", "库存数量", "人数",
    "revenue", "sales", "amount", "price", "score",
];

pub const CATEGORY_KEYWORDS: &[&str] = &["类别", "部门", "产品名称", "地区", "供应商"];

pub const GENDER_KEYWORDS: &[&str] = &["性别", "男/女", "gender", "sex"];

pub const AGE_KEYWORDS: &[&str] = &["年龄", "岁数", "age"];

pub const DEPARTMENT_KEYWORDS: &[&str] = &["部门", "department"];

/// Extra fragments that mark a column for min/max/mean statistics on top of
/// the metric keywords. Matched as lower-cased substrings.
pub const STATISTIC_EXTRA_KEYWORDS: &[&str] = &["金额", "成绩", "分数", "薪资", "salary"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKind {
    Gender,
    Age,
    Department,
}

impl IdentityKind {
    pub const ALL: [IdentityKind; 3] = [IdentityKind::Gender, IdentityKind::Age, IdentityKind::Department];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    Time,
    Category,
    Metric,
    Identity(IdentityKind),
    Unclassified,
}

/// Roles in the order they are tried; the first matching set wins.
pub const ROLE_PRIORITY: [ColumnRole; 6] = [
    ColumnRole::Time,
    ColumnRole::Category,
    ColumnRole::Metric,
    ColumnRole::Identity(IdentityKind::Gender),
    ColumnRole::Identity(IdentityKind::Age),
    ColumnRole::Identity(IdentityKind::Department),
];

/// Keyword sets per role. Each set can be replaced independently from a
/// config file; omitted sets keep the built-in words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTable {
    pub time: Vec<String>,
    pub metric: Vec<String>,
    pub category: Vec<String>,
    pub gender: Vec<String>,
    pub age: Vec<String>,
    pub department: Vec<String>,
    pub statistic_extra: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self {
            time: owned(TIME_KEYWORDS),
            metric: owned(METRIC_KEYWORDS),
            category: owned(CATEGORY_KEYWORDS),
            gender: owned(GENDER_KEYWORDS),
            age: owned(AGE_KEYWORDS),
            department: owned(DEPARTMENT_KEYWORDS),
            statistic_extra: owned(STATISTIC_EXTRA_KEYWORDS),
        }
    }
}

impl KeywordTable {
    /// Keyword set for a role; `Unclassified` has none
    pub fn set(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Time => &self.time,
            ColumnRole::Category => &self.category,
            ColumnRole::Metric => &self.metric,
            ColumnRole::Identity(IdentityKind::Gender) => &self.gender,
            ColumnRole::Identity(IdentityKind::Age) => &self.age,
            ColumnRole::Identity(IdentityKind::Department) => &self.department,
            ColumnRole::Unclassified => &[],
        }
    }

    pub fn matches(&self, role: ColumnRole, header: &str) -> bool {
        self.set(role).iter().any(|k| k == header)
    }

    pub fn role_of(&self, header: &str) -> ColumnRole {
        ROLE_PRIORITY
            .iter()
            .copied()
            .find(|&role| self.matches(role, header))
            .unwrap_or(ColumnRole::Unclassified)
    }

    pub fn identity_of(&self, header: &str) -> Option<IdentityKind> {
        IdentityKind::ALL
            .iter()
            .copied()
            .find(|&kind| self.matches(ColumnRole::Identity(kind), header))
    }

    pub fn is_statistic(&self, header: &str) -> bool {
        let lower = header.to_lowercase();
        self.metric
            .iter()
            .chain(self.statistic_extra.iter())
            .any(|k| lower.contains(&k.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub index: usize,
    pub name: String,
    pub role: ColumnRole,
    /// Identity dimension, looked up independently of `role` so that a
    /// header like 部门 is both a category and the department dimension.
    pub identity: Option<IdentityKind>,
    pub statistic: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    pub columns: Vec<Column>,
}

impl Classification {
    pub fn first(&self, role: ColumnRole) -> Option<&Column> {
        self.columns.iter().find(|c| c.role == role)
    }

    pub fn first_identity(&self, kind: IdentityKind) -> Option<&Column> {
        self.columns.iter().find(|c| c.identity == Some(kind))
    }

    pub fn with_role(&self, role: ColumnRole) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| c.role == role)
    }

    pub fn statistic_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.statistic)
    }

    pub fn role_at(&self, index: usize) -> ColumnRole {
        self.columns
            .get(index)
            .map(|c| c.role)
            .unwrap_or(ColumnRole::Unclassified)
    }
}

/// Tag every header with a role. Only names are inspected, never values.
pub fn classify(headers: &[String], keywords: &KeywordTable) -> Classification {
    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(index, name)| Column {
            index,
            name: name.clone(),
            role: keywords.role_of(name),
            identity: keywords.identity_of(name),
            statistic: keywords.is_statistic(name),
        })
        .collect();

    debug!(
        roles = ?columns.iter().map(|c| (c.name.as_str(), c.role)).collect::<Vec<_>>(),
        "classified columns"
    );

    Classification { columns }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_builtin_sets() {
        let table = KeywordTable::default();
        assert_eq!(table.role_of("月份"), ColumnRole::Time);
        assert_eq!(table.role_of("date"), ColumnRole::Time);
        assert_eq!(table.role_of("销售额"), ColumnRole::Metric);
        assert_eq!(table.role_of("score"), ColumnRole::Metric);
        assert_eq!(table.role_of("地区"), ColumnRole::Category);
        assert_eq!(table.role_of("性别"), ColumnRole::Identity(IdentityKind::Gender));
        assert_eq!(table.role_of("age"), ColumnRole::Identity(IdentityKind::Age));
        assert_eq!(table.role_of("备注"), ColumnRole::Unclassified);
    }

    #[test]
    fn test_exact_match_only() {
        let table = KeywordTable::default();
        assert_eq!(table.role_of("月份 "), ColumnRole::Unclassified);
        assert_eq!(table.role_of("Sales"), ColumnRole::Unclassified);
        assert_eq!(table.role_of("总销售额"), ColumnRole::Unclassified);
    }

    #[test]
    fn test_category_wins_over_department_identity() {
        let table = KeywordTable::default();
        assert_eq!(table.role_of("部门"), ColumnRole::Category);
        assert_eq!(table.identity_of("部门"), Some(IdentityKind::Department));
        assert_eq!(table.role_of("department"), ColumnRole::Identity(IdentityKind::Department));
    }

    #[test]
    fn test_first_by_header_order() {
        let c = classify(&headers(&["利润", "日期", "销售额", "月份"]), &KeywordTable::default());
        assert_eq!(c.first(ColumnRole::Time).map(|col| col.index), Some(1));
        assert_eq!(c.first(ColumnRole::Metric).map(|col| col.name.as_str()), Some("利润"));
        assert_eq!(c.with_role(ColumnRole::Metric).count(), 2);
        assert!(c.first(ColumnRole::Category).is_none());
    }

    #[test]
    fn test_statistic_substring_match() {
        let table = KeywordTable::default();
        assert!(table.is_statistic("Monthly Salary"));
        assert!(table.is_statistic("合同金额"));
        assert!(table.is_statistic("销售额"));
        assert!(!table.is_statistic("姓名"));
    }

    #[test]
    fn test_identity_lookup_is_independent_of_role() {
        let c = classify(&headers(&["姓名", "部门", "性别"]), &KeywordTable::default());
        assert_eq!(c.first_identity(IdentityKind::Department).map(|col| col.index), Some(1));
        assert_eq!(c.first_identity(IdentityKind::Gender).map(|col| col.index), Some(2));
        assert_eq!(c.role_at(1), ColumnRole::Category);
        assert_eq!(c.role_at(9), ColumnRole::Unclassified);
    }

    #[test]
    fn test_partial_override_keeps_other_sets() {
        let table: KeywordTable = serde_json::from_str(r#"{"time": ["周"]}"#).unwrap();
        assert_eq!(table.role_of("周"), ColumnRole::Time);
        assert_eq!(table.role_of("月份"), ColumnRole::Unclassified);
        assert_eq!(table.role_of("销售额"), ColumnRole::Metric);
    }
}
