//! Filter, ordering and pagination arguments for record queries.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A column of the record table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordField {
    Id,
    Name,
    Age,
    Course,
}

impl RecordField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::Name => "name",
            RecordField::Age => "age",
            RecordField::Course => "course",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column that averages and sums apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericField {
    Id,
    Age,
}

impl From<NumericField> for RecordField {
    fn from(field: NumericField) -> Self {
        match field {
            NumericField::Id => RecordField::Id,
            NumericField::Age => RecordField::Age,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// One ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: RecordField,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn asc(field: RecordField) -> Self {
        Self {
            field,
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: RecordField) -> Self {
        Self {
            field,
            order: SortOrder::Desc,
        }
    }
}

/// Condition on an integer column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntFilter {
    Equals(i32),
    In(Vec<i32>),
    NotIn(Vec<i32>),
    Lt(i32),
    Lte(i32),
    Gt(i32),
    Gte(i32),
    Not(Box<IntFilter>),
}

impl IntFilter {
    pub fn not(filter: IntFilter) -> Self {
        IntFilter::Not(Box::new(filter))
    }
}

/// Case handling of string comparisons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    #[default]
    Default,
    /// Lowercase both sides before comparing.
    ///
    /// The operand is folded with Unicode rules, but SQLite's `LOWER` only folds
    /// ASCII letters, so on SQLite a stored `"JOÃO"` does not match `"joão"`.
    /// PostgreSQL folds both sides the same way.
    Insensitive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringCondition {
    Equals(String),
    In(Vec<String>),
    NotIn(Vec<String>),
    Lt(String),
    Lte(String),
    Gt(String),
    Gte(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Not(Box<StringCondition>),
}

/// Condition on a text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringFilter {
    pub condition: StringCondition,
    #[serde(default)]
    pub mode: QueryMode,
}

impl StringFilter {
    pub fn new(condition: StringCondition) -> Self {
        Self {
            condition,
            mode: QueryMode::Default,
        }
    }

    pub fn equals(value: impl Into<String>) -> Self {
        Self::new(StringCondition::Equals(value.into()))
    }

    pub fn contains(value: impl Into<String>) -> Self {
        Self::new(StringCondition::Contains(value.into()))
    }

    pub fn starts_with(value: impl Into<String>) -> Self {
        Self::new(StringCondition::StartsWith(value.into()))
    }

    pub fn ends_with(value: impl Into<String>) -> Self {
        Self::new(StringCondition::EndsWith(value.into()))
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(StringCondition::In(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Compare ignoring case.
    pub fn insensitive(mut self) -> Self {
        self.mode = QueryMode::Insensitive;
        self
    }
}

/// Boolean predicate over record columns.
///
/// `And(vec![])` matches every row and `Or(vec![])` matches none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordFilter {
    And(Vec<RecordFilter>),
    Or(Vec<RecordFilter>),
    Not(Box<RecordFilter>),
    Id(IntFilter),
    Name(StringFilter),
    Age(IntFilter),
    Course(StringFilter),
}

impl RecordFilter {
    pub fn and(filters: impl IntoIterator<Item = RecordFilter>) -> Self {
        RecordFilter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = RecordFilter>) -> Self {
        RecordFilter::Or(filters.into_iter().collect())
    }

    pub fn not(filter: RecordFilter) -> Self {
        RecordFilter::Not(Box::new(filter))
    }

    /// Columns the predicate reads.
    pub fn fields(&self) -> BTreeSet<RecordField> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut BTreeSet<RecordField>) {
        match self {
            RecordFilter::And(filters) | RecordFilter::Or(filters) => {
                for filter in filters {
                    filter.collect_fields(out);
                }
            }
            RecordFilter::Not(filter) => filter.collect_fields(out),
            RecordFilter::Id(_) => {
                out.insert(RecordField::Id);
            }
            RecordFilter::Name(_) => {
                out.insert(RecordField::Name);
            }
            RecordFilter::Age(_) => {
                out.insert(RecordField::Age);
            }
            RecordFilter::Course(_) => {
                out.insert(RecordField::Course);
            }
        }
    }
}

/// Arguments of `find_many` / `find_first`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindManyArgs {
    pub filter: Option<RecordFilter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    /// Id of the first candidate row
    pub cursor: Option<i32>,
    pub take: Option<u64>,
    pub skip: Option<u64>,
}

impl FindManyArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: RecordFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn cursor(mut self, id: i32) -> Self {
        self.cursor = Some(id);
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Ordering with `id` appended as the final tie-breaker.
    pub fn total_order(&self) -> Vec<OrderBy> {
        let mut order = self.order_by.clone();
        if !order.iter().any(|o| o.field == RecordField::Id) {
            order.push(OrderBy::asc(RecordField::Id));
        }
        order
    }
}
