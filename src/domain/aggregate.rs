//! Aggregation and grouping arguments and results.
//!
//! `GroupByArgs` can only be obtained through [`GroupByBuilder::build`], which
//! rejects requests the store cannot answer consistently: an empty `by`, a
//! `having` or `order_by` that reads an ungrouped column, or pagination
//! without an ordering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::query::{NumericField, RecordField, RecordFilter, SortOrder};
use crate::errors::{AppError, AppResult};

/// Target of a count: every row, or the non-null values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CountField {
    All,
    Field(RecordField),
}

/// Which aggregates to compute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSelection {
    #[serde(default)]
    pub count: Vec<CountField>,
    #[serde(default)]
    pub avg: Vec<NumericField>,
    #[serde(default)]
    pub sum: Vec<NumericField>,
    #[serde(default)]
    pub min: Vec<RecordField>,
    #[serde(default)]
    pub max: Vec<RecordField>,
}

impl AggregateSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_all(mut self) -> Self {
        self.count.push(CountField::All);
        self
    }

    pub fn count(mut self, field: RecordField) -> Self {
        self.count.push(CountField::Field(field));
        self
    }

    pub fn avg(mut self, field: NumericField) -> Self {
        self.avg.push(field);
        self
    }

    pub fn sum(mut self, field: NumericField) -> Self {
        self.sum.push(field);
        self
    }

    pub fn min(mut self, field: RecordField) -> Self {
        self.min.push(field);
        self
    }

    pub fn max(mut self, field: RecordField) -> Self {
        self.max.push(field);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count.is_empty()
            && self.avg.is_empty()
            && self.sum.is_empty()
            && self.min.is_empty()
            && self.max.is_empty()
    }
}

/// Arguments of `aggregate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateArgs {
    pub filter: Option<RecordFilter>,
    pub selection: AggregateSelection,
}

impl AggregateArgs {
    pub fn new(selection: AggregateSelection) -> Self {
        Self {
            filter: None,
            selection,
        }
    }

    pub fn filter(mut self, filter: RecordFilter) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// Value of a record column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i32),
    Text(String),
}

/// Requested aggregates. Absent keys were not requested; `None` values mean no row matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    pub count: BTreeMap<CountField, i64>,
    pub avg: BTreeMap<NumericField, Option<f64>>,
    pub sum: BTreeMap<NumericField, Option<i64>>,
    pub min: BTreeMap<RecordField, Option<FieldValue>>,
    pub max: BTreeMap<RecordField, Option<FieldValue>>,
}

impl AggregateResult {
    pub fn count_all(&self) -> Option<i64> {
        self.count.get(&CountField::All).copied()
    }

    pub fn count_of(&self, field: RecordField) -> Option<i64> {
        self.count.get(&CountField::Field(field)).copied()
    }

    pub fn avg_of(&self, field: NumericField) -> Option<f64> {
        self.avg.get(&field).copied().flatten()
    }

    pub fn sum_of(&self, field: NumericField) -> Option<i64> {
        self.sum.get(&field).copied().flatten()
    }

    pub fn min_of(&self, field: RecordField) -> Option<&FieldValue> {
        self.min.get(&field).and_then(Option::as_ref)
    }

    pub fn max_of(&self, field: RecordField) -> Option<&FieldValue> {
        self.max.get(&field).and_then(Option::as_ref)
    }
}

/// Aggregate expression usable in `having` and group ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateExpr {
    CountAll,
    Count(RecordField),
    Avg(NumericField),
    Sum(NumericField),
    Min(NumericField),
    Max(NumericField),
}

/// Comparison against an aggregate value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberFilter {
    Equals(f64),
    Lt(f64),
    Lte(f64),
    Gt(f64),
    Gte(f64),
    Not(Box<NumberFilter>),
}

/// Predicate over groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HavingFilter {
    And(Vec<HavingFilter>),
    Or(Vec<HavingFilter>),
    Not(Box<HavingFilter>),
    /// Condition on grouped columns; every column read must be in `by`
    Field(RecordFilter),
    Aggregate(AggregateExpr, NumberFilter),
}

impl HavingFilter {
    pub fn not(filter: HavingFilter) -> Self {
        HavingFilter::Not(Box::new(filter))
    }

    /// Columns read outside aggregate expressions.
    fn scalar_fields(&self) -> Vec<RecordField> {
        match self {
            HavingFilter::And(filters) | HavingFilter::Or(filters) => {
                filters.iter().flat_map(|f| f.scalar_fields()).collect()
            }
            HavingFilter::Not(filter) => filter.scalar_fields(),
            HavingFilter::Field(filter) => filter.fields().into_iter().collect(),
            HavingFilter::Aggregate(..) => Vec::new(),
        }
    }
}

/// Ordering of grouped rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOrder {
    Field(RecordField, SortOrder),
    Aggregate(AggregateExpr, SortOrder),
}

/// Validated arguments of `group_by`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupByArgs {
    by: Vec<RecordField>,
    filter: Option<RecordFilter>,
    having: Option<HavingFilter>,
    order_by: Vec<GroupOrder>,
    selection: AggregateSelection,
    take: Option<u64>,
    skip: Option<u64>,
}

impl GroupByArgs {
    pub fn builder(by: impl IntoIterator<Item = RecordField>) -> GroupByBuilder {
        GroupByBuilder {
            args: GroupByArgs {
                by: by.into_iter().collect(),
                filter: None,
                having: None,
                order_by: Vec::new(),
                selection: AggregateSelection::default(),
                take: None,
                skip: None,
            },
        }
    }

    pub fn by(&self) -> &[RecordField] {
        &self.by
    }

    pub fn filter(&self) -> Option<&RecordFilter> {
        self.filter.as_ref()
    }

    pub fn having(&self) -> Option<&HavingFilter> {
        self.having.as_ref()
    }

    pub fn order_by(&self) -> &[GroupOrder] {
        &self.order_by
    }

    pub fn selection(&self) -> &AggregateSelection {
        &self.selection
    }

    pub fn take(&self) -> Option<u64> {
        self.take
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn groups_by(&self, field: RecordField) -> bool {
        self.by.contains(&field)
    }

    /// Check the request is answerable.
    pub fn validate(&self) -> AppResult<()> {
        if self.by.is_empty() {
            return Err(AppError::validation(r#""by" must not be empty"#));
        }

        if let Some(having) = &self.having {
            if let Some(field) = having
                .scalar_fields()
                .into_iter()
                .find(|f| !self.groups_by(*f))
            {
                return Err(AppError::validation(format!(
                    r#"Field "{}" used in "having" needs to be provided in "by""#,
                    field
                )));
            }
        }

        for order in &self.order_by {
            if let GroupOrder::Field(field, _) = order {
                if !self.groups_by(*field) {
                    return Err(AppError::validation(format!(
                        r#"Field "{}" in "orderBy" needs to be provided in "by""#,
                        field
                    )));
                }
            }
        }

        if self.order_by.is_empty() {
            if self.take.is_some() {
                return Err(AppError::validation(
                    r#"If you provide "take", you also need to provide "orderBy""#,
                ));
            }
            if self.skip.is_some() {
                return Err(AppError::validation(
                    r#"If you provide "skip", you also need to provide "orderBy""#,
                ));
            }
        }

        Ok(())
    }
}

/// Builder for [`GroupByArgs`].
#[derive(Debug, Clone)]
pub struct GroupByBuilder {
    args: GroupByArgs,
}

impl GroupByBuilder {
    pub fn filter(mut self, filter: RecordFilter) -> Self {
        self.args.filter = Some(filter);
        self
    }

    pub fn having(mut self, having: HavingFilter) -> Self {
        self.args.having = Some(having);
        self
    }

    pub fn order_by(mut self, order: GroupOrder) -> Self {
        self.args.order_by.push(order);
        self
    }

    pub fn aggregates(mut self, selection: AggregateSelection) -> Self {
        self.args.selection = selection;
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.args.take = Some(take);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.args.skip = Some(skip);
        self
    }

    pub fn build(self) -> AppResult<GroupByArgs> {
        self.args.validate()?;
        Ok(self.args)
    }
}

/// One group: the grouped column values plus its aggregates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupRow {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub age: Option<i32>,
    pub course: Option<String>,
    pub aggregates: AggregateResult,
}

impl GroupRow {
    /// Value of a grouped column.
    pub fn value(&self, field: RecordField) -> Option<FieldValue> {
        match field {
            RecordField::Id => self.id.map(FieldValue::Int),
            RecordField::Name => self.name.clone().map(FieldValue::Text),
            RecordField::Age => self.age.map(FieldValue::Int),
            RecordField::Course => self.course.clone().map(FieldValue::Text),
        }
    }
}
