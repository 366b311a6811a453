//! Translation of record query arguments into SeaORM selects and conditions.

use std::collections::BTreeSet;

use sea_orm::sea_query::{Alias, Asterisk, Expr, Func, LikeExpr, Order, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DbErr, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QueryResult,
    QuerySelect, Select,
};

use super::entities::teste::{Column, Entity, Model};
use crate::domain::{
    AggregateExpr, AggregateResult, AggregateSelection, CountField, FieldValue, FindManyArgs,
    GroupByArgs, GroupOrder, GroupRow, HavingFilter, IntFilter, NumberFilter, NumericField,
    OrderBy, QueryMode, RecordField, RecordFilter, SortOrder, StringCondition, StringFilter,
};

/// Upper bound used when `skip` is given without `take`.
const UNBOUNDED_LIMIT: u64 = i64::MAX as u64;

pub(crate) fn column(field: RecordField) -> Column {
    match field {
        RecordField::Id => Column::Id,
        RecordField::Name => Column::Name,
        RecordField::Age => Column::Age,
        RecordField::Course => Column::Course,
    }
}

fn sort(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

fn is_text(field: RecordField) -> bool {
    matches!(field, RecordField::Name | RecordField::Course)
}

/// Condition matching the rows selected by `filter`.
pub(crate) fn condition(filter: &RecordFilter) -> Condition {
    match filter {
        RecordFilter::And(filters) if filters.is_empty() => {
            Condition::all().add(Expr::val(1).eq(1))
        }
        RecordFilter::And(filters) => filters
            .iter()
            .fold(Condition::all(), |cond, f| cond.add(condition(f))),
        RecordFilter::Or(filters) if filters.is_empty() => {
            Condition::all().add(Expr::val(1).eq(0))
        }
        RecordFilter::Or(filters) => filters
            .iter()
            .fold(Condition::any(), |cond, f| cond.add(condition(f))),
        RecordFilter::Not(inner) => condition(inner).not(),
        RecordFilter::Id(f) => Condition::all().add(int_expr(Column::Id, f)),
        RecordFilter::Age(f) => Condition::all().add(int_expr(Column::Age, f)),
        RecordFilter::Name(f) => Condition::all().add(string_expr(Column::Name, f)),
        RecordFilter::Course(f) => Condition::all().add(string_expr(Column::Course, f)),
    }
}

fn int_expr(col: Column, filter: &IntFilter) -> SimpleExpr {
    match filter {
        IntFilter::Equals(v) => col.eq(*v),
        IntFilter::In(values) => col.is_in(values.iter().copied()),
        IntFilter::NotIn(values) => col.is_not_in(values.iter().copied()),
        IntFilter::Lt(v) => col.lt(*v),
        IntFilter::Lte(v) => col.lte(*v),
        IntFilter::Gt(v) => col.gt(*v),
        IntFilter::Gte(v) => col.gte(*v),
        IntFilter::Not(inner) => Expr::expr(int_expr(col, inner)).not(),
    }
}

fn string_expr(col: Column, filter: &StringFilter) -> SimpleExpr {
    string_condition(col, &filter.condition, filter.mode == QueryMode::Insensitive)
}

fn string_condition(col: Column, cond: &StringCondition, insensitive: bool) -> SimpleExpr {
    let lhs = if insensitive {
        Expr::expr(Func::lower(Expr::col(col)))
    } else {
        Expr::col(col)
    };
    let operand = |value: &str| {
        if insensitive {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    };

    match cond {
        StringCondition::Equals(v) => lhs.eq(operand(v)),
        StringCondition::In(values) => lhs.is_in(values.iter().map(|v| operand(v))),
        StringCondition::NotIn(values) => lhs.is_not_in(values.iter().map(|v| operand(v))),
        StringCondition::Lt(v) => lhs.lt(operand(v)),
        StringCondition::Lte(v) => lhs.lte(operand(v)),
        StringCondition::Gt(v) => lhs.gt(operand(v)),
        StringCondition::Gte(v) => lhs.gte(operand(v)),
        StringCondition::Contains(v) => lhs.like(like(format!("%{}%", escape_like(&operand(v))))),
        StringCondition::StartsWith(v) => lhs.like(like(format!("{}%", escape_like(&operand(v))))),
        StringCondition::EndsWith(v) => lhs.like(like(format!("%{}", escape_like(&operand(v))))),
        StringCondition::Not(inner) => Expr::expr(string_condition(col, inner, insensitive)).not(),
    }
}

fn like(pattern: String) -> LikeExpr {
    LikeExpr::new(pattern).escape('\\')
}

/// Escape LIKE wildcards so the operand matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Rows at or after `cursor` under `order`, which must end with the id key.
pub(crate) fn cursor_condition(order: &[OrderBy], cursor: &Model) -> Condition {
    let mut after = Condition::any();
    for (i, key) in order.iter().enumerate() {
        let mut branch = Condition::all();
        for prefix in &order[..i] {
            let col = column(prefix.field);
            branch = branch.add(Expr::col(col).eq(cursor.get(col)));
        }

        let col = column(key.field);
        let value = cursor.get(col);
        let last = i + 1 == order.len();
        let cmp = match (key.order, last) {
            (SortOrder::Asc, false) => Expr::col(col).gt(value),
            (SortOrder::Asc, true) => Expr::col(col).gte(value),
            (SortOrder::Desc, false) => Expr::col(col).lt(value),
            (SortOrder::Desc, true) => Expr::col(col).lte(value),
        };
        after = after.add(branch.add(cmp));
    }
    after
}

fn paginate<S: QuerySelect>(select: S, take: Option<u64>, skip: Option<u64>) -> S {
    match (take, skip) {
        (Some(take), skip) => select.limit(take).offset(skip),
        (None, Some(skip)) => select.limit(UNBOUNDED_LIMIT).offset(skip),
        (None, None) => select,
    }
}

/// Select for `find_many`, starting at the already resolved cursor row.
pub(crate) fn find_select(args: &FindManyArgs, cursor: Option<&Model>) -> Select<Entity> {
    let order = args.total_order();
    let mut select = Entity::find();

    if let Some(filter) = &args.filter {
        select = select.filter(condition(filter));
    }
    if let Some(cursor) = cursor {
        select = select.filter(cursor_condition(&order, cursor));
    }
    for key in &order {
        select = select.order_by(column(key.field), sort(key.order));
    }

    paginate(select, args.take, args.skip)
}

pub(crate) fn aggregate_expr(expr: AggregateExpr) -> SimpleExpr {
    match expr {
        AggregateExpr::CountAll => Func::count(Expr::col(Asterisk)).into(),
        AggregateExpr::Count(field) => Func::count(Expr::col(column(field))).into(),
        AggregateExpr::Avg(field) => avg_expr(field),
        AggregateExpr::Sum(field) => Func::sum(Expr::col(numeric(field))).into(),
        AggregateExpr::Min(field) => Func::min(Expr::col(numeric(field))).into(),
        AggregateExpr::Max(field) => Func::max(Expr::col(numeric(field))).into(),
    }
}

fn numeric(field: NumericField) -> Column {
    column(field.into())
}

// PostgreSQL averages integers as NUMERIC; cast so every backend yields a float.
fn avg_expr(field: NumericField) -> SimpleExpr {
    Func::cast_as(Func::avg(Expr::col(numeric(field))), Alias::new("float8")).into()
}

fn number_expr(lhs: SimpleExpr, filter: &NumberFilter) -> SimpleExpr {
    match filter {
        NumberFilter::Equals(v) => Expr::expr(lhs).eq(*v),
        NumberFilter::Lt(v) => Expr::expr(lhs).lt(*v),
        NumberFilter::Lte(v) => Expr::expr(lhs).lte(*v),
        NumberFilter::Gt(v) => Expr::expr(lhs).gt(*v),
        NumberFilter::Gte(v) => Expr::expr(lhs).gte(*v),
        NumberFilter::Not(inner) => Expr::expr(number_expr(lhs, inner)).not(),
    }
}

pub(crate) fn having_condition(filter: &HavingFilter) -> Condition {
    match filter {
        HavingFilter::And(filters) if filters.is_empty() => {
            Condition::all().add(Expr::val(1).eq(1))
        }
        HavingFilter::And(filters) => filters
            .iter()
            .fold(Condition::all(), |cond, f| cond.add(having_condition(f))),
        HavingFilter::Or(filters) if filters.is_empty() => {
            Condition::all().add(Expr::val(1).eq(0))
        }
        HavingFilter::Or(filters) => filters
            .iter()
            .fold(Condition::any(), |cond, f| cond.add(having_condition(f))),
        HavingFilter::Not(inner) => having_condition(inner).not(),
        HavingFilter::Field(filter) => condition(filter),
        HavingFilter::Aggregate(expr, filter) => {
            Condition::all().add(number_expr(aggregate_expr(*expr), filter))
        }
    }
}

fn count_alias(target: CountField) -> String {
    match target {
        CountField::All => "_count_all".to_string(),
        CountField::Field(field) => format!("_count_{}", field),
    }
}

fn alias(kind: &str, field: RecordField) -> String {
    format!("_{}_{}", kind, field)
}

/// Add the selected aggregates as aliased result columns.
pub(crate) fn select_aggregates<S: QuerySelect>(
    mut select: S,
    selection: &AggregateSelection,
) -> S {
    for target in selection.count.iter().copied().collect::<BTreeSet<_>>() {
        let expr = match target {
            CountField::All => aggregate_expr(AggregateExpr::CountAll),
            CountField::Field(field) => aggregate_expr(AggregateExpr::Count(field)),
        };
        select = select.column_as(expr, count_alias(target).as_str());
    }
    for field in selection.avg.iter().copied().collect::<BTreeSet<_>>() {
        select = select.column_as(avg_expr(field), alias("avg", field.into()).as_str());
    }
    for field in selection.sum.iter().copied().collect::<BTreeSet<_>>() {
        select = select.column_as(
            aggregate_expr(AggregateExpr::Sum(field)),
            alias("sum", field.into()).as_str(),
        );
    }
    for field in selection.min.iter().copied().collect::<BTreeSet<_>>() {
        select = select.column_as(
            SimpleExpr::from(Func::min(Expr::col(column(field)))),
            alias("min", field).as_str(),
        );
    }
    for field in selection.max.iter().copied().collect::<BTreeSet<_>>() {
        select = select.column_as(
            SimpleExpr::from(Func::max(Expr::col(column(field)))),
            alias("max", field).as_str(),
        );
    }
    select
}

fn read_field(
    row: &QueryResult,
    name: &str,
    field: RecordField,
) -> Result<Option<FieldValue>, DbErr> {
    if is_text(field) {
        Ok(row.try_get::<Option<String>>("", name)?.map(FieldValue::Text))
    } else {
        Ok(row.try_get::<Option<i32>>("", name)?.map(FieldValue::Int))
    }
}

/// Read the aggregate columns written by [`select_aggregates`].
pub(crate) fn read_aggregates(
    row: &QueryResult,
    selection: &AggregateSelection,
) -> Result<AggregateResult, DbErr> {
    let mut result = AggregateResult::default();

    for &target in &selection.count {
        let count = row.try_get::<i64>("", &count_alias(target))?;
        result.count.insert(target, count);
    }
    for &field in &selection.avg {
        let avg = row.try_get::<Option<f64>>("", &alias("avg", field.into()))?;
        result.avg.insert(field, avg);
    }
    for &field in &selection.sum {
        let sum = row.try_get::<Option<i64>>("", &alias("sum", field.into()))?;
        result.sum.insert(field, sum);
    }
    for &field in &selection.min {
        let min = read_field(row, &alias("min", field), field)?;
        result.min.insert(field, min);
    }
    for &field in &selection.max {
        let max = read_field(row, &alias("max", field), field)?;
        result.max.insert(field, max);
    }

    Ok(result)
}

/// Select for `group_by`. Grouped columns are aliased by their field names.
pub(crate) fn group_select(args: &GroupByArgs) -> Select<Entity> {
    let mut select = Entity::find().select_only();

    for &field in args.by() {
        select = select
            .column_as(column(field), field.as_str())
            .group_by(column(field));
    }
    select = select_aggregates(select, args.selection());

    if let Some(filter) = args.filter() {
        select = select.filter(condition(filter));
    }
    if let Some(having) = args.having() {
        select = select.having(having_condition(having));
    }
    for order in args.order_by() {
        select = match *order {
            GroupOrder::Field(field, dir) => select.order_by(column(field), sort(dir)),
            GroupOrder::Aggregate(expr, dir) => select.order_by(aggregate_expr(expr), sort(dir)),
        };
    }

    paginate(select, args.take(), args.skip())
}

pub(crate) fn read_group_row(row: &QueryResult, args: &GroupByArgs) -> Result<GroupRow, DbErr> {
    let mut group = GroupRow {
        aggregates: read_aggregates(row, args.selection())?,
        ..GroupRow::default()
    };

    for &field in args.by() {
        match field {
            RecordField::Id => group.id = row.try_get("", field.as_str())?,
            RecordField::Name => group.name = row.try_get("", field.as_str())?,
            RecordField::Age => group.age = row.try_get("", field.as_str())?,
            RecordField::Course => group.course = row.try_get("", field.as_str())?,
        }
    }

    Ok(group)
}
