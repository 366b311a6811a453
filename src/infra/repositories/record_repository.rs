//! Record repository over the `teste` table.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, QueryTrait, Set, TransactionTrait, UpdateMany,
};

use super::entities::teste::{ActiveModel, Column, Entity as TesteEntity};
use super::query;
use crate::domain::{
    AgeUpdate, AggregateArgs, AggregateResult, FindManyArgs, GroupByArgs, GroupRow, NewRecord,
    Record, RecordFilter, RecordPatch,
};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Record repository trait for dependency injection.
///
/// Reads never fail on an empty match. Only the `*_or_throw` lookups and the
/// single-row writes report a missing key as `NotFound`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Records matching the filter, ordered and paginated
    async fn find_many(&self, args: FindManyArgs) -> AppResult<Vec<Record>>;

    /// First record `find_many` would return
    async fn find_first(&self, args: FindManyArgs) -> AppResult<Option<Record>>;

    async fn find_first_or_throw(&self, args: FindManyArgs) -> AppResult<Record>;

    /// Find record by ID
    async fn find_unique(&self, id: i32) -> AppResult<Option<Record>>;

    async fn find_unique_or_throw(&self, id: i32) -> AppResult<Record>;

    /// Insert one record
    async fn create(&self, data: NewRecord) -> AppResult<Record>;

    /// Insert many records in one transaction, returning the inserted count.
    ///
    /// With `skip_duplicates`, rows whose id already exists are left out
    /// instead of failing the batch.
    async fn create_many(&self, data: Vec<NewRecord>, skip_duplicates: bool) -> AppResult<u64>;

    /// Like `create_many`, returning the inserted rows
    async fn create_many_and_return(
        &self,
        data: Vec<NewRecord>,
        skip_duplicates: bool,
    ) -> AppResult<Vec<Record>>;

    /// Apply a patch to one record
    async fn update(&self, id: i32, patch: RecordPatch) -> AppResult<Record>;

    /// Apply a patch to every matching record, returning the affected count
    async fn update_many(&self, filter: Option<RecordFilter>, patch: RecordPatch) -> AppResult<u64>;

    /// Update the record if `id` exists, otherwise insert `create`
    async fn upsert(&self, id: i32, create: NewRecord, update: RecordPatch) -> AppResult<Record>;

    /// Delete one record, returning it
    async fn delete(&self, id: i32) -> AppResult<Record>;

    /// Delete every matching record, returning the affected count
    async fn delete_many(&self, filter: Option<RecordFilter>) -> AppResult<u64>;

    async fn count(&self, filter: Option<RecordFilter>) -> AppResult<u64>;

    async fn aggregate(&self, args: AggregateArgs) -> AppResult<AggregateResult>;

    async fn group_by(&self, args: GroupByArgs) -> AppResult<Vec<GroupRow>>;
}

/// Concrete implementation of RecordRepository
pub struct RecordStore {
    db: DatabaseConnection,
}

impl RecordStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn active_model(data: NewRecord) -> ActiveModel {
    let mut model = ActiveModel {
        name: Set(data.name),
        age: Set(data.age),
        course: Set(data.course),
        ..Default::default()
    };
    if let Some(id) = data.id {
        model.id = Set(id);
    }
    model
}

/// Add the patch's column assignments to an update.
fn apply_patch(
    mut update: UpdateMany<TesteEntity>,
    patch: RecordPatch,
) -> AppResult<UpdateMany<TesteEntity>> {
    if let Some(name) = patch.name {
        update = update.col_expr(Column::Name, Expr::value(name));
    }
    if let Some(age) = patch.age {
        let current = Expr::col(Column::Age);
        let expr = match age {
            AgeUpdate::Set(n) => Expr::value(n),
            AgeUpdate::Increment(n) => current.add(n),
            AgeUpdate::Decrement(n) => current.sub(n),
            AgeUpdate::Multiply(n) => current.mul(n),
            AgeUpdate::Divide(0) => return Err(AppError::validation("Cannot divide age by zero")),
            AgeUpdate::Divide(n) => current.div(n),
        };
        update = update.col_expr(Column::Age, expr);
    }
    if let Some(course) = patch.course {
        update = update.col_expr(Column::Course, Expr::value(course));
    }
    Ok(update)
}

async fn update_one<C>(conn: &C, id: i32, patch: RecordPatch) -> AppResult<Record>
where
    C: ConnectionTrait,
{
    if !patch.is_empty() {
        let result = apply_patch(TesteEntity::update_many(), patch)?
            .filter(Column::Id.eq(id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
    }

    let model = TesteEntity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_not_found()?;
    Ok(Record::from(model))
}

fn filtered_condition(filter: Option<&RecordFilter>) -> sea_orm::Condition {
    match filter {
        Some(filter) => query::condition(filter),
        None => sea_orm::Condition::all(),
    }
}

#[async_trait]
impl RecordRepository for RecordStore {
    async fn find_many(&self, args: FindManyArgs) -> AppResult<Vec<Record>> {
        tracing::debug!(
            cursor = ?args.cursor,
            take = ?args.take,
            skip = ?args.skip,
            "Finding records"
        );

        let cursor = match args.cursor {
            Some(id) => match TesteEntity::find_by_id(id).one(&self.db).await? {
                Some(model) => Some(model),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let models = query::find_select(&args, cursor.as_ref())
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Record::from).collect())
    }

    async fn find_first(&self, args: FindManyArgs) -> AppResult<Option<Record>> {
        let records = self.find_many(args.take(1)).await?;
        Ok(records.into_iter().next())
    }

    async fn find_first_or_throw(&self, args: FindManyArgs) -> AppResult<Record> {
        self.find_first(args).await?.ok_or_not_found()
    }

    async fn find_unique(&self, id: i32) -> AppResult<Option<Record>> {
        tracing::debug!(id, "Finding record");

        let result = TesteEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Record::from))
    }

    async fn find_unique_or_throw(&self, id: i32) -> AppResult<Record> {
        self.find_unique(id).await?.ok_or_not_found()
    }

    async fn create(&self, data: NewRecord) -> AppResult<Record> {
        tracing::debug!(name = %data.name, explicit_id = ?data.id, "Creating record");

        let model = active_model(data)
            .insert(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(Record::from(model))
    }

    async fn create_many(&self, data: Vec<NewRecord>, skip_duplicates: bool) -> AppResult<u64> {
        tracing::debug!(rows = data.len(), skip_duplicates, "Creating records");

        if data.is_empty() {
            return Ok(0);
        }

        // Rows with and without explicit ids insert different column sets,
        // so each run of one kind becomes its own statement.
        let mut runs: Vec<Vec<ActiveModel>> = Vec::new();
        let mut last_explicit = None;
        for row in data {
            let explicit = row.id.is_some();
            if last_explicit != Some(explicit) {
                runs.push(Vec::new());
                last_explicit = Some(explicit);
            }
            if let Some(run) = runs.last_mut() {
                run.push(active_model(row));
            }
        }

        let txn = self.db.begin().await?;
        let mut inserted = 0;
        for run in runs {
            let mut insert = TesteEntity::insert_many(run);
            if skip_duplicates {
                insert = insert.on_conflict(OnConflict::column(Column::Id).do_nothing().to_owned());
            }
            inserted += insert.exec_without_returning(&txn).await?;
        }
        txn.commit().await?;

        Ok(inserted)
    }

    async fn create_many_and_return(
        &self,
        data: Vec<NewRecord>,
        skip_duplicates: bool,
    ) -> AppResult<Vec<Record>> {
        tracing::debug!(rows = data.len(), skip_duplicates, "Creating records");

        let txn = self.db.begin().await?;
        let mut records = Vec::with_capacity(data.len());
        for row in data {
            if let (true, Some(id)) = (skip_duplicates, row.id) {
                if TesteEntity::find_by_id(id).one(&txn).await?.is_some() {
                    continue;
                }
            }
            let model = active_model(row).insert(&txn).await?;
            records.push(Record::from(model));
        }
        txn.commit().await?;

        Ok(records)
    }

    async fn update(&self, id: i32, patch: RecordPatch) -> AppResult<Record> {
        tracing::debug!(id, "Updating record");

        let txn = self.db.begin().await?;
        let record = update_one(&txn, id, patch).await?;
        txn.commit().await?;

        Ok(record)
    }

    async fn update_many(
        &self,
        filter: Option<RecordFilter>,
        patch: RecordPatch,
    ) -> AppResult<u64> {
        tracing::debug!(filtered = filter.is_some(), "Updating records");

        if patch.is_empty() {
            return self.count(filter).await;
        }

        let result = apply_patch(TesteEntity::update_many(), patch)?
            .filter(filtered_condition(filter.as_ref()))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected)
    }

    async fn upsert(&self, id: i32, create: NewRecord, update: RecordPatch) -> AppResult<Record> {
        tracing::debug!(id, "Upserting record");

        let txn = self.db.begin().await?;
        let exists = TesteEntity::find_by_id(id).one(&txn).await?.is_some();
        let record = if exists {
            update_one(&txn, id, update).await?
        } else {
            Record::from(active_model(create).insert(&txn).await?)
        };
        txn.commit().await?;

        Ok(record)
    }

    async fn delete(&self, id: i32) -> AppResult<Record> {
        tracing::debug!(id, "Deleting record");

        let txn = self.db.begin().await?;
        let model = TesteEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_not_found()?;
        TesteEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(Record::from(model))
    }

    async fn delete_many(&self, filter: Option<RecordFilter>) -> AppResult<u64> {
        tracing::debug!(filtered = filter.is_some(), "Deleting records");

        let result = TesteEntity::delete_many()
            .filter(filtered_condition(filter.as_ref()))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected)
    }

    async fn count(&self, filter: Option<RecordFilter>) -> AppResult<u64> {
        TesteEntity::find()
            .filter(filtered_condition(filter.as_ref()))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn aggregate(&self, args: AggregateArgs) -> AppResult<AggregateResult> {
        tracing::debug!(selection = ?args.selection, "Aggregating records");

        if args.selection.is_empty() {
            return Ok(AggregateResult::default());
        }

        let select = query::select_aggregates(TesteEntity::find().select_only(), &args.selection)
            .filter(filtered_condition(args.filter.as_ref()));
        let row = self
            .db
            .query_one(select.build(self.db.get_database_backend()))
            .await?
            .ok_or_else(|| AppError::internal("Aggregate query returned no row"))?;

        Ok(query::read_aggregates(&row, &args.selection)?)
    }

    async fn group_by(&self, args: GroupByArgs) -> AppResult<Vec<GroupRow>> {
        tracing::debug!(by = ?args.by(), "Grouping records");

        args.validate()?;

        let statement = query::group_select(&args).build(self.db.get_database_backend());
        let rows = self.db.query_all(statement).await?;

        rows.iter()
            .map(|row| query::read_group_row(row, &args).map_err(AppError::from))
            .collect()
    }
}
