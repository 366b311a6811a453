//! Record repository integration tests.
//!
//! Each test runs against its own in-memory SQLite database with the
//! migrations applied.

use roster::domain::{
    sample_records, AgeUpdate, AggregateArgs, AggregateExpr, AggregateSelection, FieldValue,
    FindManyArgs, GroupByArgs, GroupOrder, HavingFilter, IntFilter, NumberFilter, NumericField,
    OrderBy, RecordField, RecordFilter, SortOrder, StringFilter,
};
use roster::errors::AppError;
use roster::infra::{Database, RecordRepository, RecordStore};
use roster::{NewRecord, Record, RecordPatch};

async fn empty_store() -> (Database, RecordStore) {
    let db = Database::connect_in_memory().await.unwrap();
    let store = RecordStore::new(db.get_connection());
    (db, store)
}

async fn seeded_store() -> (Database, RecordStore) {
    let (db, store) = empty_store().await;
    let inserted = store.create_many(sample_records(), false).await.unwrap();
    assert_eq!(inserted, 3);
    (db, store)
}

fn summary(records: &[Record]) -> Vec<(String, i32, String)> {
    let mut rows: Vec<_> = records
        .iter()
        .map(|r| (r.name.clone(), r.age, r.course.clone()))
        .collect();
    rows.sort();
    rows
}

fn names(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_seed_then_find_many_returns_the_three_rows() {
    let (_db, store) = seeded_store().await;

    let records = store.find_many(FindManyArgs::new()).await.unwrap();

    assert_eq!(
        summary(&records),
        vec![
            ("João".to_string(), 25, "Engenharia".to_string()),
            ("Maria".to_string(), 22, "Medicina".to_string()),
            ("Pedro".to_string(), 30, "Direito".to_string()),
        ]
    );

    let mut ids: Vec<i32> = records.iter().map(|r| r.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_find_many_on_empty_table_returns_empty() {
    let (_db, store) = empty_store().await;

    let records = store.find_many(FindManyArgs::new()).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_find_many_is_idempotent() {
    let (_db, store) = seeded_store().await;

    let first = store.find_many(FindManyArgs::new()).await.unwrap();
    let second = store.find_many(FindManyArgs::new()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_find_unique_missing_is_none_and_or_throw_is_not_found() {
    let (_db, store) = seeded_store().await;

    assert_eq!(store.find_unique(999).await.unwrap(), None);
    assert!(matches!(
        store.find_unique_or_throw(999).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_find_unique_returns_existing_record() {
    let (_db, store) = empty_store().await;
    let created = store
        .create(NewRecord::new("Ana", 19, "Letras"))
        .await
        .unwrap();

    let found = store.find_unique_or_throw(created.id).await.unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn test_count_matches_find_many_length() {
    let (_db, store) = seeded_store().await;

    let filters = vec![
        None,
        Some(RecordFilter::Age(IntFilter::Gte(25))),
        Some(RecordFilter::Course(StringFilter::equals("Medicina"))),
        Some(RecordFilter::or([])),
    ];

    for filter in filters {
        let args = FindManyArgs {
            filter: filter.clone(),
            ..FindManyArgs::default()
        };
        let found = store.find_many(args).await.unwrap();
        let count = store.count(filter).await.unwrap();
        assert_eq!(count, found.len() as u64);
    }
}

#[tokio::test]
async fn test_empty_and_matches_all_and_empty_or_matches_none() {
    let (_db, store) = seeded_store().await;

    let all = store
        .find_many(FindManyArgs::new().filter(RecordFilter::and([])))
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let none = store
        .find_many(FindManyArgs::new().filter(RecordFilter::or([])))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_filters_compose_with_and_or_not() {
    let (_db, store) = seeded_store().await;

    let filter = RecordFilter::or([
        RecordFilter::Course(StringFilter::equals("Direito")),
        RecordFilter::and([
            RecordFilter::Age(IntFilter::Lt(25)),
            RecordFilter::not(RecordFilter::Name(StringFilter::equals("João"))),
        ]),
    ]);

    let records = store
        .find_many(
            FindManyArgs::new()
                .filter(filter)
                .order_by(OrderBy::asc(RecordField::Name)),
        )
        .await
        .unwrap();

    assert_eq!(names(&records), vec!["Maria", "Pedro"]);
}

#[tokio::test]
async fn test_in_and_not_in_filters() {
    let (_db, store) = seeded_store().await;

    let records = store
        .find_many(
            FindManyArgs::new()
                .filter(RecordFilter::Age(IntFilter::In(vec![22, 30])))
                .order_by(OrderBy::asc(RecordField::Age)),
        )
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["Maria", "Pedro"]);

    let records = store
        .find_many(FindManyArgs::new().filter(RecordFilter::Course(StringFilter::new(
            roster::domain::StringCondition::NotIn(vec!["Medicina".into(), "Direito".into()]),
        ))))
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["João"]);

    let records = store
        .find_many(
            FindManyArgs::new()
                .filter(RecordFilter::Name(
                    StringFilter::one_of(["pedro", "MARIA"]).insensitive(),
                ))
                .order_by(OrderBy::asc(RecordField::Age)),
        )
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["Maria", "Pedro"]);

    let none = store
        .find_many(FindManyArgs::new().filter(RecordFilter::Id(IntFilter::In(vec![]))))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_insensitive_starts_with() {
    let (_db, store) = seeded_store().await;

    let records = store
        .find_many(FindManyArgs::new().filter(RecordFilter::Name(
            StringFilter::starts_with("MAR").insensitive(),
        )))
        .await
        .unwrap();

    assert_eq!(names(&records), vec!["Maria"]);
}

#[tokio::test]
async fn test_like_wildcards_in_operand_match_literally() {
    let (_db, store) = seeded_store().await;
    store
        .create(NewRecord::new("100%_certo", 40, "Matemática"))
        .await
        .unwrap();

    let records = store
        .find_many(FindManyArgs::new().filter(RecordFilter::Name(StringFilter::contains("%_"))))
        .await
        .unwrap();

    assert_eq!(names(&records), vec!["100%_certo"]);
}

#[tokio::test]
async fn test_order_take_and_skip() {
    let (_db, store) = seeded_store().await;

    let records = store
        .find_many(
            FindManyArgs::new()
                .order_by(OrderBy::desc(RecordField::Age))
                .skip(1)
                .take(1),
        )
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["João"]);

    let records = store
        .find_many(
            FindManyArgs::new()
                .order_by(OrderBy::asc(RecordField::Age))
                .skip(1),
        )
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["João", "Pedro"]);
}

#[tokio::test]
async fn test_cursor_starts_at_the_cursor_row() {
    let (_db, store) = seeded_store().await;
    let joao = store
        .find_first_or_throw(
            FindManyArgs::new().filter(RecordFilter::Name(StringFilter::equals("João"))),
        )
        .await
        .unwrap();

    let records = store
        .find_many(
            FindManyArgs::new()
                .order_by(OrderBy::asc(RecordField::Age))
                .cursor(joao.id),
        )
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["João", "Pedro"]);

    let records = store
        .find_many(
            FindManyArgs::new()
                .order_by(OrderBy::asc(RecordField::Age))
                .cursor(joao.id)
                .skip(1),
        )
        .await
        .unwrap();
    assert_eq!(names(&records), vec!["Pedro"]);
}

#[tokio::test]
async fn test_unknown_cursor_yields_empty_result() {
    let (_db, store) = seeded_store().await;

    let records = store
        .find_many(FindManyArgs::new().cursor(999))
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_find_first_follows_ordering() {
    let (_db, store) = seeded_store().await;

    let oldest = store
        .find_first(FindManyArgs::new().order_by(OrderBy::desc(RecordField::Age)))
        .await
        .unwrap();
    assert_eq!(oldest.map(|r| r.name), Some("Pedro".to_string()));

    let missing = store
        .find_first_or_throw(FindManyArgs::new().filter(RecordFilter::Age(IntFilter::Gt(99))))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound)));
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_create_assigns_distinct_ids() {
    let (_db, store) = empty_store().await;

    let first = store.create(NewRecord::new("Ana", 19, "Letras")).await.unwrap();
    let second = store.create(NewRecord::new("Bia", 21, "Letras")).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.name, "Ana");
}

#[tokio::test]
async fn test_create_with_duplicate_id_is_constraint_violation() {
    let (_db, store) = empty_store().await;
    store
        .create(NewRecord::new("Ana", 19, "Letras").with_id(7))
        .await
        .unwrap();

    let err = store
        .create(NewRecord::new("Bia", 21, "Letras").with_id(7))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConstraintViolation(_)), "{:?}", err);
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_create_many_skip_duplicates_omits_conflicting_rows() {
    let (_db, store) = empty_store().await;
    store
        .create(NewRecord::new("Ana", 19, "Letras").with_id(1))
        .await
        .unwrap();

    let inserted = store
        .create_many(
            vec![
                NewRecord::new("Ana", 19, "Letras").with_id(1),
                NewRecord::new("Bia", 21, "Letras").with_id(2),
                NewRecord::new("Caio", 23, "Física"),
            ],
            true,
        )
        .await
        .unwrap();

    assert_eq!(inserted, 2);
    assert_eq!(store.count(None).await.unwrap(), 3);
}

#[tokio::test]
async fn test_create_many_without_skip_rolls_back_the_batch() {
    let (_db, store) = seeded_store().await;
    let existing = store.find_many(FindManyArgs::new()).await.unwrap();

    let err = store
        .create_many(
            vec![
                NewRecord::new("Ana", 19, "Letras"),
                NewRecord::new("Dup", 50, "Letras").with_id(existing[0].id),
            ],
            false,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ConstraintViolation(_)), "{:?}", err);
    assert_eq!(store.count(None).await.unwrap(), 3);
}

#[tokio::test]
async fn test_create_many_with_no_rows_inserts_nothing() {
    let (_db, store) = empty_store().await;
    assert_eq!(store.create_many(Vec::new(), false).await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_many_and_return_returns_inserted_rows() {
    let (_db, store) = empty_store().await;
    store
        .create(NewRecord::new("Ana", 19, "Letras").with_id(1))
        .await
        .unwrap();

    let records = store
        .create_many_and_return(
            vec![
                NewRecord::new("Ana", 19, "Letras").with_id(1),
                NewRecord::new("Bia", 21, "Letras"),
            ],
            true,
        )
        .await
        .unwrap();

    assert_eq!(names(&records), vec!["Bia"]);
    assert_ne!(records[0].id, 1);
}

#[tokio::test]
async fn test_update_applies_patch_and_atomic_age_ops() {
    let (_db, store) = empty_store().await;
    let ana = store.create(NewRecord::new("Ana", 20, "Letras")).await.unwrap();

    let updated = store
        .update(
            ana.id,
            RecordPatch::new()
                .course("Linguística")
                .age(AgeUpdate::Increment(2)),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, ana.id);
    assert_eq!(updated.name, "Ana");
    assert_eq!(updated.age, 22);
    assert_eq!(updated.course, "Linguística");

    let updated = store
        .update(ana.id, RecordPatch::new().age(AgeUpdate::Multiply(3)))
        .await
        .unwrap();
    assert_eq!(updated.age, 66);

    let updated = store
        .update(ana.id, RecordPatch::new().age(AgeUpdate::Divide(4)))
        .await
        .unwrap();
    assert_eq!(updated.age, 16);
}

#[tokio::test]
async fn test_update_missing_key_is_not_found() {
    let (_db, store) = seeded_store().await;

    let result = store.update(999, RecordPatch::new().name("Ninguém")).await;
    assert!(matches!(result, Err(AppError::NotFound)));

    let result = store.update(999, RecordPatch::new()).await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_update_dividing_by_zero_is_validation_error() {
    let (_db, store) = seeded_store().await;
    let any = store.find_first_or_throw(FindManyArgs::new()).await.unwrap();

    let result = store
        .update(any.id, RecordPatch::new().age(AgeUpdate::Divide(0)))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_update_many_returns_affected_count() {
    let (_db, store) = seeded_store().await;

    let affected = store
        .update_many(
            Some(RecordFilter::Age(IntFilter::Gte(25))),
            RecordPatch::new().age(AgeUpdate::Decrement(5)),
        )
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let ages: Vec<i32> = store
        .find_many(FindManyArgs::new().order_by(OrderBy::asc(RecordField::Age)))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.age)
        .collect();
    assert_eq!(ages, vec![20, 22, 25]);
}

#[tokio::test]
async fn test_upsert_creates_then_updates() {
    let (_db, store) = empty_store().await;

    let created = store
        .upsert(
            42,
            NewRecord::new("Ana", 19, "Letras").with_id(42),
            RecordPatch::new().age(AgeUpdate::Increment(1)),
        )
        .await
        .unwrap();
    assert_eq!((created.id, created.age), (42, 19));

    let updated = store
        .upsert(
            42,
            NewRecord::new("Ana", 19, "Letras").with_id(42),
            RecordPatch::new().age(AgeUpdate::Increment(1)),
        )
        .await
        .unwrap();
    assert_eq!((updated.id, updated.age), (42, 20));
    assert_eq!(store.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_returns_row_then_not_found() {
    let (_db, store) = seeded_store().await;
    let pedro = store
        .find_first_or_throw(
            FindManyArgs::new().filter(RecordFilter::Name(StringFilter::equals("Pedro"))),
        )
        .await
        .unwrap();

    let deleted = store.delete(pedro.id).await.unwrap();
    assert_eq!(deleted, pedro);
    assert_eq!(store.find_unique(pedro.id).await.unwrap(), None);

    assert!(matches!(store.delete(pedro.id).await, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_delete_many_returns_affected_count() {
    let (_db, store) = seeded_store().await;

    let deleted = store
        .delete_many(Some(RecordFilter::Age(IntFilter::Lt(26))))
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let deleted = store.delete_many(None).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.count(None).await.unwrap(), 0);
}

// =============================================================================
// Aggregation and grouping
// =============================================================================

#[tokio::test]
async fn test_aggregate_returns_requested_values() {
    let (_db, store) = seeded_store().await;

    let result = store
        .aggregate(AggregateArgs::new(
            AggregateSelection::new()
                .count_all()
                .avg(NumericField::Age)
                .sum(NumericField::Age)
                .min(RecordField::Name)
                .max(RecordField::Age),
        ))
        .await
        .unwrap();

    assert_eq!(result.count_all(), Some(3));
    let avg = result.avg_of(NumericField::Age).unwrap();
    assert!((avg - 77.0 / 3.0).abs() < 1e-9);
    assert_eq!(result.sum_of(NumericField::Age), Some(77));
    assert_eq!(
        result.min_of(RecordField::Name),
        Some(&FieldValue::Text("João".into()))
    );
    assert_eq!(result.max_of(RecordField::Age), Some(&FieldValue::Int(30)));
    assert!(result.count_of(RecordField::Name).is_none());
}

#[tokio::test]
async fn test_aggregate_over_no_rows() {
    let (_db, store) = seeded_store().await;

    let result = store
        .aggregate(
            AggregateArgs::new(
                AggregateSelection::new()
                    .count_all()
                    .avg(NumericField::Age)
                    .max(RecordField::Course),
            )
            .filter(RecordFilter::Age(IntFilter::Gt(99))),
        )
        .await
        .unwrap();

    assert_eq!(result.count_all(), Some(0));
    assert_eq!(result.avg_of(NumericField::Age), None);
    assert_eq!(result.max_of(RecordField::Course), None);
}

async fn store_with_two_medicine_students() -> (Database, RecordStore) {
    let (db, store) = seeded_store().await;
    store
        .create(NewRecord::new("Ana", 20, "Medicina"))
        .await
        .unwrap();
    (db, store)
}

#[tokio::test]
async fn test_group_by_course_with_aggregates() {
    let (_db, store) = store_with_two_medicine_students().await;

    let args = GroupByArgs::builder([RecordField::Course])
        .aggregates(AggregateSelection::new().count_all().avg(NumericField::Age))
        .order_by(GroupOrder::Field(RecordField::Course, SortOrder::Asc))
        .build()
        .unwrap();
    let groups = store.group_by(args).await.unwrap();

    let courses: Vec<_> = groups.iter().map(|g| g.course.clone().unwrap()).collect();
    assert_eq!(courses, vec!["Direito", "Engenharia", "Medicina"]);

    let medicina = &groups[2];
    assert_eq!(medicina.aggregates.count_all(), Some(2));
    assert_eq!(medicina.aggregates.avg_of(NumericField::Age), Some(21.0));
    assert_eq!(medicina.name, None);
    assert_eq!(medicina.age, None);
}

#[tokio::test]
async fn test_group_by_having_aggregate_and_pagination() {
    let (_db, store) = store_with_two_medicine_students().await;

    let args = GroupByArgs::builder([RecordField::Course])
        .aggregates(AggregateSelection::new().count_all())
        .having(HavingFilter::Aggregate(
            AggregateExpr::CountAll,
            NumberFilter::Gt(1.0),
        ))
        .build()
        .unwrap();
    let groups = store.group_by(args).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].course.as_deref(), Some("Medicina"));

    let args = GroupByArgs::builder([RecordField::Course])
        .order_by(GroupOrder::Aggregate(AggregateExpr::CountAll, SortOrder::Desc))
        .take(1)
        .build()
        .unwrap();
    let groups = store.group_by(args).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[0].value(RecordField::Course),
        Some(FieldValue::Text("Medicina".into()))
    );
}

#[tokio::test]
async fn test_group_by_having_on_grouped_field() {
    let (_db, store) = store_with_two_medicine_students().await;

    let args = GroupByArgs::builder([RecordField::Course, RecordField::Age])
        .having(HavingFilter::Field(RecordFilter::Age(IntFilter::Gte(25))))
        .order_by(GroupOrder::Field(RecordField::Age, SortOrder::Asc))
        .build()
        .unwrap();
    let groups = store.group_by(args).await.unwrap();

    let rows: Vec<_> = groups
        .iter()
        .map(|g| (g.course.clone().unwrap(), g.age.unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![("Engenharia".to_string(), 25), ("Direito".to_string(), 30)]
    );
}

#[tokio::test]
async fn test_group_by_having_ungrouped_field_fails_validation() {
    let result = GroupByArgs::builder([RecordField::Course])
        .having(HavingFilter::Field(RecordFilter::Age(IntFilter::Gt(20))))
        .build();

    match result {
        Err(AppError::Validation(msg)) => assert!(msg.contains("age")),
        other => panic!("expected validation error, got {:?}", other),
    }
}

// =============================================================================
// Store errors
// =============================================================================

#[tokio::test]
async fn test_closed_database_reports_transient_connection_failure() {
    let (db, store) = seeded_store().await;
    db.close().await.unwrap();

    let err = store.find_many(FindManyArgs::new()).await.unwrap_err();

    assert!(matches!(err, AppError::ConnectionFailure(_)), "{err:?}");
    assert!(err.is_transient());

    let err = store.count(None).await.unwrap_err();
    assert!(matches!(err, AppError::ConnectionFailure(_)), "{err:?}");
}
