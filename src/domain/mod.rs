//! Domain layer - Core entities and query vocabulary
//!
//! This module contains the record model together with the typed
//! arguments and results of every data-access operation, independent
//! of how the store expresses them.

pub mod aggregate;
pub mod query;
pub mod record;

pub use aggregate::{
    AggregateArgs, AggregateExpr, AggregateResult, AggregateSelection, CountField, FieldValue,
    GroupByArgs, GroupByBuilder, GroupOrder, GroupRow, HavingFilter, NumberFilter,
};
pub use query::{
    FindManyArgs, IntFilter, NumericField, OrderBy, QueryMode, RecordField, RecordFilter,
    SortOrder, StringCondition, StringFilter,
};
pub use record::{sample_records, AgeUpdate, NewRecord, Record, RecordPatch};
