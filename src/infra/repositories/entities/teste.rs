//! Record table entity for SeaORM.
//!
//! Rust field names follow the domain; the stored column names are kept as
//! the table was created (`nome`, `idade`, `curso`).

use sea_orm::entity::prelude::*;

use crate::domain::Record;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "teste")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "nome", column_type = "Text")]
    pub name: String,
    #[sea_orm(column_name = "idade")]
    pub age: i32,
    #[sea_orm(column_name = "curso", column_type = "Text")]
    pub course: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Record {
    fn from(model: Model) -> Self {
        Record {
            id: model.id,
            name: model.name,
            age: model.age,
            course: model.course,
        }
    }
}
