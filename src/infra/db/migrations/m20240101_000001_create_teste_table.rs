//! Migration: Create the record table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Teste::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Teste::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Teste::Nome).text().not_null())
                    .col(ColumnDef::new(Teste::Idade).integer().not_null())
                    .col(ColumnDef::new(Teste::Curso).text().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Teste::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Teste {
    Table,
    Id,
    Nome,
    Idade,
    Curso,
}
