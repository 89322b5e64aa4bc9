use sea_orm_migration::prelude::*;

use crate::catalog::add_column_if_missing;
use crate::error::StepError;
use crate::migrator::{Criticality, StepContext, StepKind, StepTrait, Tracking};

/// 预算已用金额、合同复检周期以及合同年度记录表
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl StepTrait for Migration {
    fn kind(&self) -> StepKind {
        StepKind::Schema
    }

    fn criticality(&self) -> Criticality {
        Criticality::Critical
    }

    fn tracking(&self) -> Tracking {
        Tracking::Tracked
    }

    fn requires(&self) -> &'static [&'static str] {
        &["m20240108_000001_create_base_schema"]
    }

    async fn up(&self, ctx: &StepContext<'_>) -> Result<(), StepError> {
        let manager = ctx.schema_manager();

        add_column_if_missing(
            &manager,
            "budget_categories",
            "spent",
            Table::alter()
                .table(BudgetCategories::Table)
                .add_column(ColumnDef::new(BudgetCategories::Spent).double().not_null().default(0.0))
                .to_owned(),
        )
        .await?;

        add_column_if_missing(
            &manager,
            "contracts",
            "recurrence_interval_years",
            Table::alter()
                .table(Contracts::Table)
                .add_column(ColumnDef::new(Contracts::RecurrenceIntervalYears).integer().null())
                .to_owned(),
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContractYears::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ContractYears::ContractId).integer().not_null())
                    .col(ColumnDef::new(ContractYears::Year).integer().not_null())
                    .col(
                        ColumnDef::new(ContractYears::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .primary_key(Index::create().col(ContractYears::ContractId).col(ContractYears::Year))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contract_years_contract")
                            .from(ContractYears::Table, ContractYears::ContractId)
                            .to(Contracts::Table, Contracts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum BudgetCategories {
    Table,
    Spent,
}

#[derive(DeriveIden)]
enum Contracts {
    Table,
    Id,
    RecurrenceIntervalYears,
}

#[derive(DeriveIden)]
enum ContractYears {
    Table,
    ContractId,
    Year,
    Status,
}
