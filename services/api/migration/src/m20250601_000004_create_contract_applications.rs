use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// First contract number handed out (`CF1000`).
const FIRST_CONTRACT_ID: i64 = 1000;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContractApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContractApplications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ContractApplications::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ContractApplications::Status)
                            .string()
                            .not_null()
                            .default("pending_verification"),
                    )
                    .col(
                        ColumnDef::new(ContractApplications::PersonalInfo)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContractApplications::Address)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContractApplications::LandDetails)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContractApplications::BankingDetails)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContractApplications::ContractTerms)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContractApplications::LandAreaSatak)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContractApplications::TotalContractValue)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContractApplications::Remarks).text())
                    .col(
                        ColumnDef::new(ContractApplications::LastUpdated)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(&format!(
                "ALTER SEQUENCE contract_applications_id_seq RESTART WITH {FIRST_CONTRACT_ID}"
            ))
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(ContractApplications::Table)
                    .col(ContractApplications::Status)
                    .name("idx_contract_applications_status")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContractApplications::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ContractApplications {
    Table,
    Id,
    SubmittedAt,
    Status,
    PersonalInfo,
    Address,
    LandDetails,
    BankingDetails,
    ContractTerms,
    LandAreaSatak,
    TotalContractValue,
    Remarks,
    LastUpdated,
}
