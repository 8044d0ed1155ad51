use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string())
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::EmailVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::GoogleId).string().unique_key())
                    .col(ColumnDef::new(Users::ProfileImage).string())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Users::LastLogin).timestamp_with_time_zone())
                    .col(ColumnDef::new(Users::PasswordChangedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Users::FarmLocation).string())
                    .col(ColumnDef::new(Users::FarmSize).double())
                    .col(
                        ColumnDef::new(Users::Crops)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Users::LanguagePreference)
                            .string()
                            .not_null()
                            .default("en"),
                    )
                    .col(ColumnDef::new(Users::WhatsappNumber).string())
                    .col(
                        ColumnDef::new(Users::WhatsappEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::WhatsappVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::AlertWeather)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::AlertMarketPrices)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::AlertCropDiseases)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::WhatsappCode).string())
                    .col(ColumnDef::new(Users::WhatsappCodeExpiresAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Bulk alert recipient lookup.
        manager
            .create_index(
                Index::create()
                    .table(Users::Table)
                    .col(Users::WhatsappVerified)
                    .col(Users::WhatsappEnabled)
                    .name("idx_users_whatsapp_reachable")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    FullName,
    Phone,
    IsActive,
    IsAdmin,
    EmailVerified,
    GoogleId,
    ProfileImage,
    CreatedAt,
    LastLogin,
    PasswordChangedAt,
    FarmLocation,
    FarmSize,
    Crops,
    LanguagePreference,
    WhatsappNumber,
    WhatsappEnabled,
    WhatsappVerified,
    AlertWeather,
    AlertMarketPrices,
    AlertCropDiseases,
    WhatsappCode,
    WhatsappCodeExpiresAt,
}
