use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create clients table
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Clients::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string(Clients::ApiKey))
                    .col(string(Clients::ApiSecret))
                    .col(string(Clients::Description))
                    .col(string(Clients::Oauth2RedirectionUri))
                    .col(
                        ColumnDef::new(Clients::GtClientCredentials)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clients::GtAuthcode)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clients::GtImplicit)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clients::GtResourceowner)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(big_integer_null(Clients::GtClientCredentialsUser))
                    .col(
                        ColumnDef::new(Clients::UserRestrictionActive)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clients::IpRestrictionActive)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clients::ConsentMessageActive)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(string(Clients::ConsentMessage))
                    .col(
                        ColumnDef::new(Clients::AuthcodeRefreshActive)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Clients::ResourceownerRefreshActive)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(big_integer(Clients::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // An api_key addresses at most one client
        manager
            .create_index(
                Index::create()
                    .name("idx_clients_api_key")
                    .table(Clients::Table)
                    .col(Clients::ApiKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create permissions table
        manager
            .create_table(
                Table::create()
                    .table(Permissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Permissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(Permissions::ClientId))
                    .col(string(Permissions::Pattern))
                    .col(string(Permissions::Verb))
                    .to_owned(),
            )
            .await?;

        // Create allowed_users table
        manager
            .create_table(
                Table::create()
                    .table(AllowedUsers::Table)
                    .if_not_exists()
                    .col(big_integer(AllowedUsers::ClientId))
                    .col(big_integer(AllowedUsers::UserId))
                    .primary_key(
                        Index::create()
                            .col(AllowedUsers::ClientId)
                            .col(AllowedUsers::UserId),
                    )
                    .to_owned(),
            )
            .await?;

        // Create allowed_ips table
        manager
            .create_table(
                Table::create()
                    .table(AllowedIps::Table)
                    .if_not_exists()
                    .col(big_integer(AllowedIps::ClientId))
                    .col(string(AllowedIps::Ip))
                    .primary_key(Index::create().col(AllowedIps::ClientId).col(AllowedIps::Ip))
                    .to_owned(),
            )
            .await?;

        // Create tokens table (written by the authentication core; the
        // registry only cascades deletes over it)
        manager
            .create_table(
                Table::create()
                    .table(Tokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tokens::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(big_integer(Tokens::ClientId))
                    .col(big_integer(Tokens::UserId))
                    .col(string(Tokens::Token))
                    .col(string(Tokens::Kind))
                    .col(big_integer(Tokens::CreatedAt))
                    .col(big_integer(Tokens::ExpiresAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AllowedIps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AllowedUsers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
    ApiKey,
    ApiSecret,
    Description,
    Oauth2RedirectionUri,
    GtClientCredentials,
    GtAuthcode,
    GtImplicit,
    GtResourceowner,
    GtClientCredentialsUser,
    UserRestrictionActive,
    IpRestrictionActive,
    ConsentMessageActive,
    ConsentMessage,
    AuthcodeRefreshActive,
    ResourceownerRefreshActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Permissions {
    Table,
    Id,
    ClientId,
    Pattern,
    Verb,
}

#[derive(DeriveIden)]
enum AllowedUsers {
    Table,
    ClientId,
    UserId,
}

#[derive(DeriveIden)]
enum AllowedIps {
    Table,
    ClientId,
    Ip,
}

#[derive(DeriveIden)]
enum Tokens {
    Table,
    Id,
    ClientId,
    UserId,
    Token,
    Kind,
    CreatedAt,
    ExpiresAt,
}
