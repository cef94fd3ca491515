//! Schema of the credit ledger:
//!
//! - `users`: identities referenced by cases, ledger rows and notifications
//! - `units`: external content objects a case wraps
//! - `cases`: billable cases and their status
//! - `credit_ledger`: append-only signed credit entries
//! - `notifications`: audit records addressed to users
//! - `ledger_lock`: single row serializing balance-changing writers

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    EmployeeId,
    Name,
    Email,
    IsHouse,
}

#[derive(Iden)]
enum Units {
    Table,
    Key,
    Payload,
    FilePath,
    Registered,
    CreatedAt,
}

#[derive(Iden)]
enum Cases {
    Table,
    Id,
    Status,
    OwnerUserId,
    UnitKey,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CreditLedger {
    Table,
    Id,
    OwnerUserId,
    EmployeeId,
    DisplayName,
    Category,
    Quantity,
    RelatedCaseKey,
    IsUserInitiated,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Category,
    Message,
    Read,
    CreatedAt,
}

#[derive(Iden)]
enum LedgerLock {
    Table,
    Id,
    Version,
}

const CASE_STATUSES: [&str; 4] = ["TODO", "IN_PROGRESS", "DONE", "REJECT"];
const LEDGER_CATEGORIES: [&str; 4] = ["allocate", "revoke", "use", "cancel"];

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::EmployeeId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string())
                    .col(
                        ColumnDef::new(Users::IsHouse)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Units
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Units::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Units::Key).string().not_null().primary_key())
                    .col(ColumnDef::new(Units::Payload).json().not_null())
                    .col(ColumnDef::new(Units::FilePath).string())
                    .col(
                        ColumnDef::new(Units::Registered)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Units::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Cases
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Cases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cases::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Cases::Status)
                            .string()
                            .not_null()
                            .check(Expr::col(Cases::Status).is_in(CASE_STATUSES)),
                    )
                    .col(ColumnDef::new(Cases::OwnerUserId).integer())
                    .col(
                        ColumnDef::new(Cases::UnitKey)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Cases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Cases::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cases-owner_user_id")
                            .from(Cases::Table, Cases::OwnerUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cases-unit_key")
                            .from(Cases::Table, Cases::UnitKey)
                            .to(Units::Table, Units::Key),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Credit ledger
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CreditLedger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CreditLedger::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CreditLedger::OwnerUserId).integer())
                    .col(ColumnDef::new(CreditLedger::EmployeeId).string().not_null())
                    .col(ColumnDef::new(CreditLedger::DisplayName).string().not_null())
                    .col(
                        ColumnDef::new(CreditLedger::Category)
                            .string()
                            .not_null()
                            .check(Expr::col(CreditLedger::Category).is_in(LEDGER_CATEGORIES)),
                    )
                    .col(
                        ColumnDef::new(CreditLedger::Quantity)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(CreditLedger::Quantity).ne(0)),
                    )
                    .col(ColumnDef::new(CreditLedger::RelatedCaseKey).string())
                    .col(
                        ColumnDef::new(CreditLedger::IsUserInitiated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CreditLedger::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CreditLedger::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-credit_ledger-owner_user_id")
                            .from(CreditLedger::Table, CreditLedger::OwnerUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-credit_ledger-active-created_at")
                    .table(CreditLedger::Table)
                    .col(CreditLedger::Active)
                    .col(CreditLedger::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-credit_ledger-related_case_key")
                    .table(CreditLedger::Table)
                    .col(CreditLedger::RelatedCaseKey)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Notifications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).integer().not_null())
                    .col(ColumnDef::new(Notifications::Category).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).string().not_null())
                    .col(
                        ColumnDef::new(Notifications::Read)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-notifications-user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-notifications-user_id-read")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::Read)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Ledger lock
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerLock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerLock::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerLock::Version)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        let backend = manager.get_database_backend();
        let seed = Query::insert()
            .into_table(LedgerLock::Table)
            .columns([LedgerLock::Id, LedgerLock::Version])
            .values_panic([1.into(), 0_i64.into()])
            .to_owned();
        db.execute(backend.build(&seed)).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(LedgerLock::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CreditLedger::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Units::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
