//! PostgreSQL ledger store
//!
//! Deployment backend. Batch commits run inside one database
//! transaction; the balance update and the request status CAS are
//! guarded by `rows_affected`, so a lost race rolls the whole batch
//! back.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::account::{Account, MoniNumber};
use crate::core_types::{AccountKey, NotificationId, PostingId, TransferId};
use crate::notify::{Notification, NotificationKind, RequestStatus};
use crate::transfer::{DisplayData, Posting, PostingStatus, TransferKind};

use super::batch::{WriteBatch, WriteOp};
use super::error::StoreError;
use super::LedgerStore;

const MONI_SEQUENCE: &str = "wallet_moni_seq";
const MONI_UNIQUE_CONSTRAINT: &str = "wallet_accounts_moni_number_key";

/// PostgreSQL [`LedgerStore`] backend.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables, the wallet number sequence, and listing indexes.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallet_accounts (
                account_key     TEXT PRIMARY KEY,
                display_name    TEXT NOT NULL,
                moni_number     TEXT NOT NULL UNIQUE,
                balance         BIGINT NOT NULL DEFAULT 0,
                linked_balance  BIGINT NOT NULL DEFAULT 0,
                created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE SEQUENCE IF NOT EXISTS {MONI_SEQUENCE} START 1"
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallet_postings (
                id                 TEXT PRIMARY KEY,
                transfer_id        TEXT NOT NULL,
                account_key        TEXT NOT NULL,
                kind               TEXT NOT NULL,
                amount             BIGINT NOT NULL,
                status             TEXT NOT NULL,
                title              TEXT NOT NULL,
                description        TEXT NOT NULL,
                icon               TEXT NOT NULL,
                color              TEXT NOT NULL,
                counterparty_name  TEXT,
                counterparty_moni  TEXT,
                message            TEXT,
                reference          TEXT,
                details            TEXT NOT NULL,
                created_at         TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_wallet_postings_account \
             ON wallet_postings (account_key, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wallet_notifications (
                id               TEXT PRIMARY KEY,
                account_key      TEXT NOT NULL,
                kind             TEXT NOT NULL,
                title            TEXT NOT NULL,
                message          TEXT NOT NULL,
                amount           BIGINT,
                sender_name      TEXT,
                sender_moni      TEXT,
                posting_id       TEXT,
                request_status   TEXT,
                is_read          BOOLEAN NOT NULL DEFAULT FALSE,
                action_required  BOOLEAN NOT NULL DEFAULT FALSE,
                created_at       TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_wallet_notifications_account \
             ON wallet_notifications (account_key, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn bad_column(column: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Internal(format!("bad {column} column: {err}"))
}

fn amount_to_db(amount: u64) -> Result<i64, StoreError> {
    i64::try_from(amount).map_err(|_| StoreError::Internal("amount exceeds ledger range".into()))
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let moni: String = row.get("moni_number");
    Ok(Account {
        key: AccountKey::new(row.get::<String, _>("account_key")),
        display_name: row.get("display_name"),
        moni_number: MoniNumber::new(&moni).map_err(|e| bad_column("moni_number", e))?,
        balance: row.get("balance"),
        linked_balance: row.get("linked_balance"),
        created_at: row.get("created_at"),
    })
}

fn posting_from_row(row: &PgRow) -> Result<Posting, StoreError> {
    let id: String = row.get("id");
    let transfer_id: String = row.get("transfer_id");
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    let details: String = row.get("details");
    let amount: i64 = row.get("amount");
    let counterparty_moni: Option<String> = row.get("counterparty_moni");

    Ok(Posting {
        id: PostingId::from_str(&id).map_err(|e| bad_column("id", e))?,
        transfer_id: TransferId::from_str(&transfer_id)
            .map_err(|e| bad_column("transfer_id", e))?,
        account: AccountKey::new(row.get::<String, _>("account_key")),
        kind: TransferKind::from_str(&kind).map_err(|e| bad_column("kind", e))?,
        amount: u64::try_from(amount).map_err(|e| bad_column("amount", e))?,
        status: PostingStatus::from_str(&status).map_err(|e| bad_column("status", e))?,
        display: DisplayData {
            title: row.get("title"),
            description: row.get("description"),
            icon: row.get("icon"),
            color: row.get("color"),
        },
        counterparty_name: row.get("counterparty_name"),
        counterparty_moni: counterparty_moni
            .map(|m| MoniNumber::new(&m))
            .transpose()
            .map_err(|e| bad_column("counterparty_moni", e))?,
        message: row.get("message"),
        reference: row.get("reference"),
        details: serde_json::from_str(&details).map_err(|e| bad_column("details", e))?,
        created_at: row.get("created_at"),
    })
}

fn notification_from_row(row: &PgRow) -> Result<Notification, StoreError> {
    let id: String = row.get("id");
    let kind: String = row.get("kind");
    let amount: Option<i64> = row.get("amount");
    let sender_moni: Option<String> = row.get("sender_moni");
    let posting_id: Option<String> = row.get("posting_id");
    let request_status: Option<String> = row.get("request_status");

    Ok(Notification {
        id: NotificationId::from_str(&id).map_err(|e| bad_column("id", e))?,
        account: AccountKey::new(row.get::<String, _>("account_key")),
        kind: NotificationKind::from_str(&kind).map_err(|e| bad_column("kind", e))?,
        title: row.get("title"),
        message: row.get("message"),
        amount: amount
            .map(u64::try_from)
            .transpose()
            .map_err(|e| bad_column("amount", e))?,
        sender_name: row.get("sender_name"),
        sender_moni: sender_moni
            .map(|m| MoniNumber::new(&m))
            .transpose()
            .map_err(|e| bad_column("sender_moni", e))?,
        posting_id: posting_id
            .map(|p| PostingId::from_str(&p))
            .transpose()
            .map_err(|e| bad_column("posting_id", e))?,
        request_status: request_status
            .map(|s| RequestStatus::from_str(&s))
            .transpose()
            .map_err(|e| bad_column("request_status", e))?,
        read: row.get("is_read"),
        action_required: row.get("action_required"),
        created_at: row.get("created_at"),
    })
}

async fn insert_posting(
    tx: &mut Transaction<'_, Postgres>,
    posting: &Posting,
) -> Result<(), StoreError> {
    let details = serde_json::to_string(&posting.details)
        .map_err(|e| StoreError::Internal(format!("details not serializable: {e}")))?;
    sqlx::query(
        r#"
        INSERT INTO wallet_postings
            (id, transfer_id, account_key, kind, amount, status,
             title, description, icon, color,
             counterparty_name, counterparty_moni, message, reference,
             details, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(posting.id.to_string())
    .bind(posting.transfer_id.to_string())
    .bind(posting.account.as_str())
    .bind(posting.kind.as_str())
    .bind(amount_to_db(posting.amount)?)
    .bind(posting.status.as_str())
    .bind(&posting.display.title)
    .bind(&posting.display.description)
    .bind(&posting.display.icon)
    .bind(&posting.display.color)
    .bind(posting.counterparty_name.as_deref())
    .bind(posting.counterparty_moni.as_ref().map(|m| m.as_str()))
    .bind(posting.message.as_deref())
    .bind(posting.reference.as_deref())
    .bind(details)
    .bind(posting.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_notification(
    tx: &mut Transaction<'_, Postgres>,
    notification: &Notification,
) -> Result<(), StoreError> {
    let amount = notification.amount.map(amount_to_db).transpose()?;
    sqlx::query(
        r#"
        INSERT INTO wallet_notifications
            (id, account_key, kind, title, message, amount,
             sender_name, sender_moni, posting_id, request_status,
             is_read, action_required, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(notification.id.to_string())
    .bind(notification.account.as_str())
    .bind(notification.kind.as_str())
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(amount)
    .bind(notification.sender_name.as_deref())
    .bind(notification.sender_moni.as_ref().map(|m| m.as_str()))
    .bind(notification.posting_id.map(|p| p.to_string()))
    .bind(notification.request_status.map(|s| s.as_str()))
    .bind(notification.read)
    .bind(notification.action_required)
    .bind(notification.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn account(&self, key: &AccountKey) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            "SELECT account_key, display_name, moni_number, balance, linked_balance, created_at \
             FROM wallet_accounts WHERE account_key = $1",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn account_by_moni(&self, moni: &MoniNumber) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            "SELECT account_key, display_name, moni_number, balance, linked_balance, created_at \
             FROM wallet_accounts WHERE moni_number = $1",
        )
        .bind(moni.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO wallet_accounts \
             (account_key, display_name, moni_number, balance, linked_balance, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(account.key.as_str())
        .bind(&account.display_name)
        .bind(account.moni_number.as_str())
        .bind(account.balance)
        .bind(account.linked_balance)
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if let Some(db) = e.as_database_error() {
                    if db.is_unique_violation() {
                        return Err(if db.constraint() == Some(MONI_UNIQUE_CONSTRAINT) {
                            StoreError::DuplicateMoniNumber(account.moni_number.to_string())
                        } else {
                            StoreError::AccountExists(account.key.to_string())
                        });
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn next_moni_sequence(&self) -> Result<u64, StoreError> {
        let row = sqlx::query(&format!("SELECT nextval('{MONI_SEQUENCE}') AS seq"))
            .fetch_one(&self.pool)
            .await?;
        let seq: i64 = row.get("seq");
        u64::try_from(seq).map_err(|e| bad_column("seq", e))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for op in batch.into_ops() {
            match op {
                WriteOp::InsertPosting(posting) => insert_posting(&mut tx, &posting).await?,
                WriteOp::InsertNotification(notification) => {
                    insert_notification(&mut tx, &notification).await?
                }
                WriteOp::AdjustBalance { account, delta } => {
                    let result = sqlx::query(
                        "UPDATE wallet_accounts SET balance = balance + $1 \
                         WHERE account_key = $2",
                    )
                    .bind(delta)
                    .bind(account.as_str())
                    .execute(&mut *tx)
                    .await?;
                    if result.rows_affected() != 1 {
                        return Err(StoreError::AccountNotFound(account.to_string()));
                    }
                }
                WriteOp::SetRequestStatus { id, expected, next } => {
                    // leaving Pending clears the action flag
                    let result = sqlx::query(
                        "UPDATE wallet_notifications \
                         SET request_status = $1, action_required = action_required AND $2 \
                         WHERE id = $3 AND kind = $4 AND request_status = $5",
                    )
                    .bind(next.as_str())
                    .bind(next == RequestStatus::Pending)
                    .bind(id.to_string())
                    .bind(NotificationKind::P2pRequest.as_str())
                    .bind(expected.as_str())
                    .execute(&mut *tx)
                    .await?;
                    if result.rows_affected() != 1 {
                        return Err(StoreError::RequestConflict(id.to_string()));
                    }
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn posting(&self, id: PostingId) -> Result<Option<Posting>, StoreError> {
        let row = sqlx::query("SELECT * FROM wallet_postings WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(posting_from_row).transpose()
    }

    async fn postings_for(
        &self,
        key: &AccountKey,
        limit: usize,
    ) -> Result<Vec<Posting>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            "SELECT * FROM wallet_postings WHERE account_key = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(key.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(posting_from_row).collect()
    }

    async fn notification(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, StoreError> {
        let row = sqlx::query("SELECT * FROM wallet_notifications WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(notification_from_row).transpose()
    }

    async fn notifications_for(
        &self,
        key: &AccountKey,
    ) -> Result<Vec<Notification>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM wallet_notifications WHERE account_key = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(key.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> Result<Option<Notification>, StoreError> {
        let row = sqlx::query(
            "UPDATE wallet_notifications \
             SET is_read = TRUE, action_required = FALSE \
             WHERE id = $1 RETURNING *",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(notification_from_row).transpose()
    }

    async fn update_request_status(
        &self,
        id: NotificationId,
        expected: RequestStatus,
        next: RequestStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE wallet_notifications \
             SET request_status = $1, action_required = action_required AND $2 \
             WHERE id = $3 AND kind = $4 AND request_status = $5",
        )
        .bind(next.as_str())
        .bind(next == RequestStatus::Pending)
        .bind(id.to_string())
        .bind(NotificationKind::P2pRequest.as_str())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
