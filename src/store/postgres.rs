//! Postgres-backed store shared between server instances

use async_trait::async_trait;
use sqlx::PgPool;

use super::{ChallengeStore, ReplayGuardStore, StoreError};
use crate::auth::WalletAddress;
use crate::models::{Challenge, ReplayRecord};

#[derive(Debug, sqlx::FromRow)]
struct ChallengeRow {
    address: String,
    message: String,
    nonce: String,
    issued_at_ms: i64,
}

impl TryFrom<ChallengeRow> for Challenge {
    type Error = StoreError;

    fn try_from(row: ChallengeRow) -> Result<Self, Self::Error> {
        let address = WalletAddress::parse(&row.address).map_err(|e| StoreError::Corrupt {
            address: row.address.clone(),
            reason: e.to_string(),
        })?;

        Ok(Challenge {
            address,
            message: row.message,
            nonce: row.nonce,
            timestamp: row.issued_at_ms,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReplayRow {
    last_verified_challenge_hash: String,
    last_verified_at_ms: i64,
}

/// Store backed by the `auth_challenges` and `auth_replay_guard` tables
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ChallengeStore for PgStore {
    async fn put(&self, challenge: Challenge) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO auth_challenges (address, message, nonce, issued_at_ms)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (address) DO UPDATE
            SET message = EXCLUDED.message,
                nonce = EXCLUDED.nonce,
                issued_at_ms = EXCLUDED.issued_at_ms,
                updated_at = NOW()
            "#,
        )
        .bind(challenge.address.as_str())
        .bind(&challenge.message)
        .bind(&challenge.nonce)
        .bind(challenge.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, address: &WalletAddress) -> Result<Option<Challenge>, StoreError> {
        let row: Option<ChallengeRow> = sqlx::query_as(
            r#"
            SELECT address, message, nonce, issued_at_ms
            FROM auth_challenges
            WHERE address = $1
            "#,
        )
        .bind(address.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Challenge::try_from).transpose()
    }

    async fn delete(&self, address: &WalletAddress) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM auth_challenges WHERE address = $1")
            .bind(address.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn take_if_matches(&self, expected: &Challenge) -> Result<bool, StoreError> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM auth_challenges
            WHERE address = $1 AND message = $2 AND issued_at_ms = $3
            "#,
        )
        .bind(expected.address.as_str())
        .bind(&expected.message)
        .bind(expected.timestamp)
        .execute(&self.pool)
        .await?
        .rows_affected();

        // Zero rows means another request consumed or replaced it first
        Ok(rows_affected == 1)
    }

    async fn purge_expired(&self, cutoff_ms: i64) -> Result<u64, StoreError> {
        let rows_affected = sqlx::query("DELETE FROM auth_challenges WHERE issued_at_ms < $1")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    async fn list(&self) -> Result<Vec<Challenge>, StoreError> {
        let rows: Vec<ChallengeRow> = sqlx::query_as(
            r#"
            SELECT address, message, nonce, issued_at_ms
            FROM auth_challenges
            ORDER BY issued_at_ms ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Challenge::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ReplayGuardStore for PgStore {
    async fn last_verified(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<ReplayRecord>, StoreError> {
        let row: Option<ReplayRow> = sqlx::query_as(
            r#"
            SELECT last_verified_challenge_hash, last_verified_at_ms
            FROM auth_replay_guard
            WHERE address = $1
            "#,
        )
        .bind(address.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ReplayRecord {
            last_verified_challenge_hash: r.last_verified_challenge_hash,
            last_verified_at: r.last_verified_at_ms,
        }))
    }

    async fn record_verification(
        &self,
        address: &WalletAddress,
        record: ReplayRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO auth_replay_guard (address, last_verified_challenge_hash, last_verified_at_ms)
            VALUES ($1, $2, $3)
            ON CONFLICT (address) DO UPDATE
            SET last_verified_challenge_hash = EXCLUDED.last_verified_challenge_hash,
                last_verified_at_ms = EXCLUDED.last_verified_at_ms
            "#,
        )
        .bind(address.as_str())
        .bind(&record.last_verified_challenge_hash)
        .bind(record.last_verified_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
