use chrono::{DateTime, SecondsFormat, Utc};
use flashdeck_core::{
    repo::Repository, Card, CardId, CardUpdate, CoreError, Deck, DeckId, DeckUpdate,
    DeckWithCardCount, NewCard, NewDeck,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening sqlite store");
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|e| CoreError::storage("sqlite connect", e))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    /// Private in-memory database. Every pooled connection to `:memory:`
    /// would see its own empty database, so the pool holds exactly one and
    /// never recycles it.
    pub async fn open_memory() -> Result<Self, CoreError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CoreError::storage("sqlite options", e))?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await
            .map_err(|e| CoreError::storage("sqlite connect", e))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        // Foreign keys are switched on per connection through the connect options.
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS decks (
          id           INTEGER PRIMARY KEY AUTOINCREMENT,
          user_id      TEXT NOT NULL,
          title        TEXT NOT NULL CHECK (length(title) <= 255),
          description  TEXT,
          created_at   TEXT NOT NULL,
          updated_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cards (
          id          INTEGER PRIMARY KEY AUTOINCREMENT,
          deck_id     INTEGER NOT NULL,
          front       TEXT NOT NULL,
          back        TEXT NOT NULL,
          created_at  TEXT NOT NULL,
          updated_at  TEXT NOT NULL,
          FOREIGN KEY(deck_id) REFERENCES decks(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_decks_user_updated ON decks (user_id, updated_at);
        CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards (deck_id);
        "#;

        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| CoreError::storage("sqlite schema", e))?;
        }
        info!("sqlite schema ready");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Repository for SqliteRepo {
    // ===== Decks =====
    async fn list_decks(&self, user_id: &str) -> Result<Vec<Deck>, CoreError> {
        let rows = sqlx::query(
            r#"SELECT id,user_id,title,description,created_at,updated_at
               FROM decks WHERE user_id=? ORDER BY id ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::storage("list decks", e))?;
        rows.iter().map(row_into_deck).collect()
    }

    async fn get_deck(&self, id: DeckId, user_id: &str) -> Result<Deck, CoreError> {
        let row = sqlx::query(
            r#"SELECT id,user_id,title,description,created_at,updated_at
               FROM decks WHERE id=? AND user_id=?"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("read deck", e))?;
        let row = row.ok_or(CoreError::NotFound("deck"))?;
        row_into_deck(&row)
    }

    async fn create_deck(&self, input: &NewDeck) -> Result<Deck, CoreError> {
        let now = dt_to_str(Utc::now());
        let row = sqlx::query(
            r#"INSERT INTO decks (user_id,title,description,created_at,updated_at)
               VALUES (?,?,?,?,?)
               RETURNING id,user_id,title,description,created_at,updated_at"#,
        )
        .bind(&input.user_id)
        .bind(&input.title)
        .bind(input.description.as_deref())
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CoreError::storage("insert deck", e))?;
        row_into_deck(&row)
    }

    async fn update_deck(&self, input: &DeckUpdate) -> Result<Deck, CoreError> {
        let row = sqlx::query(
            r#"
            UPDATE decks SET
              title=COALESCE(?, title),
              description=CASE WHEN ? THEN ? ELSE description END,
              updated_at=?
            WHERE id=? AND user_id=?
            RETURNING id,user_id,title,description,created_at,updated_at
            "#,
        )
        .bind(input.title.as_deref())
        .bind(input.description.is_some())
        .bind(input.description.clone().flatten())
        .bind(dt_to_str(Utc::now()))
        .bind(input.id)
        .bind(&input.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("update deck", e))?;
        let row = row.ok_or(CoreError::NotFound("deck"))?;
        row_into_deck(&row)
    }

    async fn delete_deck(&self, id: DeckId, user_id: &str) -> Result<Deck, CoreError> {
        // Cards go with the deck through ON DELETE CASCADE.
        let row = sqlx::query(
            r#"DELETE FROM decks WHERE id=? AND user_id=?
               RETURNING id,user_id,title,description,created_at,updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("del deck", e))?;
        let row = row.ok_or(CoreError::NotFound("deck"))?;
        row_into_deck(&row)
    }

    async fn list_decks_with_card_counts(
        &self,
        user_id: &str,
    ) -> Result<Vec<DeckWithCardCount>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.user_id, d.title, d.description, d.created_at, d.updated_at,
                   COUNT(c.id) AS card_count
            FROM decks d
            LEFT JOIN cards c ON c.deck_id = d.id
            WHERE d.user_id=?
            GROUP BY d.id, d.user_id, d.title, d.description, d.created_at, d.updated_at
            ORDER BY d.updated_at ASC, d.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::storage("count cards", e))?;
        let mut v = Vec::with_capacity(rows.len());
        for row in rows {
            v.push(DeckWithCardCount {
                deck: row_into_deck(&row)?,
                card_count: col(&row, "card_count")?,
            });
        }
        Ok(v)
    }

    // ===== Cards =====
    async fn list_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CoreError> {
        let rows = sqlx::query(
            r#"SELECT id,deck_id,front,back,created_at,updated_at
               FROM cards WHERE deck_id=? ORDER BY id ASC"#,
        )
        .bind(deck_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::storage("list cards", e))?;
        rows.iter().map(row_into_card).collect()
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        let row = sqlx::query(
            r#"SELECT id,deck_id,front,back,created_at,updated_at
               FROM cards WHERE id=?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("read card", e))?;
        let row = row.ok_or(CoreError::NotFound("card"))?;
        row_into_card(&row)
    }

    async fn create_card(&self, input: &NewCard) -> Result<Card, CoreError> {
        let now = dt_to_str(Utc::now());
        let row = sqlx::query(
            r#"INSERT INTO cards (deck_id,front,back,created_at,updated_at)
               VALUES (?,?,?,?,?)
               RETURNING id,deck_id,front,back,created_at,updated_at"#,
        )
        .bind(input.deck_id)
        .bind(&input.front)
        .bind(&input.back)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CoreError::storage("insert card", e))?;
        row_into_card(&row)
    }

    async fn update_card(
        &self,
        input: &CardUpdate,
        within: Option<DeckId>,
    ) -> Result<Card, CoreError> {
        let row = sqlx::query(
            r#"
            UPDATE cards SET
              deck_id=?,
              front=COALESCE(?, front),
              back=COALESCE(?, back),
              updated_at=?
            WHERE id=? AND (? IS NULL OR deck_id=?)
            RETURNING id,deck_id,front,back,created_at,updated_at
            "#,
        )
        .bind(input.deck_id)
        .bind(input.front.as_deref())
        .bind(input.back.as_deref())
        .bind(dt_to_str(Utc::now()))
        .bind(input.id)
        .bind(within)
        .bind(within)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("update card", e))?;
        let row = row.ok_or(CoreError::NotFound("card"))?;
        row_into_card(&row)
    }

    async fn delete_card(&self, id: CardId, within: Option<DeckId>) -> Result<Card, CoreError> {
        let row = sqlx::query(
            r#"DELETE FROM cards WHERE id=? AND (? IS NULL OR deck_id=?)
               RETURNING id,deck_id,front,back,created_at,updated_at"#,
        )
        .bind(id)
        .bind(within)
        .bind(within)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("del card", e))?;
        let row = row.ok_or(CoreError::NotFound("card"))?;
        row_into_card(&row)
    }
}

// ===== Helpers =====

// Fixed-width UTC text keeps lexical order equal to chronological order,
// which the `ORDER BY updated_at` above relies on.
fn dt_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn dt_from_str(s: String) -> Result<DateTime<Utc>, CoreError> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map_err(|e| CoreError::storage("decode datetime", e))
        .map(|dt| dt.with_timezone(&Utc))
}

fn col<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, CoreError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(name)
        .map_err(|e| CoreError::storage("decode row", e))
}

fn row_into_deck(row: &SqliteRow) -> Result<Deck, CoreError> {
    Ok(Deck {
        id: col(row, "id")?,
        user_id: col(row, "user_id")?,
        title: col(row, "title")?,
        description: col(row, "description")?,
        created_at: dt_from_str(col(row, "created_at")?)?,
        updated_at: dt_from_str(col(row, "updated_at")?)?,
    })
}

fn row_into_card(row: &SqliteRow) -> Result<Card, CoreError> {
    Ok(Card {
        id: col(row, "id")?,
        deck_id: col(row, "deck_id")?,
        front: col(row, "front")?,
        back: col(row, "back")?,
        created_at: dt_from_str(col(row, "created_at")?)?,
        updated_at: dt_from_str(col(row, "updated_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_timestamp_is_a_storage_fault() {
        let err = dt_from_str("last tuesday".to_string()).unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)), "got {err:?}");
    }
}
