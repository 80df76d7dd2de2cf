use chrono::Utc;
use flashdeck_core::{
    repo::Repository, Card, CardId, CardUpdate, CoreError, Deck, DeckId, DeckUpdate,
    DeckWithCardCount, NewCard, NewDeck,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use tracing::info;

pub struct PostgresRepo {
    pool: PgPool,
}

impl PostgresRepo {
    pub async fn connect(url: &str) -> Result<Self, CoreError> {
        info!("connecting to postgres");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(|e| CoreError::storage("pg connect", e))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        CREATE TABLE IF NOT EXISTS decks (
          id           bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
          user_id      text NOT NULL,
          title        varchar(255) NOT NULL,
          description  text,
          created_at   timestamptz NOT NULL DEFAULT now(),
          updated_at   timestamptz NOT NULL DEFAULT now()
        );

        CREATE TABLE IF NOT EXISTS cards (
          id          bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
          deck_id     bigint NOT NULL REFERENCES decks(id) ON DELETE CASCADE,
          front       text NOT NULL,
          back        text NOT NULL,
          created_at  timestamptz NOT NULL DEFAULT now(),
          updated_at  timestamptz NOT NULL DEFAULT now()
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
                .map_err(|e| CoreError::storage("pg schema", e))?;
        }
        info!("postgres schema ready");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Repository for PostgresRepo {
    // ===== Decks =====
    async fn list_decks(&self, user_id: &str) -> Result<Vec<Deck>, CoreError> {
        let rows = sqlx::query(
            r#"SELECT id,user_id,title,description,created_at,updated_at
               FROM decks WHERE user_id=$1 ORDER BY id ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg list decks", e))?;
        rows.iter().map(row_into_deck).collect()
    }

    async fn get_deck(&self, id: DeckId, user_id: &str) -> Result<Deck, CoreError> {
        let row = sqlx::query(
            r#"SELECT id,user_id,title,description,created_at,updated_at
               FROM decks WHERE id=$1 AND user_id=$2"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg read deck", e))?;
        let row = row.ok_or(CoreError::NotFound("deck"))?;
        row_into_deck(&row)
    }

    async fn create_deck(&self, input: &NewDeck) -> Result<Deck, CoreError> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"INSERT INTO decks (user_id,title,description,created_at,updated_at)
               VALUES ($1,$2,$3,$4,$4)
               RETURNING id,user_id,title,description,created_at,updated_at"#,
        )
        .bind(&input.user_id)
        .bind(&input.title)
        .bind(input.description.as_deref())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg insert deck", e))?;
        row_into_deck(&row)
    }

    async fn update_deck(&self, input: &DeckUpdate) -> Result<Deck, CoreError> {
        let row = sqlx::query(
            r#"
            UPDATE decks SET
              title=COALESCE($1, title),
              description=CASE WHEN $2 THEN $3 ELSE description END,
              updated_at=$4
            WHERE id=$5 AND user_id=$6
            RETURNING id,user_id,title,description,created_at,updated_at
            "#,
        )
        .bind(input.title.as_deref())
        .bind(input.description.is_some())
        .bind(input.description.clone().flatten())
        .bind(Utc::now())
        .bind(input.id)
        .bind(&input.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg update deck", e))?;
        let row = row.ok_or(CoreError::NotFound("deck"))?;
        row_into_deck(&row)
    }

    async fn delete_deck(&self, id: DeckId, user_id: &str) -> Result<Deck, CoreError> {
        let row = sqlx::query(
            r#"DELETE FROM decks WHERE id=$1 AND user_id=$2
               RETURNING id,user_id,title,description,created_at,updated_at"#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg del deck", e))?;
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
            WHERE d.user_id=$1
            GROUP BY d.id, d.user_id, d.title, d.description, d.created_at, d.updated_at
            ORDER BY d.updated_at ASC, d.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg count cards", e))?;
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
               FROM cards WHERE deck_id=$1 ORDER BY id ASC"#,
        )
        .bind(deck_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg list cards", e))?;
        rows.iter().map(row_into_card).collect()
    }

    async fn get_card(&self, id: CardId) -> Result<Card, CoreError> {
        let row = sqlx::query(
            r#"SELECT id,deck_id,front,back,created_at,updated_at
               FROM cards WHERE id=$1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg read card", e))?;
        let row = row.ok_or(CoreError::NotFound("card"))?;
        row_into_card(&row)
    }

    async fn create_card(&self, input: &NewCard) -> Result<Card, CoreError> {
        let row = sqlx::query(
            r#"INSERT INTO cards (deck_id,front,back,created_at,updated_at)
               VALUES ($1,$2,$3,$4,$4)
               RETURNING id,deck_id,front,back,created_at,updated_at"#,
        )
        .bind(input.deck_id)
        .bind(&input.front)
        .bind(&input.back)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg insert card", e))?;
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
              deck_id=$1,
              front=COALESCE($2, front),
              back=COALESCE($3, back),
              updated_at=$4
            WHERE id=$5 AND ($6::bigint IS NULL OR deck_id=$6)
            RETURNING id,deck_id,front,back,created_at,updated_at
            "#,
        )
        .bind(input.deck_id)
        .bind(input.front.as_deref())
        .bind(input.back.as_deref())
        .bind(Utc::now())
        .bind(input.id)
        .bind(within)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg update card", e))?;
        let row = row.ok_or(CoreError::NotFound("card"))?;
        row_into_card(&row)
    }

    async fn delete_card(&self, id: CardId, within: Option<DeckId>) -> Result<Card, CoreError> {
        let row = sqlx::query(
            r#"DELETE FROM cards WHERE id=$1 AND ($2::bigint IS NULL OR deck_id=$2)
               RETURNING id,deck_id,front,back,created_at,updated_at"#,
        )
        .bind(id)
        .bind(within)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CoreError::storage("pg del card", e))?;
        let row = row.ok_or(CoreError::NotFound("card"))?;
        row_into_card(&row)
    }
}

// ===== helpers =====
fn col<'r, T>(row: &'r PgRow, name: &str) -> Result<T, CoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| CoreError::storage("pg decode row", e))
}

fn row_into_deck(row: &PgRow) -> Result<Deck, CoreError> {
    Ok(Deck {
        id: col(row, "id")?,
        user_id: col(row, "user_id")?,
        title: col(row, "title")?,
        description: col(row, "description")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn row_into_card(row: &PgRow) -> Result<Card, CoreError> {
    Ok(Card {
        id: col(row, "id")?,
        deck_id: col(row, "deck_id")?,
        front: col(row, "front")?,
        back: col(row, "back")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}
