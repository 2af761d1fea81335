use sqlx::SqlitePool;

use crate::models::RosterEntry;

const SQL_LIST_ROSTER: &str = r#"
SELECT
  co_ies,
  no_ies,
  no_pessoa_fisica
FROM roster
ORDER BY no_ies ASC, no_pessoa_fisica ASC
"#;

const SQL_DELETE_ROSTER: &str = "DELETE FROM roster";

const SQL_INSERT_ROSTER_ENTRY: &str = r#"
INSERT INTO roster (
  co_ies,
  no_ies,
  no_pessoa_fisica
) VALUES (?1, ?2, ?3)
"#;

pub async fn list_roster(pool: &SqlitePool) -> sqlx::Result<Vec<RosterEntry>> {
    sqlx::query_as::<_, RosterEntry>(SQL_LIST_ROSTER)
        .fetch_all(pool)
        .await
}

/// Swaps the whole roster in one transaction. Returns the number of rows written.
pub async fn replace_roster(pool: &SqlitePool, entries: &[RosterEntry]) -> sqlx::Result<u64> {
    let mut tx = pool.begin().await?;
    sqlx::query(SQL_DELETE_ROSTER).execute(&mut *tx).await?;

    let mut written = 0;
    for entry in entries {
        let res = sqlx::query(SQL_INSERT_ROSTER_ENTRY)
            .bind(entry.institution_code)
            .bind(&entry.institution_name)
            .bind(&entry.participant_name)
            .execute(&mut *tx)
            .await?;
        written += res.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}
