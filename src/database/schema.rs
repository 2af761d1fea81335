use sqlx::SqlitePool;

// Participant names are not unique here: the duplicate check lives in the
// registration service, not in storage.
const SQL_CREATE_REGISTRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS registrations (
  nome_participante TEXT NOT NULL,
  nome_ies TEXT NOT NULL,
  oficina_dia1 TEXT NOT NULL,
  oficina_dia2 TEXT NOT NULL,
  created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

const SQL_CREATE_ROSTER: &str = r#"
CREATE TABLE IF NOT EXISTS roster (
  co_ies INTEGER NOT NULL,
  no_ies TEXT NOT NULL,
  no_pessoa_fisica TEXT NOT NULL
)
"#;

const SQL_CREATE_ROSTER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_roster_co_ies ON roster (co_ies)
"#;

pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(SQL_CREATE_REGISTRATIONS).execute(pool).await?;
    sqlx::query(SQL_CREATE_ROSTER).execute(pool).await?;
    sqlx::query(SQL_CREATE_ROSTER_INDEX).execute(pool).await?;
    Ok(())
}
