use sqlx::SqlitePool;

use crate::models::Registration;

const SQL_LIST_REGISTRATIONS: &str = r#"
SELECT
  nome_participante,
  nome_ies,
  oficina_dia1,
  oficina_dia2
FROM registrations
ORDER BY rowid ASC
"#;

const SQL_INSERT_REGISTRATION: &str = r#"
INSERT INTO registrations (
  nome_participante,
  nome_ies,
  oficina_dia1,
  oficina_dia2
) VALUES (?1, ?2, ?3, ?4)
"#;

pub async fn list_registrations(pool: &SqlitePool) -> sqlx::Result<Vec<Registration>> {
    sqlx::query_as::<_, Registration>(SQL_LIST_REGISTRATIONS)
        .fetch_all(pool)
        .await
}

pub async fn insert_registration(
    pool: &SqlitePool,
    registration: &Registration,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_REGISTRATION)
        .bind(&registration.participant_name)
        .bind(&registration.institution_name)
        .bind(&registration.workshop_day1)
        .bind(&registration.workshop_day2)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
