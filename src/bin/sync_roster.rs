use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use std::env;

use workshop_signup::config;
use workshop_signup::database::{roster_repo, schema, TableStore};
use workshop_signup::services::sheets_service::SheetsTableStore;

// Copies the roster worksheet into the local SQLite roster table.
#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let sheets = config::sheets_config_from_env().expect("Invalid Sheets configuration");
    let roster_sheet = sheets.roster_sheet.clone();

    let pool = SqlitePoolOptions::new()
        .connect(&db_url)
        .await
        .expect("Cannot connect to the database");
    schema::ensure_schema(&pool)
        .await
        .expect("Cannot create the database schema");

    let entries = match SheetsTableStore::new(sheets).read_roster().await {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("roster sync failed reading sheet {}: {}", roster_sheet, e);
            std::process::exit(1);
        }
    };

    let institutions = {
        let mut codes: Vec<i64> = entries.iter().map(|e| e.institution_code).collect();
        codes.sort_unstable();
        codes.dedup();
        codes.len()
    };

    match roster_repo::replace_roster(&pool, &entries).await {
        Ok(written) => {
            println!(
                "roster sync: sheet={}, participants={}, institutions={}",
                roster_sheet, written, institutions
            );
        }
        Err(e) => {
            eprintln!("roster sync failed writing database: {}", e);
            std::process::exit(1);
        }
    }
}
