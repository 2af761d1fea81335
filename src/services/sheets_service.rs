use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::database::TableStore;
use crate::error::StoreError;
use crate::models::{Registration, RosterEntry};

const PARTICIPANT_COLUMNS: &[&str] = &["nome_participante", "no_pessoa_fisica"];
const INSTITUTION_COLUMNS: &[&str] = &["nome_ies", "no_ies"];
const INSTITUTION_CODE_COLUMNS: &[&str] = &["co_ies"];
const DAY1_COLUMNS: &[&str] = &["oficina_dia1"];
const DAY2_COLUMNS: &[&str] = &["oficina_dia2"];

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub api_url: String,
    pub spreadsheet_id: String,
    pub api_token: Option<String>,
    pub roster_sheet: String,
    pub registrations_sheet: String,
}

/// Worksheets in a Google spreadsheet, through the Sheets values API.
pub struct SheetsTableStore {
    client: reqwest::Client,
    config: SheetsConfig,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// A worksheet as read: header row plus data rows, every cell as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    fn from_values(values: Vec<Vec<Value>>) -> Self {
        let mut rows = values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect::<Vec<_>>());
        let header = rows
            .next()
            .map(|h| h.into_iter().map(|c| c.trim().to_string()).collect())
            .unwrap_or_default();
        Self {
            header,
            rows: rows.collect(),
        }
    }

    pub fn column(&self, aliases: &[&str]) -> Option<usize> {
        self.header
            .iter()
            .position(|h| aliases.iter().any(|a| h.eq_ignore_ascii_case(a)))
    }

    fn require_column(&self, sheet: &str, aliases: &[&str]) -> Result<usize, StoreError> {
        self.column(aliases).ok_or_else(|| {
            StoreError::Read(format!("sheet {} has no {} column", sheet, aliases[0]))
        })
    }
}

// The API drops trailing empty cells, so short rows are normal.
fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn parse_roster(sheet: &str, table: &SheetTable) -> Result<Vec<RosterEntry>, StoreError> {
    if table.header.is_empty() {
        return Ok(Vec::new());
    }
    let code_idx = table.require_column(sheet, INSTITUTION_CODE_COLUMNS)?;
    let inst_idx = table.require_column(sheet, INSTITUTION_COLUMNS)?;
    let name_idx = table.require_column(sheet, PARTICIPANT_COLUMNS)?;

    let mut entries = Vec::with_capacity(table.rows.len());
    for (line, row) in table.rows.iter().enumerate() {
        let name = cell(row, name_idx);
        if name.is_empty() {
            continue;
        }
        let raw_code = cell(row, code_idx);
        let Some(code) = parse_code(raw_code) else {
            warn!(sheet, line = line + 2, code = raw_code, "skipping roster row with invalid co_ies");
            continue;
        };
        entries.push(RosterEntry::new(code, cell(row, inst_idx), name));
    }
    Ok(entries)
}

// Sheets hands numbers back as "123" or, for formatted cells, "123.0".
fn parse_code(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

pub fn parse_registrations(
    sheet: &str,
    table: &SheetTable,
) -> Result<Vec<Registration>, StoreError> {
    if table.header.is_empty() {
        return Ok(Vec::new());
    }
    let name_idx = table.require_column(sheet, PARTICIPANT_COLUMNS)?;
    let inst_idx = table.require_column(sheet, INSTITUTION_COLUMNS)?;
    let day1_idx = table.require_column(sheet, DAY1_COLUMNS)?;
    let day2_idx = table.require_column(sheet, DAY2_COLUMNS)?;

    Ok(table
        .rows
        .iter()
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .map(|row| Registration {
            participant_name: cell(row, name_idx).to_string(),
            institution_name: cell(row, inst_idx).to_string(),
            workshop_day1: cell(row, day1_idx).to_string(),
            workshop_day2: cell(row, day2_idx).to_string(),
        })
        .collect())
}

impl SheetsTableStore {
    pub fn new(config: SheetsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn headers(&self) -> Result<HeaderMap, String> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.config.api_token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| format!("invalid api token: {}", e))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn values_url(&self, range: &str) -> Result<Url, String> {
        let mut url = Url::parse(&self.config.api_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("{} cannot be a base url", self.config.api_url))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.config.spreadsheet_id.as_str(),
                "values",
                range,
            ]);
        Ok(url)
    }

    pub async fn read_sheet(&self, sheet: &str) -> Result<SheetTable, StoreError> {
        let url = self.values_url(sheet).map_err(StoreError::Read)?;
        let resp = self
            .client
            .get(url)
            .headers(self.headers().map_err(StoreError::Read)?)
            .send()
            .await
            .map_err(|e| {
                warn!(sheet, error = %e, "sheets upstream unreachable");
                StoreError::Read(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(sheet, %status, "sheets upstream non-OK on read");
            return Err(StoreError::Read(format!("{}: {}", status, body)));
        }

        let parsed: ValueRange = resp
            .json()
            .await
            .map_err(|e| StoreError::Read(format!("invalid values payload: {}", e)))?;
        Ok(SheetTable::from_values(parsed.values))
    }
}

#[async_trait]
impl TableStore for SheetsTableStore {
    async fn read_roster(&self) -> Result<Vec<RosterEntry>, StoreError> {
        let sheet = self.config.roster_sheet.as_str();
        let table = self.read_sheet(sheet).await?;
        parse_roster(sheet, &table)
    }

    async fn read_registrations(&self) -> Result<Vec<Registration>, StoreError> {
        let sheet = self.config.registrations_sheet.as_str();
        let table = self.read_sheet(sheet).await?;
        parse_registrations(sheet, &table)
    }

    /// Native append: the row lands after the last data row of the sheet, in
    /// `nome_participante, nome_ies, oficina_dia1, oficina_dia2` column order.
    async fn append_registration(&self, registration: &Registration) -> Result<(), StoreError> {
        let sheet = self.config.registrations_sheet.as_str();
        let range = format!("{}:append", sheet);
        let url = self.values_url(&range).map_err(StoreError::Write)?;
        let headers = self.headers().map_err(StoreError::Write)?;

        let body = serde_json::json!({
            "values": [[
                registration.participant_name,
                registration.institution_name,
                registration.workshop_day1,
                registration.workshop_day2,
            ]]
        });

        let resp = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(sheet, error = %e, "sheets upstream unreachable");
                StoreError::Write(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(sheet, %status, "sheets upstream non-OK on append");
            return Err(StoreError::Write(format!("{}: {}", status, body)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    type Sheets = Arc<Mutex<HashMap<String, Vec<Vec<Value>>>>>;

    fn table(values: Value) -> SheetTable {
        let values: Vec<Vec<Value>> = serde_json::from_value(values).unwrap();
        SheetTable::from_values(values)
    }

    #[test]
    fn roster_columns_are_matched_by_name_and_alias() {
        let t = table(json!([
            ["no_pessoa_fisica", "co_ies", "no_ies"],
            ["Ana", 10, "UFMG"],
            ["Bruno", "20.0", "UNB"],
            ["Carla", "abc", "UFPE"],
            ["", 30, "IFSP"]
        ]));
        let roster = parse_roster("roster", &t).unwrap();
        assert_eq!(
            roster,
            vec![
                RosterEntry::new(10, "UFMG", "Ana"),
                RosterEntry::new(20, "UNB", "Bruno"),
            ]
        );
    }

    #[test]
    fn short_rows_read_missing_cells_as_empty() {
        let t = table(json!([
            ["nome_participante", "nome_ies", "oficina_dia1", "oficina_dia2"],
            ["Ana", "UFMG", "BI"],
            [],
            ["Bruno", "UNB", "CENSOFIX", "BI"]
        ]));
        let rows = parse_registrations("inscricoes", &t).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].workshop_day2, "");
        assert_eq!(rows[1].workshop_day1, "CENSOFIX");
    }

    #[test]
    fn missing_column_is_a_read_error() {
        let t = table(json!([["nome_participante", "nome_ies", "oficina_dia1"]]));
        let err = parse_registrations("inscricoes", &t).unwrap_err();
        assert!(matches!(err, StoreError::Read(msg) if msg.contains("oficina_dia2")));
    }

    #[test]
    fn empty_sheet_has_no_rows() {
        assert!(parse_registrations("inscricoes", &SheetTable::default())
            .unwrap()
            .is_empty());
    }

    async fn values_handler(
        State(sheets): State<Sheets>,
        Path((_id, range)): Path<(String, String)>,
        headers: AxumHeaders,
    ) -> Result<Json<Value>, StatusCode> {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer t0ken") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let sheets = sheets.lock().unwrap();
        let values = sheets.get(&range).cloned().ok_or(StatusCode::NOT_FOUND)?;
        Ok(Json(json!({ "range": range, "values": values })))
    }

    async fn append_handler(
        State(sheets): State<Sheets>,
        Path((_id, range)): Path<(String, String)>,
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, StatusCode> {
        let sheet = range
            .strip_suffix(":append")
            .ok_or(StatusCode::BAD_REQUEST)?
            .to_string();
        let rows: Vec<Vec<Value>> =
            serde_json::from_value(body["values"].clone()).map_err(|_| StatusCode::BAD_REQUEST)?;
        let mut sheets = sheets.lock().unwrap();
        let target = sheets.get_mut(&sheet).ok_or(StatusCode::NOT_FOUND)?;
        target.extend(rows);
        Ok(Json(json!({ "updates": { "updatedRows": 1 } })))
    }

    async fn spawn_sheets_server(sheets: Sheets) -> String {
        let app = Router::new()
            .route(
                "/v4/spreadsheets/:id/values/:range",
                get(values_handler).post(append_handler),
            )
            .with_state(sheets);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn config(api_url: String, token: &str) -> SheetsConfig {
        SheetsConfig {
            api_url,
            spreadsheet_id: "sheet-1".to_string(),
            api_token: Some(token.to_string()),
            roster_sheet: "roster".to_string(),
            registrations_sheet: "inscricoes".to_string(),
        }
    }

    fn seeded() -> Sheets {
        let mut sheets = HashMap::new();
        sheets.insert(
            "roster".to_string(),
            vec![
                vec![json!("co_ies"), json!("no_ies"), json!("no_pessoa_fisica")],
                vec![json!(10), json!("UFMG"), json!("Ana")],
            ],
        );
        sheets.insert(
            "inscricoes".to_string(),
            vec![vec![
                json!("nome_participante"),
                json!("nome_ies"),
                json!("oficina_dia1"),
                json!("oficina_dia2"),
            ]],
        );
        Arc::new(Mutex::new(sheets))
    }

    #[tokio::test]
    async fn appended_registration_is_read_back() {
        let sheets = seeded();
        let base = spawn_sheets_server(sheets.clone()).await;
        let store = SheetsTableStore::new(config(base, "t0ken"));

        assert_eq!(
            store.read_roster().await.unwrap(),
            vec![RosterEntry::new(10, "UFMG", "Ana")]
        );
        assert!(store.read_registrations().await.unwrap().is_empty());

        let reg = Registration {
            participant_name: "Ana".to_string(),
            institution_name: "UFMG".to_string(),
            workshop_day1: "BI".to_string(),
            workshop_day2: "CENSOFIX".to_string(),
        };
        store.append_registration(&reg).await.unwrap();

        assert_eq!(store.read_registrations().await.unwrap(), vec![reg]);
        assert_eq!(sheets.lock().unwrap()["inscricoes"].len(), 2);
    }

    #[tokio::test]
    async fn upstream_errors_map_to_store_errors() {
        let base = spawn_sheets_server(seeded()).await;
        let store = SheetsTableStore::new(config(base, "wrong"));

        assert!(matches!(
            store.read_registrations().await,
            Err(StoreError::Read(msg)) if msg.starts_with("401")
        ));
        let reg = Registration {
            participant_name: "Ana".to_string(),
            institution_name: "UFMG".to_string(),
            workshop_day1: "BI".to_string(),
            workshop_day2: "CENSOFIX".to_string(),
        };
        // The fake only checks the token on reads; a missing sheet fails the append.
        let mut missing = config(store.config.api_url.clone(), "wrong");
        missing.registrations_sheet = "nope".to_string();
        let store = SheetsTableStore::new(missing);
        assert!(matches!(
            store.append_registration(&reg).await,
            Err(StoreError::Write(_))
        ));
    }
}
