// Roster rows come from the institution census export.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RosterEntry {
    #[sqlx(rename = "co_ies")]
    pub institution_code: i64,
    #[sqlx(rename = "no_ies")]
    pub institution_name: String,
    #[sqlx(rename = "no_pessoa_fisica")]
    pub participant_name: String,
}

impl RosterEntry {
    pub fn new(
        institution_code: i64,
        institution_name: impl Into<String>,
        participant_name: impl Into<String>,
    ) -> Self {
        Self {
            institution_code,
            institution_name: institution_name.into(),
            participant_name: participant_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Institution {
    pub code: i64,
    pub name: String,
}
