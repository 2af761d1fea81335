use serde::{Deserialize, Serialize};

use super::Day;

/// One row of the registrations table. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
    #[sqlx(rename = "nome_participante")]
    pub participant_name: String,
    #[sqlx(rename = "nome_ies")]
    pub institution_name: String,
    #[sqlx(rename = "oficina_dia1")]
    pub workshop_day1: String,
    #[sqlx(rename = "oficina_dia2")]
    pub workshop_day2: String,
}

impl Registration {
    pub fn workshop(&self, day: Day) -> &str {
        match day {
            Day::One => &self.workshop_day1,
            Day::Two => &self.workshop_day2,
        }
    }
}
