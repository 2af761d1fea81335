use crate::models::Day;

/// Failure talking to the table backend. Carries the backend's own message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("storage read failed: {0}")]
    Read(String),
    #[error("storage write failed: {0}")]
    Write(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("workshop {workshop} is full on day {}", day.number())]
    CapacityExceeded { day: Day, workshop: String },
    #[error("{participant} is already registered")]
    DuplicateRegistration { participant: String },
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}

impl RegistrationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RegistrationError::InvalidSelection(message.into())
    }

    /// Message shown on the form.
    pub fn user_message(&self) -> String {
        match self {
            RegistrationError::Storage(StoreError::Read(detail)) => {
                format!("Erro ao ler os dados das inscrições: {}", detail)
            }
            RegistrationError::Storage(StoreError::Write(detail)) => {
                format!("Erro ao adicionar inscrição: {}", detail)
            }
            RegistrationError::CapacityExceeded { day, workshop } => format!(
                "Desculpe, as vagas de {} no dia {} acabaram de ser preenchidas. Por favor, tente outras opções.",
                workshop,
                day.number()
            ),
            RegistrationError::DuplicateRegistration { participant } => {
                format!("{} já possui inscrição.", participant)
            }
            RegistrationError::InvalidSelection(message) => message.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}
