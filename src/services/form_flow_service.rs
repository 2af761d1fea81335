use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::TableStore;
use crate::error::RegistrationError;
use crate::models::{Day, Registration, WorkshopAvailability, WorkshopCatalog};
use crate::services::registration_service::{self, NewRegistration};
use crate::services::registrations_cache::RegistrationsCache;
use crate::services::{availability_service, roster_service};

pub const PLACEHOLDER_SELECT_WORKSHOP: &str = "Selecione uma oficina...";
pub const PLACEHOLDER_NO_SEATS: &str = "Não há vagas disponíveis";
const PLACEHOLDER_SELECT_INSTITUTION: &str = "Selecione a instituição...";
const PLACEHOLDER_SELECT_PARTICIPANT: &str = "Selecione o participante...";

const MSG_INVALID_WORKSHOPS: &str = "Por favor, selecione oficinas válidas nos dois dias!";

pub struct FlowContext<'a> {
    pub store: &'a dyn TableStore,
    pub cache: &'a RegistrationsCache,
    pub catalog: &'a WorkshopCatalog,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    SelectInstitution,
    SelectParticipant,
    SelectDay1Workshop,
    SelectDay2Workshop,
    AlreadyRegistered,
    Completed,
}

impl Step {
    pub fn key(self) -> &'static str {
        match self {
            Step::SelectInstitution => "select_institution",
            Step::SelectParticipant => "select_participant",
            Step::SelectDay1Workshop => "select_day1_workshop",
            Step::SelectDay2Workshop => "select_day2_workshop",
            Step::AlreadyRegistered => "already_registered",
            Step::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Step::AlreadyRegistered | Step::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.kind {
            NoticeKind::Success => "notice-success",
            NoticeKind::Error => "notice-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionChoice {
    pub code: i64,
    pub name: String,
}

/// Everything the form has collected so far. Travels with the request; the
/// server keeps no session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    #[serde(default)]
    pub step: Step,
    #[serde(default)]
    pub institution: Option<InstitutionChoice>,
    #[serde(default)]
    pub participant: Option<String>,
    #[serde(default)]
    pub workshop_day1: Option<String>,
    /// Existing row on `AlreadyRegistered`, the new row on `Completed`.
    #[serde(default)]
    pub registration: Option<Registration>,
    #[serde(default)]
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    ChooseInstitution(String),
    ChooseParticipant(String),
    ConfirmDay1(String),
    Submit(String),
    Restart,
}

impl FlowAction {
    pub fn from_form(action: &str, value: Option<String>) -> Option<FlowAction> {
        let value = value.unwrap_or_default();
        match action.trim() {
            "institution" => Some(FlowAction::ChooseInstitution(value)),
            "participant" => Some(FlowAction::ChooseParticipant(value)),
            "confirm_day1" => Some(FlowAction::ConfirmDay1(value)),
            "submit" => Some(FlowAction::Submit(value)),
            "restart" => Some(FlowAction::Restart),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FlowAction::ChooseInstitution(_) => "institution",
            FlowAction::ChooseParticipant(_) => "participant",
            FlowAction::ConfirmDay1(_) => "confirm_day1",
            FlowAction::Submit(_) => "submit",
            FlowAction::Restart => "restart",
        }
    }
}

/// Turns a submitted workshop option into a catalog name.
///
/// Placeholders are never a choice. Display labels such as `"BI (12 vagas)"`
/// are accepted and reduced to `"BI"`.
pub fn parse_workshop_choice(raw: &str) -> Result<String, RegistrationError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == PLACEHOLDER_SELECT_WORKSHOP || raw == PLACEHOLDER_NO_SEATS {
        return Err(RegistrationError::invalid(MSG_INVALID_WORKSHOPS));
    }
    Ok(strip_seats_suffix(raw).to_string())
}

fn strip_seats_suffix(label: &str) -> &str {
    let Some((name, rest)) = label.rsplit_once(" (") else {
        return label;
    };
    let is_seats = rest
        .strip_suffix(" vagas)")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
    if is_seats {
        name.trim_end()
    } else {
        label
    }
}

pub async fn apply(ctx: &FlowContext<'_>, state: FlowState, action: FlowAction) -> FlowState {
    let mut state = FlowState {
        notice: None,
        ..state
    };

    if action == FlowAction::Restart {
        return FlowState::default();
    }

    let action_name = action.name();
    let outcome = if state.step.is_terminal() {
        Err(RegistrationError::invalid(
            "Esta inscrição já foi concluída. Reinicie o formulário para continuar.",
        ))
    } else {
        match action {
            FlowAction::ChooseInstitution(raw) => choose_institution(ctx, &mut state, &raw).await,
            FlowAction::ChooseParticipant(raw) => choose_participant(ctx, &mut state, &raw).await,
            FlowAction::ConfirmDay1(raw) => confirm_day1(ctx, &mut state, &raw).await,
            FlowAction::Submit(raw) => submit(ctx, &mut state, &raw).await,
            FlowAction::Restart => Ok(()),
        }
    };

    if let Err(e) = outcome {
        info!(action = action_name, step = state.step.key(), error = %e, "form action rejected");
        state.notice = Some(Notice::error(e.user_message()));
    }
    state
}

async fn choose_institution(
    ctx: &FlowContext<'_>,
    state: &mut FlowState,
    raw: &str,
) -> Result<(), RegistrationError> {
    let code = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| RegistrationError::invalid("Por favor, selecione a instituição."))?;
    let institution = roster_service::find_institution(ctx.store, code)
        .await?
        .ok_or_else(|| RegistrationError::invalid("Instituição não encontrada."))?;

    *state = FlowState {
        step: Step::SelectParticipant,
        institution: Some(InstitutionChoice {
            code: institution.code,
            name: institution.name,
        }),
        ..FlowState::default()
    };
    Ok(())
}

async fn choose_participant(
    ctx: &FlowContext<'_>,
    state: &mut FlowState,
    raw: &str,
) -> Result<(), RegistrationError> {
    let Some(institution) = state.institution.as_ref() else {
        return Err(RegistrationError::invalid(
            "Por favor, selecione primeiro a instituição.",
        ));
    };
    let name = raw.trim();
    if name.is_empty() {
        return Err(RegistrationError::invalid(
            "Por favor, selecione o participante.",
        ));
    }
    if !roster_service::is_on_roster(ctx.store, institution.code, name).await? {
        return Err(RegistrationError::invalid(
            "Participante não encontrado nesta instituição.",
        ));
    }

    let existing = registration_service::find_registration(ctx.cache, name).await?;
    state.participant = Some(name.to_string());
    state.workshop_day1 = None;
    match existing {
        Some(registration) => {
            state.step = Step::AlreadyRegistered;
            state.registration = Some(registration);
        }
        None => {
            state.step = Step::SelectDay1Workshop;
            state.registration = None;
        }
    }
    Ok(())
}

async fn confirm_day1(
    ctx: &FlowContext<'_>,
    state: &mut FlowState,
    raw: &str,
) -> Result<(), RegistrationError> {
    if !matches!(
        state.step,
        Step::SelectDay1Workshop | Step::SelectDay2Workshop
    ) {
        return Err(RegistrationError::invalid(
            "Por favor, selecione primeiro o participante.",
        ));
    }
    let name = parse_workshop_choice(raw)?;
    let available =
        availability_service::remaining(ctx.catalog, ctx.cache, Day::One, None).await?;
    if !available.iter().any(|w| w.name == name) {
        return Err(RegistrationError::invalid(format!(
            "A oficina {} não tem mais vagas para o primeiro dia.",
            name
        )));
    }

    state.workshop_day1 = Some(name);
    state.step = Step::SelectDay2Workshop;
    Ok(())
}

async fn submit(
    ctx: &FlowContext<'_>,
    state: &mut FlowState,
    raw: &str,
) -> Result<(), RegistrationError> {
    let (Step::SelectDay2Workshop, Some(institution), Some(participant), Some(day1)) = (
        state.step,
        state.institution.as_ref(),
        state.participant.as_deref(),
        state.workshop_day1.as_deref(),
    ) else {
        return Err(RegistrationError::invalid(
            "Salve a oficina do primeiro dia antes de enviar a inscrição.",
        ));
    };

    let day2 = parse_workshop_choice(raw)?;
    if day2 == day1 {
        return Err(RegistrationError::invalid(
            "Escolha oficinas diferentes para cada dia.",
        ));
    }
    if !roster_service::is_on_roster(ctx.store, institution.code, participant).await? {
        return Err(RegistrationError::invalid(
            "Participante não encontrado nesta instituição.",
        ));
    }

    let result = registration_service::register(
        ctx.store,
        ctx.cache,
        ctx.catalog,
        NewRegistration {
            participant_name: participant,
            institution_name: &institution.name,
            workshop_day1: day1,
            workshop_day2: &day2,
        },
    )
    .await;

    match result {
        Ok(registration) => {
            *state = FlowState {
                step: Step::Completed,
                registration: Some(registration),
                notice: Some(Notice::success("Inscrição realizada com sucesso!")),
                ..FlowState::default()
            };
            Ok(())
        }
        Err(e) => {
            match &e {
                RegistrationError::CapacityExceeded { day: Day::One, .. } => {
                    state.workshop_day1 = None;
                    state.step = Step::SelectDay1Workshop;
                }
                RegistrationError::DuplicateRegistration { .. } => {
                    state.participant = None;
                    state.workshop_day1 = None;
                    state.step = Step::SelectParticipant;
                }
                _ => {}
            }
            Err(e)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    fn placeholder(label: &str) -> Self {
        Self {
            value: String::new(),
            label: label.to_string(),
            selected: false,
        }
    }
}

/// What the form template needs to draw the current step.
#[derive(Debug, Clone, Default)]
pub struct FormView {
    pub step: &'static str,
    pub show_institution: bool,
    pub show_participant: bool,
    pub show_day1: bool,
    pub show_day2: bool,
    pub institution_options: Vec<SelectOption>,
    pub participant_options: Vec<SelectOption>,
    pub day1_options: Vec<SelectOption>,
    pub day2_options: Vec<SelectOption>,
    pub day1_full: bool,
    pub day2_full: bool,
    pub institution_label: String,
    pub participant_label: String,
    pub workshop_day1: Option<String>,
    pub registration: Option<Registration>,
    pub notice: Option<Notice>,
    pub errors: Vec<String>,
}

pub async fn build_view(ctx: &FlowContext<'_>, state: &FlowState) -> FormView {
    let step = state.step;
    let mut view = FormView {
        step: step.key(),
        show_institution: !step.is_terminal(),
        show_participant: !step.is_terminal() && step != Step::SelectInstitution,
        show_day1: matches!(step, Step::SelectDay1Workshop | Step::SelectDay2Workshop),
        show_day2: step == Step::SelectDay2Workshop,
        institution_label: state
            .institution
            .as_ref()
            .map(|i| i.name.clone())
            .unwrap_or_default(),
        participant_label: state.participant.clone().unwrap_or_default(),
        workshop_day1: state.workshop_day1.clone(),
        registration: state.registration.clone(),
        notice: state.notice.clone(),
        ..FormView::default()
    };

    if view.show_institution {
        match roster_service::institutions(ctx.store).await {
            Ok(list) => {
                let selected = state.institution.as_ref().map(|i| i.code);
                view.institution_options = with_placeholder(
                    PLACEHOLDER_SELECT_INSTITUTION,
                    list.into_iter().map(|i| SelectOption {
                        selected: Some(i.code) == selected,
                        value: i.code.to_string(),
                        label: i.name,
                    }),
                );
            }
            Err(e) => view.errors.push(RegistrationError::from(e).user_message()),
        }
    }

    if let (true, Some(institution)) = (view.show_participant, state.institution.as_ref()) {
        match roster_service::participants(ctx.store, institution.code).await {
            Ok(names) => {
                let selected = state.participant.as_deref();
                view.participant_options = with_placeholder(
                    PLACEHOLDER_SELECT_PARTICIPANT,
                    names.into_iter().map(|name| SelectOption {
                        selected: Some(name.as_str()) == selected,
                        value: name.clone(),
                        label: name,
                    }),
                );
            }
            Err(e) => view.errors.push(RegistrationError::from(e).user_message()),
        }
    }

    if view.show_day1 {
        match availability_service::remaining(ctx.catalog, ctx.cache, Day::One, None).await {
            Ok(list) => {
                view.day1_full = list.is_empty();
                view.day1_options = workshop_options(list, state.workshop_day1.as_deref());
                if view.day1_full {
                    view.errors
                        .push("Não há mais vagas disponíveis para o primeiro dia!".to_string());
                }
            }
            Err(e) => view.errors.push(RegistrationError::from(e).user_message()),
        }
    }

    if view.show_day2 {
        let exclude = state.workshop_day1.as_deref();
        match availability_service::remaining(ctx.catalog, ctx.cache, Day::Two, exclude).await {
            Ok(list) => {
                view.day2_full = list.is_empty();
                view.day2_options = workshop_options(list, None);
                if view.day2_full {
                    view.errors
                        .push("Não há mais vagas disponíveis para o segundo dia!".to_string());
                }
            }
            Err(e) => view.errors.push(RegistrationError::from(e).user_message()),
        }
    }

    view
}

fn with_placeholder(
    placeholder: &str,
    options: impl Iterator<Item = SelectOption>,
) -> Vec<SelectOption> {
    std::iter::once(SelectOption::placeholder(placeholder))
        .chain(options)
        .collect()
}

fn workshop_options(list: Vec<WorkshopAvailability>, selected: Option<&str>) -> Vec<SelectOption> {
    if list.is_empty() {
        return vec![SelectOption::placeholder(PLACEHOLDER_NO_SEATS)];
    }
    with_placeholder(
        PLACEHOLDER_SELECT_WORKSHOP,
        list.into_iter().map(|w| SelectOption {
            selected: Some(w.name.as_str()) == selected,
            label: w.label(),
            value: w.name,
        }),
    )
}
