use tracing::{info, warn};

use crate::database::TableStore;
use crate::error::{RegistrationError, StoreError};
use crate::models::{Day, Registration, WorkshopCatalog};
use crate::services::availability_service;
use crate::services::registrations_cache::RegistrationsCache;

#[derive(Debug, Clone)]
pub struct NewRegistration<'a> {
    pub participant_name: &'a str,
    pub institution_name: &'a str,
    pub workshop_day1: &'a str,
    pub workshop_day2: &'a str,
}

pub async fn find_registration(
    cache: &RegistrationsCache,
    participant_name: &str,
) -> Result<Option<Registration>, StoreError> {
    let name = participant_name.trim();
    let registrations = cache.get().await?;
    Ok(registrations
        .iter()
        .find(|r| r.participant_name.trim() == name)
        .cloned())
}

/// Records one registration after a fresh capacity and duplicate check.
///
/// Check-then-act: the check and the append are separate storage calls, so two
/// concurrent callers can both take the last seat of a workshop.
pub async fn register(
    store: &dyn TableStore,
    cache: &RegistrationsCache,
    catalog: &WorkshopCatalog,
    new: NewRegistration<'_>,
) -> Result<Registration, RegistrationError> {
    let candidate = validate(catalog, &new)?;

    cache.invalidate().await;
    let registrations = cache.get().await?;

    for day in [Day::One, Day::Two] {
        let workshop = candidate.workshop(day);
        let left = availability_service::seats_left(catalog, &registrations, day, workshop);
        if left == Some(0) {
            info!(
                participant = %candidate.participant_name,
                day = day.number(),
                workshop,
                "registration rejected: workshop full"
            );
            return Err(RegistrationError::CapacityExceeded {
                day,
                workshop: workshop.to_string(),
            });
        }
    }

    if registrations
        .iter()
        .any(|r| r.participant_name.trim() == candidate.participant_name)
    {
        info!(participant = %candidate.participant_name, "registration rejected: duplicate");
        return Err(RegistrationError::DuplicateRegistration {
            participant: candidate.participant_name,
        });
    }

    if let Err(e) = store.append_registration(&candidate).await {
        warn!(participant = %candidate.participant_name, error = %e, "registration append failed");
        return Err(e.into());
    }
    cache.invalidate().await;

    info!(
        participant = %candidate.participant_name,
        institution = %candidate.institution_name,
        day1 = %candidate.workshop_day1,
        day2 = %candidate.workshop_day2,
        "registration recorded"
    );
    Ok(candidate)
}

fn validate(
    catalog: &WorkshopCatalog,
    new: &NewRegistration<'_>,
) -> Result<Registration, RegistrationError> {
    let participant_name = new.participant_name.trim();
    let institution_name = new.institution_name.trim();
    let day1 = new.workshop_day1.trim();
    let day2 = new.workshop_day2.trim();

    if participant_name.is_empty() {
        return Err(RegistrationError::invalid(
            "Por favor, preencha o nome do participante!",
        ));
    }
    if institution_name.is_empty() {
        return Err(RegistrationError::invalid("Por favor, preencha o nome da IES!"));
    }
    if day1.is_empty() || day2.is_empty() {
        return Err(RegistrationError::invalid(
            "Por favor, selecione oficinas válidas nos dois dias!",
        ));
    }
    if day1 == day2 {
        return Err(RegistrationError::invalid(
            "Escolha oficinas diferentes para cada dia.",
        ));
    }
    for (day, name) in [(Day::One, day1), (Day::Two, day2)] {
        if !catalog.contains(day, name) {
            return Err(RegistrationError::invalid(format!(
                "A oficina {} não é oferecida no dia {}.",
                name,
                day.number()
            )));
        }
    }

    Ok(Registration {
        participant_name: participant_name.to_string(),
        institution_name: institution_name.to_string(),
        workshop_day1: day1.to_string(),
        workshop_day2: day2.to_string(),
    })
}
