use std::collections::HashMap;

use crate::error::StoreError;
use crate::models::{Day, Registration, WorkshopAvailability, WorkshopCatalog};
use crate::services::registrations_cache::RegistrationsCache;

/// Workshops of `day` that still have seats, in catalog order.
///
/// Reads through the cache, so the answer can be up to one TTL old.
pub async fn remaining(
    catalog: &WorkshopCatalog,
    cache: &RegistrationsCache,
    day: Day,
    exclude: Option<&str>,
) -> Result<Vec<WorkshopAvailability>, StoreError> {
    let registrations = cache.get().await?;
    Ok(compute_remaining(catalog, &registrations, day, exclude))
}

pub fn count_by_workshop<'a>(registrations: &'a [Registration], day: Day) -> HashMap<&'a str, u32> {
    let mut counts = HashMap::new();
    for r in registrations {
        *counts.entry(r.workshop(day)).or_insert(0) += 1;
    }
    counts
}

/// Seats left for `name` on `day`. `None` when the catalog does not list it.
pub fn seats_left(
    catalog: &WorkshopCatalog,
    registrations: &[Registration],
    day: Day,
    name: &str,
) -> Option<u32> {
    let capacity = catalog.capacity(day, name)?;
    let taken = registrations
        .iter()
        .filter(|r| r.workshop(day) == name)
        .count();
    let taken = u32::try_from(taken).unwrap_or(u32::MAX);
    Some(capacity.saturating_sub(taken))
}

pub fn compute_remaining(
    catalog: &WorkshopCatalog,
    registrations: &[Registration],
    day: Day,
    exclude: Option<&str>,
) -> Vec<WorkshopAvailability> {
    // Names missing from the catalog are counted here and never looked up.
    let counts = count_by_workshop(registrations, day);

    catalog
        .workshops(day)
        .iter()
        .filter(|w| exclude != Some(w.name.as_str()))
        .filter_map(|w| {
            let taken = counts.get(w.name.as_str()).copied().unwrap_or(0);
            let remaining = w.capacity.saturating_sub(taken);
            (remaining > 0).then(|| WorkshopAvailability {
                name: w.name.clone(),
                capacity: w.capacity,
                remaining,
            })
        })
        .collect()
}
