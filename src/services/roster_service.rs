use std::collections::BTreeMap;

use crate::database::TableStore;
use crate::error::StoreError;
use crate::models::{Institution, RosterEntry};

/// Institutions on the roster, one per code, sorted by name.
pub async fn institutions(store: &dyn TableStore) -> Result<Vec<Institution>, StoreError> {
    let roster = store.read_roster().await?;
    Ok(group_institutions(&roster))
}

pub async fn find_institution(
    store: &dyn TableStore,
    code: i64,
) -> Result<Option<Institution>, StoreError> {
    Ok(institutions(store).await?.into_iter().find(|i| i.code == code))
}

pub async fn participants(store: &dyn TableStore, code: i64) -> Result<Vec<String>, StoreError> {
    let roster = store.read_roster().await?;
    Ok(participants_of(&roster, code))
}

pub async fn is_on_roster(
    store: &dyn TableStore,
    code: i64,
    participant_name: &str,
) -> Result<bool, StoreError> {
    let name = participant_name.trim();
    Ok(store
        .read_roster()
        .await?
        .iter()
        .any(|e| e.institution_code == code && e.participant_name.trim() == name))
}

fn group_institutions(roster: &[RosterEntry]) -> Vec<Institution> {
    // First name seen for a code wins.
    let mut by_code: BTreeMap<i64, String> = BTreeMap::new();
    for entry in roster {
        by_code
            .entry(entry.institution_code)
            .or_insert_with(|| entry.institution_name.trim().to_string());
    }

    let mut institutions: Vec<Institution> = by_code
        .into_iter()
        .map(|(code, name)| Institution { code, name })
        .collect();
    institutions.sort_by(|a, b| a.name.cmp(&b.name).then(a.code.cmp(&b.code)));
    institutions
}

fn participants_of(roster: &[RosterEntry], code: i64) -> Vec<String> {
    let mut names: Vec<String> = roster
        .iter()
        .filter(|e| e.institution_code == code)
        .map(|e| e.participant_name.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryTableStore;

    fn store() -> MemoryTableStore {
        MemoryTableStore::new(
            vec![
                RosterEntry::new(20, "UNB", "Davi"),
                RosterEntry::new(10, "UFMG", "Carla"),
                RosterEntry::new(10, "UFMG", "Ana"),
                RosterEntry::new(10, "UFMG ", "Ana"),
                RosterEntry::new(30, "IFSP", "Bruno"),
            ],
            vec![],
        )
    }

    #[tokio::test]
    async fn institutions_are_unique_and_sorted_by_name() {
        let list = institutions(&store()).await.unwrap();
        let names: Vec<_> = list.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["IFSP", "UFMG", "UNB"]);
        assert_eq!(list[1].code, 10);
    }

    #[tokio::test]
    async fn participants_are_scoped_to_the_institution() {
        let store = store();
        assert_eq!(participants(&store, 10).await.unwrap(), vec!["Ana", "Carla"]);
        assert!(participants(&store, 99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn roster_membership_checks_code_and_name() {
        let store = store();
        assert!(is_on_roster(&store, 20, "Davi").await.unwrap());
        assert!(!is_on_roster(&store, 10, "Davi").await.unwrap());
        assert_eq!(
            find_institution(&store, 30).await.unwrap().map(|i| i.name),
            Some("IFSP".to_string())
        );
    }
}
