use serde::{Deserialize, Serialize};

/// Event day. Each participant picks one workshop per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Day {
    One,
    Two,
}

impl Day {
    pub fn number(self) -> u8 {
        match self {
            Day::One => 1,
            Day::Two => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Day> {
        match n {
            1 => Some(Day::One),
            2 => Some(Day::Two),
            _ => None,
        }
    }

    /// Registrations column holding this day's workshop.
    pub fn column(self) -> &'static str {
        match self {
            Day::One => "oficina_dia1",
            Day::Two => "oficina_dia2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workshop {
    pub name: String,
    pub capacity: u32,
}

impl Workshop {
    pub fn new(name: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            capacity,
        }
    }
}

/// Seats per workshop, per day. Order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkshopCatalog {
    day1: Vec<Workshop>,
    day2: Vec<Workshop>,
}

const EVENT_WORKSHOPS: &[(&str, u32)] = &[("BI", 45), ("CENSOFIX", 30), ("RELATÓRIOS", 100)];

impl Default for WorkshopCatalog {
    fn default() -> Self {
        let workshops = || {
            EVENT_WORKSHOPS
                .iter()
                .map(|(name, capacity)| Workshop::new(*name, *capacity))
                .collect::<Vec<_>>()
        };
        Self::new(workshops(), workshops())
    }
}

impl WorkshopCatalog {
    pub fn new(day1: Vec<Workshop>, day2: Vec<Workshop>) -> Self {
        Self { day1, day2 }
    }

    pub fn workshops(&self, day: Day) -> &[Workshop] {
        match day {
            Day::One => &self.day1,
            Day::Two => &self.day2,
        }
    }

    pub fn capacity(&self, day: Day, name: &str) -> Option<u32> {
        self.workshops(day)
            .iter()
            .find(|w| w.name == name)
            .map(|w| w.capacity)
    }

    pub fn contains(&self, day: Day, name: &str) -> bool {
        self.capacity(day, name).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkshopAvailability {
    pub name: String,
    pub capacity: u32,
    pub remaining: u32,
}

impl WorkshopAvailability {
    pub fn label(&self) -> String {
        format!("{} ({} vagas)", self.name, self.remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_offers_the_same_workshops_on_both_days() {
        let catalog = WorkshopCatalog::default();
        assert_eq!(catalog.capacity(Day::One, "BI"), Some(45));
        assert_eq!(catalog.capacity(Day::Two, "CENSOFIX"), Some(30));
        assert_eq!(catalog.capacity(Day::Two, "RELATÓRIOS"), Some(100));
        assert!(!catalog.contains(Day::One, "bi"));
        let names: Vec<_> = catalog
            .workshops(Day::One)
            .iter()
            .map(|w| w.name.as_str())
            .collect();
        assert_eq!(names, vec!["BI", "CENSOFIX", "RELATÓRIOS"]);
    }

    #[test]
    fn day_numbers_round_trip_and_reject_others() {
        assert_eq!(Day::from_number(1), Some(Day::One));
        assert_eq!(Day::from_number(2).map(Day::number), Some(2));
        assert_eq!(Day::from_number(3), None);
        assert_eq!(Day::Two.column(), "oficina_dia2");
    }

    #[test]
    fn availability_label_shows_remaining_seats() {
        let a = WorkshopAvailability {
            name: "BI".to_string(),
            capacity: 45,
            remaining: 12,
        };
        assert_eq!(a.label(), "BI (12 vagas)");
    }
}
