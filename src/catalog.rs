//! In-memory catalog store: owns the collection and produces filtered views.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::{ClassStats, Mech, Source, WeightClass};

/// Whether an upsert appended a record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// Class filter from the UI; `all` is the pass-through sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassFilter {
    #[default]
    All,
    Only(WeightClass),
}

impl FromStr for ClassFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(ClassFilter::All)
        } else {
            s.parse().map(ClassFilter::Only)
        }
    }
}

impl fmt::Display for ClassFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassFilter::All => f.write_str("all"),
            ClassFilter::Only(class) => write!(f, "{}", class),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    pub search: String,
    pub class: ClassFilter,
}

/// Columns the table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Name,
    WeightClass,
    Tonnage,
    Cost,
    Energy,
    Ballistic,
    Missile,
    Support,
    Total,
}

impl SortField {
    pub const ALL: [SortField; 9] = [
        SortField::Name,
        SortField::WeightClass,
        SortField::Tonnage,
        SortField::Cost,
        SortField::Energy,
        SortField::Ballistic,
        SortField::Missile,
        SortField::Support,
        SortField::Total,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::WeightClass => "weightClass",
            SortField::Tonnage => "tonnage",
            SortField::Cost => "cost",
            SortField::Energy => "energy",
            SortField::Ballistic => "ballistic",
            SortField::Missile => "missile",
            SortField::Support => "support",
            SortField::Total => "total",
        }
    }

    fn compare(&self, a: &Mech, b: &Mech) -> Ordering {
        match self {
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::WeightClass => a
                .weight_class
                .as_str()
                .to_lowercase()
                .cmp(&b.weight_class.as_str().to_lowercase()),
            SortField::Tonnage => a.tonnage.cmp(&b.tonnage),
            SortField::Cost => a.cost.cmp(&b.cost),
            SortField::Energy => a.hardpoints().energy.cmp(&b.hardpoints().energy),
            SortField::Ballistic => a.hardpoints().ballistic.cmp(&b.hardpoints().ballistic),
            SortField::Missile => a.hardpoints().missile.cmp(&b.hardpoints().missile),
            SortField::Support => a.hardpoints().support.cmp(&b.hardpoints().support),
            SortField::Total => a.total().cmp(&b.total()),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sort field: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    /// Order after clicking the header of `field`: the active column flips,
    /// any other column starts ascending.
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                field,
                direction: SortDirection::Asc,
            }
        }
    }
}

/// The canonical collection, in insertion order.
#[derive(Debug, Default)]
pub struct Catalog {
    mechs: Vec<Mech>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mechs(&self) -> &[Mech] {
        &self.mechs
    }

    pub fn len(&self) -> usize {
        self.mechs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mechs.is_empty()
    }

    /// Replaces the whole collection.
    pub fn load_bulk(&mut self, records: Vec<Mech>) {
        self.mechs = records;
    }

    /// Inserts `record`, replacing in place any record with the same
    /// non-empty chassis id.
    pub fn upsert(&mut self, record: Mech) -> UpsertOutcome {
        let existing = if record.chassis_id.is_empty() {
            None
        } else {
            self.mechs
                .iter()
                .position(|m| m.chassis_id == record.chassis_id)
        };

        match existing {
            Some(index) => {
                self.mechs[index] = record;
                UpsertOutcome::Replaced
            }
            None => {
                self.mechs.push(record);
                UpsertOutcome::Inserted
            }
        }
    }

    /// Removes every record whose source matches `predicate`, returning how many went.
    pub fn remove_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(Source) -> bool,
    {
        let before = self.mechs.len();
        self.mechs.retain(|m| !predicate(m.source));
        before - self.mechs.len()
    }

    /// Filters by name substring and class, then stable-sorts.
    pub fn view(&self, filter: &ViewFilter, sort: SortOrder) -> Vec<Mech> {
        let needle = filter.search.to_lowercase();
        let mut visible: Vec<Mech> = self
            .mechs
            .iter()
            .filter(|m| needle.is_empty() || m.name.to_lowercase().contains(&needle))
            .filter(|m| match filter.class {
                ClassFilter::All => true,
                ClassFilter::Only(class) => m.weight_class == class,
            })
            .cloned()
            .collect();

        // `sort_by` is stable; reversing the comparator keeps ties in place.
        visible.sort_by(|a, b| {
            let ordering = sort.field.compare(a, b);
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        visible
    }

    pub fn stats(&self) -> ClassStats {
        stats(&self.mechs)
    }

    /// Records uploaded by users, in collection order.
    pub fn uploaded(&self) -> Vec<Mech> {
        self.mechs
            .iter()
            .filter(|m| m.source == Source::Uploaded)
            .cloned()
            .collect()
    }
}

/// Counts records per weight class.
pub fn stats(records: &[Mech]) -> ClassStats {
    let mut stats = ClassStats {
        total: records.len(),
        ..ClassStats::default()
    };
    for mech in records {
        match mech.weight_class {
            WeightClass::Light => stats.light += 1,
            WeightClass::Medium => stats.medium += 1,
            WeightClass::Heavy => stats.heavy += 1,
            WeightClass::Assault => stats.assault += 1,
        }
    }
    stats
}
