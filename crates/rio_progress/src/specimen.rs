//! Specimen collection and guidebook

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecimenCategory {
    Plant,
    Animal,
    Mineral,
    Artifact,
}

impl SpecimenCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SpecimenCategory::Plant => "plant",
            SpecimenCategory::Animal => "animal",
            SpecimenCategory::Mineral => "mineral",
            SpecimenCategory::Artifact => "artifact",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specimen {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    pub category: SpecimenCategory,
    pub rarity: Rarity,
    #[serde(default)]
    pub description: String,
    /// Sprite id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub value: u32,
    /// Where it was first found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_at: Option<String>,
    /// Unix seconds of first discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_time: Option<u64>,
}

impl Specimen {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: SpecimenCategory,
        rarity: Rarity,
        value: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            scientific_name: None,
            category,
            rarity,
            description: String::new(),
            image: None,
            value,
            discovered_at: None,
            discovered_time: None,
        }
    }

    pub fn is_discovered(&self) -> bool {
        self.discovered_time.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuidebookCategory {
    Flora,
    Fauna,
    Culture,
    History,
    Geography,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidebookEntry {
    pub id: String,
    pub title: String,
    pub category: GuidebookCategory,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Discovering any of these unlocks the entry
    #[serde(default)]
    pub related_specimens: Vec<String>,
}

impl GuidebookEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>, category: GuidebookCategory) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category,
            content: String::new(),
            images: Vec::new(),
            related_specimens: Vec::new(),
        }
    }

    pub fn related_to(mut self, specimen_id: impl Into<String>) -> Self {
        self.related_specimens.push(specimen_id.into());
        self
    }
}

/// Result of a discovery attempt
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub specimen: Specimen,
    /// False when it was already in the collection
    pub newly_discovered: bool,
    /// Guidebook entries this discovery unlocked
    pub unlocked_entries: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpecimenStats {
    pub total_specimens: usize,
    pub discovered_specimens: usize,
    pub total_entries: usize,
    pub unlocked_entries: usize,
    pub collection_value: u32,
    pub completion_percent: f32,
}

/// Specimen collection plus the guidebook it unlocks
#[derive(Debug, Default)]
pub struct SpecimenManager {
    specimens: BTreeMap<String, Specimen>,
    /// Discovery order
    discovered: Vec<String>,
    guidebook: BTreeMap<String, GuidebookEntry>,
    unlocked: BTreeSet<String>,
}

impl SpecimenManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_specimen(&mut self, mut specimen: Specimen) {
        specimen.discovered_at = None;
        specimen.discovered_time = None;
        log::debug!("Registered specimen: {}", specimen.id);
        self.specimens.insert(specimen.id.clone(), specimen);
    }

    pub fn register_specimens(&mut self, specimens: impl IntoIterator<Item = Specimen>) {
        specimens.into_iter().for_each(|s| self.register_specimen(s));
    }

    /// Record a discovery. Repeat discoveries change nothing and still
    /// return the specimen; unknown ids return `None`.
    pub fn discover_specimen(&mut self, specimen_id: &str, location: Option<&str>) -> Option<Discovery> {
        let Some(specimen) = self.specimens.get_mut(specimen_id) else {
            log::warn!("Specimen not found: {}", specimen_id);
            return None;
        };

        if specimen.is_discovered() {
            return Some(Discovery {
                specimen: specimen.clone(),
                newly_discovered: false,
                unlocked_entries: Vec::new(),
            });
        }

        specimen.discovered_at = location.map(str::to_string);
        specimen.discovered_time = Some(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        );
        let specimen = specimen.clone();
        self.discovered.push(specimen_id.to_string());
        log::info!("Discovered specimen: {}", specimen.name);

        let related: Vec<String> = self
            .guidebook
            .values()
            .filter(|e| e.related_specimens.iter().any(|s| s == specimen_id))
            .map(|e| e.id.clone())
            .collect();
        let unlocked_entries = related.into_iter().filter(|id| self.unlock_entry(id)).collect();

        Some(Discovery {
            specimen,
            newly_discovered: true,
            unlocked_entries,
        })
    }

    pub fn specimen(&self, specimen_id: &str) -> Option<&Specimen> {
        self.specimens.get(specimen_id)
    }

    pub fn specimens(&self) -> impl Iterator<Item = &Specimen> {
        self.specimens.values()
    }

    /// Discovered specimens, in discovery order
    pub fn discovered_specimens(&self) -> impl Iterator<Item = &Specimen> {
        self.discovered.iter().filter_map(|id| self.specimens.get(id))
    }

    /// Ids not yet discovered, in id order
    pub fn undiscovered_ids(&self) -> Vec<&str> {
        self.specimens
            .values()
            .filter(|s| !s.is_discovered())
            .map(|s| s.id.as_str())
            .collect()
    }

    pub fn by_category(&self, category: SpecimenCategory) -> Vec<&Specimen> {
        self.specimens.values().filter(|s| s.category == category).collect()
    }

    pub fn by_rarity(&self, rarity: Rarity) -> Vec<&Specimen> {
        self.specimens.values().filter(|s| s.rarity == rarity).collect()
    }

    pub fn is_discovered(&self, specimen_id: &str) -> bool {
        self.specimens.get(specimen_id).is_some_and(Specimen::is_discovered)
    }

    /// Summed value of discovered specimens
    pub fn total_value(&self) -> u32 {
        self.discovered_specimens().map(|s| s.value).sum()
    }

    pub fn completion_percent(&self) -> f32 {
        if self.specimens.is_empty() {
            return 0.0;
        }
        self.discovered.len() as f32 / self.specimens.len() as f32 * 100.0
    }

    // ==================== Guidebook ====================

    pub fn register_entry(&mut self, entry: GuidebookEntry) {
        log::debug!("Registered guidebook entry: {}", entry.id);
        self.guidebook.insert(entry.id.clone(), entry);
    }

    pub fn register_entries(&mut self, entries: impl IntoIterator<Item = GuidebookEntry>) {
        entries.into_iter().for_each(|e| self.register_entry(e));
    }

    /// Unlock an entry. Returns false if unknown or already unlocked.
    pub fn unlock_entry(&mut self, entry_id: &str) -> bool {
        let Some(entry) = self.guidebook.get(entry_id) else {
            log::warn!("Guidebook entry not found: {}", entry_id);
            return false;
        };
        if !self.unlocked.insert(entry_id.to_string()) {
            return false;
        }
        log::info!("Unlocked guidebook entry: {}", entry.title);
        true
    }

    pub fn entry(&self, entry_id: &str) -> Option<&GuidebookEntry> {
        self.guidebook.get(entry_id)
    }

    pub fn is_entry_unlocked(&self, entry_id: &str) -> bool {
        self.unlocked.contains(entry_id)
    }

    pub fn unlocked_entries(&self) -> impl Iterator<Item = &GuidebookEntry> {
        self.unlocked.iter().filter_map(|id| self.guidebook.get(id))
    }

    /// Unlocked entries of one category
    pub fn entries_by_category(&self, category: GuidebookCategory) -> Vec<&GuidebookEntry> {
        self.unlocked_entries().filter(|e| e.category == category).collect()
    }

    pub fn stats(&self) -> SpecimenStats {
        SpecimenStats {
            total_specimens: self.specimens.len(),
            discovered_specimens: self.discovered.len(),
            total_entries: self.guidebook.len(),
            unlocked_entries: self.unlocked.len(),
            collection_value: self.total_value(),
            completion_percent: self.completion_percent(),
        }
    }

    /// Forget discoveries and unlocks; registrations stay.
    pub fn reset(&mut self) {
        for specimen in self.specimens.values_mut() {
            specimen.discovered_at = None;
            specimen.discovered_time = None;
        }
        self.discovered.clear();
        self.unlocked.clear();
        log::debug!("Specimen state reset");
    }
}
