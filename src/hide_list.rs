// Persistent hide list: one CSV value of `company_name,hidden_at` rows
//
// Every write re-reads the stored value first and lands with a compare-and-set
// against exactly what was read. Pages never cache the list.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::ValueStore;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// How many times a write re-reads after losing a race with a sibling page
const MAX_WRITE_ATTEMPTS: usize = 8;

// ============================================================================
// CORE TYPES
// ============================================================================

/// One hidden company. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HideEntry {
    pub company_name: String,

    #[serde(with = "iso_millis")]
    pub hidden_at: DateTime<Utc>,
}

impl HideEntry {
    pub fn new(company_name: impl Into<String>, hidden_at: DateTime<Utc>) -> Self {
        HideEntry {
            company_name: company_name.into(),
            hidden_at,
        }
    }

    /// `hidden_at` in the persisted form, e.g. `2024-01-01T00:00:00.000Z`
    pub fn hidden_at_iso(&self) -> String {
        iso_millis::format(&self.hidden_at)
    }
}

/// Ordered hide entries, insertion order preserved. Names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HideList {
    entries: Vec<HideEntry>,
}

impl HideList {
    pub fn new(entries: Vec<HideEntry>) -> Self {
        HideList { entries }
    }

    /// Set-membership by name; any matching entry counts
    pub fn contains(&self, company_name: &str) -> bool {
        self.entries.iter().any(|e| e.company_name == company_name)
    }

    pub fn entries(&self) -> &[HideEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: HideEntry) {
        self.entries.push(entry);
    }

    /// Drop every entry with exactly this name; returns how many were removed
    pub fn remove_all(&mut self, company_name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.company_name != company_name);
        before - self.entries.len()
    }

    /// Parse the persisted CSV. Blank or header-only content is an empty list.
    pub fn decode(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(HideList::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(content.as_bytes());

        let mut entries = Vec::new();
        for (idx, result) in reader.deserialize::<HideEntry>().enumerate() {
            // +2 because: 1-indexed + header row
            let entry = result.map_err(|e| Error::Parse(format!("row {}: {}", idx + 2, e)))?;
            if entry.company_name.is_empty() {
                return Err(Error::Parse(format!("row {}: empty company_name", idx + 2)));
            }
            entries.push(entry);
        }
        Ok(HideList { entries })
    }

    /// Serialize with a header row, `\n` separators and no trailing newline
    pub fn encode(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer
            .write_record(["company_name", "hidden_at"])
            .map_err(|e| Error::Encode(e.to_string()))?;
        for entry in &self.entries {
            writer
                .serialize(entry)
                .map_err(|e| Error::Encode(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Encode(e.to_string()))?;
        let mut text = String::from_utf8(bytes).map_err(|e| Error::Encode(e.to_string()))?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}

/// RFC 3339 in UTC with millisecond precision and a `Z` suffix
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(at: &DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|e| de::Error::custom(format!("invalid hidden_at `{raw}`: {e}")))
    }
}

// ============================================================================
// STORE
// ============================================================================

/// An append staged against the value that was read for it
#[derive(Debug, Clone)]
pub struct PendingAppend {
    base: Option<String>,
    list: HideList,
    entry: HideEntry,
}

impl PendingAppend {
    pub fn entry(&self) -> &HideEntry {
        &self.entry
    }
}

pub struct HideListStore<S: ValueStore> {
    backend: S,
    key: String,
    debug: bool,
}

impl<S: ValueStore> HideListStore<S> {
    pub fn new(backend: S, config: &Config) -> Self {
        HideListStore {
            backend,
            key: config.hide_list_key.clone(),
            debug: config.debug,
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Load the whole list. Absent value = empty list; malformed = `Error::Parse`.
    pub fn read(&self) -> Result<HideList> {
        Ok(self.read_with_base()?.1)
    }

    fn read_with_base(&self) -> Result<(Option<String>, HideList)> {
        let raw = self.backend.get(&self.key)?;
        let list = match raw.as_deref() {
            Some(content) => HideList::decode(content)?,
            None => HideList::default(),
        };
        Ok((raw, list))
    }

    /// Re-read the current list and append `company_name` (no dedup)
    pub fn append(&self, company_name: &str) -> Result<HideEntry> {
        let pending = self.prepare_append(company_name)?;
        self.commit(pending)
    }

    /// First half of `append`: read the current value and stage the new entry
    pub fn prepare_append(&self, company_name: &str) -> Result<PendingAppend> {
        if company_name.is_empty() {
            return Err(Error::EmptyName);
        }
        let (base, mut list) = self.read_with_base()?;
        // Stored precision, so the returned entry equals the one read back later
        let entry = HideEntry::new(company_name, Utc::now().trunc_subsecs(3));
        list.push(entry.clone());
        Ok(PendingAppend { base, list, entry })
    }

    /// Second half of `append`: write the staged list if nobody wrote since it
    /// was read, otherwise re-read and re-apply the entry.
    pub fn commit(&self, pending: PendingAppend) -> Result<HideEntry> {
        let PendingAppend {
            mut base,
            mut list,
            entry,
        } = pending;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let encoded = list.encode()?;
            if self
                .backend
                .compare_and_set(&self.key, base.as_deref(), &encoded)?
            {
                info!(company = %entry.company_name, "company hidden");
                if self.debug {
                    debug!("{}:\n{}", self.key, encoded);
                }
                return Ok(entry);
            }

            debug!(attempt, "hide list changed since read, re-reading");
            let (fresh_base, mut fresh) = self.read_with_base()?;
            fresh.push(entry.clone());
            base = fresh_base;
            list = fresh;
        }

        Err(Error::Contention(MAX_WRITE_ATTEMPTS))
    }

    /// Delete every entry named `company_name`; returns how many were removed
    pub fn remove(&self, company_name: &str) -> Result<usize> {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let (base, mut list) = self.read_with_base()?;
            let removed = list.remove_all(company_name);
            if removed == 0 {
                return Ok(0);
            }
            if self
                .backend
                .compare_and_set(&self.key, base.as_deref(), &list.encode()?)?
            {
                info!(company = company_name, removed, "company unhidden");
                return Ok(removed);
            }
        }
        Err(Error::Contention(MAX_WRITE_ATTEMPTS))
    }

    /// Delete all persisted state
    pub fn clear(&self) -> Result<()> {
        self.backend.delete(&self.key)?;
        info!(key = %self.key, "hide list cleared");
        Ok(())
    }

    /// The persisted value exactly as stored
    pub fn raw(&self) -> Result<Option<String>> {
        self.backend.get(&self.key)
    }

    /// SHA-256 of the persisted value (empty string when absent)
    pub fn fingerprint(&self) -> Result<String> {
        let raw = self.raw()?.unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Membership test over an already-loaded list
pub fn is_hidden(list: &HideList, company_name: &str) -> bool {
    list.contains(company_name)
}
