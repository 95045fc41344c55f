// Host commands: dump, clear (confirmed), hide, unhide

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hide_list::{HideEntry, HideListStore};
use crate::storage::ValueStore;
use std::fmt;
use tracing::info;

/// Asks the user for a line of input; `None` means they cancelled
pub trait Prompt {
    fn ask(&mut self, message: &str) -> Result<Option<String>>;
}

/// Raw persisted value plus its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump {
    pub raw: String,
    pub fingerprint: String,
}

impl fmt::Display for Dump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hidden companies:")?;
        writeln!(f, "{}", self.raw)?;
        write!(f, "sha256: {}", self.fingerprint)
    }
}

pub fn dump<S: ValueStore>(store: &HideListStore<S>) -> Result<Dump> {
    Ok(Dump {
        raw: store.raw()?.unwrap_or_default(),
        fingerprint: store.fingerprint()?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    Aborted,
}

/// Delete the whole list once the user types the confirmation phrase exactly.
///
/// A list that no longer parses can still be cleared; the prompt then shows an
/// unknown entry count.
pub fn clear<S: ValueStore, P: Prompt>(
    store: &HideListStore<S>,
    config: &Config,
    prompt: &mut P,
) -> Result<ClearOutcome> {
    let count = match store.read() {
        Ok(list) => list.len().to_string(),
        Err(Error::Parse(_)) => "unknown".to_string(),
        Err(err) => return Err(err),
    };
    let phrase = &config.clear_confirmation;
    let message = format!("Type \"{phrase}\" to delete the list ({count} entries)");

    match prompt.ask(&message)? {
        Some(answer) if answer == *phrase => {
            store.clear()?;
            Ok(ClearOutcome::Cleared)
        }
        _ => {
            info!("clear aborted: confirmation did not match");
            Ok(ClearOutcome::Aborted)
        }
    }
}

pub fn hide<S: ValueStore>(store: &HideListStore<S>, company_name: &str) -> Result<HideEntry> {
    store.append(company_name)
}

/// Remove every entry with exactly this name
pub fn unhide<S: ValueStore>(store: &HideListStore<S>, company_name: &str) -> Result<usize> {
    store.remove(company_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryValueStore;

    /// Replays canned answers and records what was asked
    struct Scripted {
        answers: Vec<Option<String>>,
        asked: Vec<String>,
    }

    impl Scripted {
        fn answering(answer: Option<&str>) -> Self {
            Scripted {
                answers: vec![answer.map(str::to_string)],
                asked: Vec::new(),
            }
        }
    }

    impl Prompt for Scripted {
        fn ask(&mut self, message: &str) -> Result<Option<String>> {
            self.asked.push(message.to_string());
            Ok(self.answers.remove(0))
        }
    }

    fn seeded() -> HideListStore<MemoryValueStore> {
        let store = HideListStore::new(MemoryValueStore::new(), &Config::default());
        store.append("Acme").unwrap();
        store.append("Globex").unwrap();
        store
    }

    #[test]
    fn test_clear_with_exact_phrase() {
        let store = seeded();
        let mut prompt = Scripted::answering(Some("Yes, clear the list"));
        let outcome = clear(&store, &Config::default(), &mut prompt).unwrap();
        assert_eq!(outcome, ClearOutcome::Cleared);
        assert_eq!(store.raw().unwrap(), None);
        assert_eq!(
            prompt.asked,
            vec!["Type \"Yes, clear the list\" to delete the list (2 entries)"]
        );
    }

    #[test]
    fn test_clear_aborts_on_mismatch_or_cancel() {
        let store = seeded();
        let before = store.raw().unwrap();
        for answer in [Some("yes, clear the list"), Some("Yes, clear the list "), None] {
            let mut prompt = Scripted::answering(answer);
            let outcome = clear(&store, &Config::default(), &mut prompt).unwrap();
            assert_eq!(outcome, ClearOutcome::Aborted);
            assert_eq!(store.raw().unwrap(), before);
        }
    }

    #[test]
    fn test_clear_recovers_corrupt_list() {
        let store = HideListStore::new(MemoryValueStore::new(), &Config::default());
        store.backend().set("jsa-hide-list", "not,a\n\"broken").unwrap();
        let mut prompt = Scripted::answering(Some("Yes, clear the list"));
        clear(&store, &Config::default(), &mut prompt).unwrap();
        assert!(prompt.asked[0].contains("(unknown entries)"));
        assert_eq!(store.raw().unwrap(), None);
    }

    #[test]
    fn test_dump_shows_raw_value() {
        let store = HideListStore::new(MemoryValueStore::new(), &Config::default());
        store
            .backend()
            .set("jsa-hide-list", "company_name,hidden_at\nAcme,2024-01-01T00:00:00.000Z")
            .unwrap();
        let dump = dump(&store).unwrap();
        let text = dump.to_string();
        assert!(text.starts_with("Hidden companies:\ncompany_name,hidden_at\nAcme,"));
        assert_eq!(dump.fingerprint.len(), 64);
    }

    #[test]
    fn test_hide_then_unhide() {
        let store = seeded();
        hide(&store, "Acme").unwrap();
        assert_eq!(unhide(&store, "Acme").unwrap(), 2);
        assert_eq!(unhide(&store, "Acme").unwrap(), 0);
        let names: Vec<_> = store
            .read()
            .unwrap()
            .entries()
            .iter()
            .map(|e| e.company_name.clone())
            .collect();
        assert_eq!(names, vec!["Globex"]);
    }
}
