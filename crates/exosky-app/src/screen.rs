//! Which screen is active: planet selection, loading, or the star view.

use crate::fetch::RequestId;
use exosky_viewer::Scene;
use std::time::{Duration, Instant};

/// Typing pause before a search is sent.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub enum Screen {
    Selecting(Selection),
    Loading {
        planet: String,
        request: RequestId,
    },
    Viewing(Box<Scene>),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Selecting(_) => "selecting",
            Screen::Loading { .. } => "loading",
            Screen::Viewing(_) => "viewing",
        }
    }
}

/// Keys the selection screen understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKey {
    Char(char),
    Backspace,
    Next,
    Previous,
    Submit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SelectionOutcome {
    None,
    /// Open this planet.
    Open(String),
}

/// Search box with autocomplete matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    query: String,
    matches: Vec<String>,
    cursor: usize,
    search_due: Option<Instant>,
}

impl Selection {
    pub fn with_query(query: impl Into<String>, now: Instant) -> Self {
        let mut selection = Self {
            query: query.into(),
            ..Self::default()
        };
        if !selection.query.trim().is_empty() {
            selection.search_due = Some(now);
        }
        selection
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    pub fn selected(&self) -> Option<&str> {
        self.matches.get(self.cursor).map(String::as_str)
    }

    pub fn apply_key(&mut self, key: SelectionKey, now: Instant) -> SelectionOutcome {
        match key {
            SelectionKey::Char(c) if !c.is_control() => {
                self.query.push(c);
                self.search_due = Some(now + SEARCH_DEBOUNCE);
            }
            SelectionKey::Char(_) => {}
            SelectionKey::Backspace => {
                if self.query.pop().is_some() {
                    self.search_due = Some(now + SEARCH_DEBOUNCE);
                }
            }
            SelectionKey::Next if !self.matches.is_empty() => {
                self.cursor = (self.cursor + 1) % self.matches.len();
            }
            SelectionKey::Previous if !self.matches.is_empty() => {
                self.cursor = (self.cursor + self.matches.len() - 1) % self.matches.len();
            }
            SelectionKey::Next | SelectionKey::Previous => {}
            SelectionKey::Submit => {
                if let Some(planet) = self.selected() {
                    return SelectionOutcome::Open(planet.to_owned());
                }
                if !self.query.trim().is_empty() {
                    self.search_due = Some(now);
                }
            }
        }
        SelectionOutcome::None
    }

    /// The query to send, once the debounce has passed. Clears the pending
    /// search.
    pub fn take_due_search(&mut self, now: Instant) -> Option<String> {
        let due = self.search_due?;
        if now < due {
            return None;
        }
        self.search_due = None;
        let query = self.query.trim();
        (!query.is_empty()).then(|| query.to_owned())
    }

    /// Apply search results. Results for an outdated query are ignored.
    pub fn set_matches(&mut self, query: &str, matches: Vec<String>) -> bool {
        if query != self.query.trim() {
            return false;
        }
        self.matches = matches;
        self.cursor = 0;
        true
    }

    /// Status line shown in the window title.
    pub fn status(&self) -> String {
        match self.selected() {
            Some(planet) => format!(
                "Search: {}_  [{} of {}: {planet}]  Enter opens, Tab cycles",
                self.query,
                self.cursor + 1,
                self.matches.len()
            ),
            None if self.query.is_empty() => "Type a planet name".to_owned(),
            None => format!("Search: {}_  (no matches)", self.query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(selection: &mut Selection, text: &str, now: Instant) {
        for c in text.chars() {
            selection.apply_key(SelectionKey::Char(c), now);
        }
    }

    #[test]
    fn test_typing_debounces_search() {
        let now = Instant::now();
        let mut s = Selection::default();
        type_text(&mut s, "kep", now);
        assert_eq!(s.take_due_search(now), None);
        assert_eq!(
            s.take_due_search(now + SEARCH_DEBOUNCE),
            Some("kep".to_owned())
        );
        assert_eq!(s.take_due_search(now + SEARCH_DEBOUNCE * 2), None);
    }

    #[test]
    fn test_stale_results_ignored() {
        let now = Instant::now();
        let mut s = Selection::default();
        type_text(&mut s, "kepler", now);
        assert!(!s.set_matches("kep", vec!["Kepler-22 b".into()]));
        assert!(s.matches().is_empty());
        assert!(s.set_matches("kepler", vec!["Kepler-22 b".into()]));
        assert_eq!(s.selected(), Some("Kepler-22 b"));
    }

    #[test]
    fn test_cycle_and_open() {
        let now = Instant::now();
        let mut s = Selection::with_query("k", now);
        s.set_matches("k", vec!["K2-18 b".into(), "Kepler-22 b".into()]);
        s.apply_key(SelectionKey::Next, now);
        assert_eq!(s.selected(), Some("Kepler-22 b"));
        s.apply_key(SelectionKey::Next, now);
        assert_eq!(s.selected(), Some("K2-18 b"));
        s.apply_key(SelectionKey::Previous, now);
        assert_eq!(
            s.apply_key(SelectionKey::Submit, now),
            SelectionOutcome::Open("Kepler-22 b".into())
        );
    }

    #[test]
    fn test_submit_without_matches_searches_now() {
        let now = Instant::now();
        let mut s = Selection::default();
        type_text(&mut s, "trappist", now);
        assert_eq!(s.apply_key(SelectionKey::Submit, now), SelectionOutcome::None);
        assert_eq!(s.take_due_search(now), Some("trappist".to_owned()));
    }

    #[test]
    fn test_backspace_and_control_chars() {
        let now = Instant::now();
        let mut s = Selection::default();
        type_text(&mut s, "ab\u{8}", now);
        assert_eq!(s.query(), "ab");
        s.apply_key(SelectionKey::Backspace, now);
        assert_eq!(s.query(), "a");
        assert!(s.status().starts_with("Search: a_"));
    }

    #[test]
    fn test_initial_query_searches_immediately() {
        let now = Instant::now();
        let mut s = Selection::with_query("51 Peg", now);
        assert_eq!(s.take_due_search(now), Some("51 Peg".to_owned()));
        assert_eq!(Selection::with_query("  ", now).take_due_search(now), None);
    }
}
