// src/chat_filter.rs
//! Chat list filtering for the operator sidebar, plus the one-shot
//! "open the oldest pending chat" signal.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{Chat, ChatStatus};

/// Status dropdown value. Defaults to `pending`, the operator's work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    All,
    Only(ChatStatus),
}

impl Default for StatusFilter {
    fn default() -> Self {
        StatusFilter::Only(ChatStatus::Pending)
    }
}

impl StatusFilter {
    pub fn matches(&self, status: ChatStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.as_str(),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            other => other
                .parse::<ChatStatus>()
                .map(StatusFilter::Only)
                .map_err(|_| format!("Unknown status filter '{}'", other)),
        }
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatFilter {
    /// Substring of the decimal user id. Empty matches everything.
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub status: StatusFilter,
}

impl ChatFilter {
    pub fn new(search_term: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            search_term: search_term.into(),
            status,
        }
    }

    pub fn matches(&self, chat: &Chat) -> bool {
        let term = self.search_term.as_str();
        let search_ok = term.is_empty() || chat.user_id.to_string().contains(term);
        search_ok && self.status.matches(chat.status)
    }
}

/// Chats matching `filter`, oldest first. Ties keep input order.
pub fn filter_chats(chats: &[Chat], filter: &ChatFilter) -> Vec<Chat> {
    let mut filtered: Vec<Chat> = chats.iter().filter(|chat| filter.matches(chat)).cloned().collect();
    filtered.sort_by_key(|chat| chat.created_at);
    filtered
}

/// The chat to open automatically: only when nothing is selected and the
/// operator is looking at the pending queue.
pub fn auto_select_candidate(filtered: &[Chat], filter: &ChatFilter, selected: Option<i64>) -> Option<i64> {
    if selected.is_some() || filter.status != StatusFilter::Only(ChatStatus::Pending) {
        return None;
    }
    filtered
        .iter()
        .find(|chat| chat.status == ChatStatus::Pending)
        .map(|chat| chat.id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatQueueView {
    pub chats: Vec<Chat>,
    pub selected_chat_id: Option<i64>,
    /// Set only on the refresh that first produced this candidate.
    pub auto_select: Option<i64>,
}

/// Sidebar state: the filter, the selection, and what was last signalled.
#[derive(Debug, Clone, Default)]
pub struct ChatQueue {
    filter: ChatFilter,
    selected: Option<i64>,
    last_signal: Option<(ChatFilter, i64)>,
}

impl ChatQueue {
    pub fn new(filter: ChatFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn filter(&self) -> &ChatFilter {
        &self.filter
    }

    pub fn selected(&self) -> Option<i64> {
        self.selected
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filter.search_term = term.into();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filter.status = status;
    }

    pub fn select(&mut self, chat_id: i64) {
        self.selected = Some(chat_id);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Recomputes the list. The auto-select signal fires once per distinct
    /// (filter, candidate); repeated refreshes with the same inputs stay quiet.
    pub fn refresh(&mut self, chats: &[Chat]) -> ChatQueueView {
        let filtered = filter_chats(chats, &self.filter);
        let candidate = auto_select_candidate(&filtered, &self.filter, self.selected);

        let auto_select = match candidate {
            Some(id) if self.last_signal.as_ref() != Some(&(self.filter.clone(), id)) => {
                self.last_signal = Some((self.filter.clone(), id));
                Some(id)
            }
            _ => None,
        };

        ChatQueueView {
            chats: filtered,
            selected_chat_id: self.selected,
            auto_select,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn chat(id: i64, user_id: i64, status: ChatStatus, hours_ago: i64) -> Chat {
        let created_at = now() - Duration::hours(hours_ago);
        Chat {
            id,
            user_id,
            status,
            created_at,
            updated_at: created_at,
        }
    }

    fn sample() -> Vec<Chat> {
        vec![
            chat(3, 103, ChatStatus::Pending, 12),
            chat(4, 104, ChatStatus::InProgress, 72),
            chat(1, 101, ChatStatus::Pending, 48),
            chat(6, 106, ChatStatus::Completed, 120),
            chat(2, 102, ChatStatus::Pending, 24),
            chat(5, 105, ChatStatus::InProgress, 48),
        ]
    }

    fn ids(chats: &[Chat]) -> Vec<i64> {
        chats.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_pending_filter_keeps_only_pending_oldest_first() {
        let filtered = filter_chats(&sample(), &ChatFilter::default());
        assert_eq!(ids(&filtered), vec![1, 2, 3]);
        assert!(filtered.iter().all(|c| c.status == ChatStatus::Pending));
    }

    #[test]
    fn test_all_filter_sorts_everything_by_created_at() {
        let filtered = filter_chats(&sample(), &ChatFilter::new("", StatusFilter::All));
        assert_eq!(ids(&filtered), vec![6, 4, 1, 5, 2, 3]);
    }

    #[test]
    fn test_search_is_substring_of_user_id() {
        let chats = vec![chat(1, 101, ChatStatus::Pending, 1)];
        for term in ["1", "10", "101", "01"] {
            let filter = ChatFilter::new(term, StatusFilter::All);
            assert_eq!(filter_chats(&chats, &filter).len(), 1, "term {term}");
        }
        assert!(filter_chats(&chats, &ChatFilter::new("999", StatusFilter::All)).is_empty());
    }

    #[test]
    fn test_search_term_is_used_verbatim() {
        let chats = vec![chat(1, 101, ChatStatus::Pending, 1)];
        assert!(filter_chats(&chats, &ChatFilter::new(" 1", StatusFilter::All)).is_empty());
        assert!(filter_chats(&chats, &ChatFilter::new("1 ", StatusFilter::All)).is_empty());
    }

    #[test]
    fn test_search_and_status_combine() {
        let filter = ChatFilter::new("10", StatusFilter::Only(ChatStatus::InProgress));
        assert_eq!(ids(&filter_chats(&sample(), &filter)), vec![4, 5]);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let filter = ChatFilter::new("1", StatusFilter::All);
        let chats = sample();
        assert_eq!(filter_chats(&chats, &filter), filter_chats(&chats, &filter));
    }

    #[test]
    fn test_auto_select_picks_oldest_pending() {
        let filter = ChatFilter::default();
        let filtered = filter_chats(&sample(), &filter);
        assert_eq!(auto_select_candidate(&filtered, &filter, None), Some(1));
        assert_eq!(auto_select_candidate(&filtered, &filter, Some(4)), None);

        let all = ChatFilter::new("", StatusFilter::All);
        assert_eq!(auto_select_candidate(&filter_chats(&sample(), &all), &all, None), None);
    }

    #[test]
    fn test_queue_signals_once_per_change() {
        let chats = sample();
        let mut queue = ChatQueue::default();

        assert_eq!(queue.refresh(&chats).auto_select, Some(1));
        assert_eq!(queue.refresh(&chats).auto_select, None);

        // A new oldest pending chat is a new candidate.
        let mut more = chats.clone();
        more.push(chat(9, 109, ChatStatus::Pending, 200));
        assert_eq!(queue.refresh(&more).auto_select, Some(9));

        queue.select(9);
        let view = queue.refresh(&more);
        assert_eq!(view.auto_select, None);
        assert_eq!(view.selected_chat_id, Some(9));
    }

    #[test]
    fn test_queue_signals_again_after_filter_change() {
        let chats = sample();
        let mut queue = ChatQueue::default();
        assert_eq!(queue.refresh(&chats).auto_select, Some(1));

        queue.set_search_term("102");
        assert_eq!(queue.refresh(&chats).auto_select, Some(2));

        queue.set_status_filter(StatusFilter::All);
        assert_eq!(queue.refresh(&chats).auto_select, None);
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!("in_progress".parse::<StatusFilter>(), Ok(StatusFilter::Only(ChatStatus::InProgress)));
        assert!("archived".parse::<StatusFilter>().is_err());
    }
}
