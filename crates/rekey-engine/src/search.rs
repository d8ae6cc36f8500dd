//! Backtracking page-navigation search.
//!
//! One engine per finding episode, run when the direct link-path walk
//! cannot resolve a next link. The engine is a synchronous transition core
//! over an agenda of unexplored links; the orchestrator executes its steps
//! against the live page and feeds completions back in. Depth-first
//! traversal rides the browser's own history, with reload-based recovery
//! when history and the agenda diverge.

use crate::protocol::{Destination, FailureReason};

/// An unexplored candidate link discovered during this episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchNode {
    /// URL of the page the link was discovered on.
    pub url: String,
    /// Discovery-order index of the link on that page.
    pub link_index: usize,
}

/// What the executor observed about the current page.
#[derive(Debug, Clone)]
pub struct PageInfo {
    pub url: String,
    /// Whether the page already satisfies the destination.
    pub arrived: bool,
    /// Candidate link selectors, discovery order.
    pub links: Vec<String>,
}

/// Next action the executor must take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStep {
    /// Extract info about the current page and call `on_info`.
    RequestInfo,
    /// Navigate one step back in history and call `on_back_done`.
    GoBack,
    /// Load the given URL and call `on_reload_done`.
    Reload(String),
    /// Click the link with this discovery index on the current page,
    /// then extract info and call `on_info`.
    ClickLink(usize),
    /// The destination was reached; the episode is over.
    Arrived,
    /// The agenda is exhausted; the episode failed.
    Fail(FailureReason),
}

/// Depth-first search over discoverable links.
pub struct SearchEngine {
    destination: Destination,
    agenda: Vec<SearchNode>,
    current_url: String,
}

impl SearchEngine {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            agenda: Vec::new(),
            current_url: String::new(),
        }
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    /// Number of unexplored nodes.
    pub fn agenda_len(&self) -> usize {
        self.agenda.len()
    }

    /// Begin the episode.
    pub fn start(&mut self) -> SearchStep {
        SearchStep::RequestInfo
    }

    /// Handle extracted page info.
    pub fn on_info(&mut self, info: &PageInfo) -> SearchStep {
        self.current_url = info.url.clone();
        if info.arrived {
            return SearchStep::Arrived;
        }
        if info.links.is_empty() {
            return SearchStep::GoBack;
        }
        for i in 0..info.links.len() {
            self.agenda.push(SearchNode {
                url: info.url.clone(),
                link_index: i,
            });
        }
        self.pop(false)
    }

    /// Handle a completed back-navigation.
    pub fn on_back_done(&mut self, current_url: &str, can_go_back: bool) -> SearchStep {
        self.current_url = current_url.to_string();
        let top_diverges = self
            .agenda
            .last()
            .map(|node| node.url != current_url)
            .unwrap_or(false);
        if top_diverges && can_go_back {
            return SearchStep::GoBack;
        }
        self.pop(true)
    }

    /// Handle a completed reload.
    pub fn on_reload_done(&mut self, current_url: &str) -> SearchStep {
        self.current_url = current_url.to_string();
        self.pop(false)
    }

    /// Pop the next node. With `reset`, a node discovered on a different
    /// page is re-pushed and its page reloaded first; the follow-up
    /// non-reset pop then consumes it, so each pop/reload pair nets
    /// exactly one consumed node.
    fn pop(&mut self, reset: bool) -> SearchStep {
        let Some(node) = self.agenda.pop() else {
            return SearchStep::Fail(self.destination.not_found());
        };
        if reset && node.url != self.current_url {
            let url = node.url.clone();
            self.agenda.push(node);
            return SearchStep::Reload(url);
        }
        SearchStep::ClickLink(node.link_index)
    }
}
