//! Subscription registry
//!
//! The server keeps no subscription state across connections, so the full set
//! is replayed after every open and resent whole on every change.

use std::collections::BTreeSet;

use crate::parser::ClientMessage;
use crate::prices::normalize_symbol;

/// Symbols the caller wants streamed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    symbols: BTreeSet<String>,
}

impl SubscriptionSet {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.merge(symbols);
        set
    }

    /// Merge symbols into the set; returns how many were new
    pub fn merge<I, S>(&mut self, symbols: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        symbols
            .into_iter()
            .filter_map(|symbol| normalize_symbol(symbol.as_ref()))
            .filter(|symbol| self.symbols.insert(symbol.clone()))
            .count()
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }

    /// Sorted copy of the symbols
    pub fn symbols(&self) -> Vec<String> {
        self.symbols.iter().cloned().collect()
    }

    /// Subscribe frame for the whole set, or `None` when there is nothing to ask for
    pub fn subscribe_message(&self) -> Option<ClientMessage> {
        if self.symbols.is_empty() {
            return None;
        }
        Some(ClientMessage::Subscribe {
            symbols: self.symbols(),
        })
    }
}
