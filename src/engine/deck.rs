//! Deck navigation.
//!
//! The cursor points at the next unconsidered market. It only moves
//! forward, one card per settled swipe, and never past the end of the
//! deck.

use crate::types::Market;

/// What sits on top of the deck.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TopOfDeck<'a> {
    Market(&'a Market),
    /// Every market has been considered. Rendered as "no active
    /// predictions", not as an error.
    Empty,
}

impl<'a> TopOfDeck<'a> {
    pub fn market(self) -> Option<&'a Market> {
        match self {
            TopOfDeck::Market(m) => Some(m),
            TopOfDeck::Empty => None,
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, TopOfDeck::Empty)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deck {
    cursor: usize,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move to the next card. Returns false if already at the end.
    pub fn advance(&mut self, len: usize) -> bool {
        if self.cursor >= len {
            self.cursor = len;
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Re-establish `cursor <= len` after the snapshot shrank.
    pub fn clamp(&mut self, len: usize) {
        self.cursor = self.cursor.min(len);
    }

    pub fn top_of_deck<'a>(&self, markets: &'a [Market]) -> TopOfDeck<'a> {
        match markets.get(self.cursor) {
            Some(m) => TopOfDeck::Market(m),
            None => TopOfDeck::Empty,
        }
    }

    /// Cards left including the top one.
    pub fn remaining(&self, len: usize) -> usize {
        len.saturating_sub(self.cursor)
    }
}
