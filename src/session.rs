use crate::card::{Card, CardId};
use crate::error::{Error, Result};
use crate::queue::{due_cards, is_due};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Review session phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    ShowingFront,
    ShowingBack,
    Finished,
}

/// Walk over the cards that were due when the session started
///
/// The session only tracks card ids; the cards themselves stay in the
/// collection owned by the trainer.
#[derive(Debug, Default)]
pub struct ReviewSession {
    phase: Phase,
    queue: VecDeque<CardId>,
    reviewed: usize,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Card currently on screen
    pub fn current(&self) -> Option<CardId> {
        match self.phase {
            Phase::ShowingFront | Phase::ShowingBack => self.queue.front().copied(),
            Phase::Idle | Phase::Finished => None,
        }
    }

    /// Cards left in this session, including the current one
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Cards rated since the session started
    pub fn reviewed(&self) -> usize {
        self.reviewed
    }

    /// Build the queue from the due cards and show the first one
    ///
    /// Also restarts a running session. With nothing due the session goes
    /// back to `Idle`.
    pub fn start(&mut self, cards: &[Card], now: DateTime<Utc>) -> Result<CardId> {
        self.queue = due_cards(cards, now).iter().map(|c| c.id).collect();
        self.reviewed = 0;

        match self.queue.front() {
            Some(&id) => {
                self.phase = Phase::ShowingFront;
                Ok(id)
            }
            None => {
                self.phase = Phase::Idle;
                Err(Error::NothingToReview)
            }
        }
    }

    /// Reveal the back of the current card
    pub fn flip(&mut self) -> Result<CardId> {
        if self.phase != Phase::ShowingFront {
            return Err(self.invalid("flip"));
        }
        self.phase = Phase::ShowingBack;
        self.queue.front().copied().ok_or(Error::NothingToReview)
    }

    /// Card awaiting a rating; only valid once the card is flipped
    pub fn awaiting_rating(&self) -> Result<CardId> {
        if self.phase != Phase::ShowingBack {
            return Err(self.invalid("rate"));
        }
        self.queue.front().copied().ok_or(Error::NothingToReview)
    }

    /// Drop the rated head and move on
    pub fn complete_current(&mut self, cards: &[Card], now: DateTime<Utc>) -> Option<CardId> {
        self.queue.pop_front();
        self.reviewed += 1;
        self.advance(cards, now)
    }

    /// Forget a card that was deleted from the collection
    pub fn remove(&mut self, id: CardId, cards: &[Card], now: DateTime<Utc>) {
        if self.current() == Some(id) {
            self.queue.pop_front();
            self.advance(cards, now);
        } else {
            self.queue.retain(|queued| *queued != id);
        }
    }

    /// Drop queued cards that were deleted or are no longer due, then show
    /// the next head or finish
    fn advance(&mut self, cards: &[Card], now: DateTime<Utc>) -> Option<CardId> {
        self.queue.retain(|queued| {
            cards
                .iter()
                .find(|card| card.id == *queued)
                .is_some_and(|card| is_due(card, now))
        });

        match self.queue.front() {
            Some(&id) => {
                self.phase = Phase::ShowingFront;
                Some(id)
            }
            None => {
                self.phase = Phase::Finished;
                None
            }
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidPhase {
            action,
            phase: self.phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardFields;
    use crate::scheduler::{Rating, compute_next_schedule};
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-10-17T09:00:00Z".parse().unwrap()
    }

    fn cards(count: u64) -> Vec<Card> {
        (1..=count)
            .map(|id| Card::new(id, CardFields::new("front", "back"), now()))
            .collect()
    }

    fn rate(session: &mut ReviewSession, cards: &mut [Card], rating: Rating) -> Option<CardId> {
        let id = session.awaiting_rating().unwrap();
        let card = cards.iter_mut().find(|c| c.id == id).unwrap();
        *card = compute_next_schedule(rating, card, now());
        session.complete_current(cards, now())
    }

    #[test]
    fn test_start_with_nothing_due_stays_idle() {
        let mut session = ReviewSession::new();
        let result = session.start(&[], now());

        assert!(matches!(result, Err(Error::NothingToReview)));
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.current(), None);
    }

    #[test]
    fn test_full_walk() {
        let mut cards = cards(2);
        let mut session = ReviewSession::new();

        assert_eq!(session.start(&cards, now()).unwrap(), 1);
        assert_eq!(session.phase(), Phase::ShowingFront);
        assert_eq!(session.remaining(), 2);

        assert_eq!(session.flip().unwrap(), 1);
        assert_eq!(session.phase(), Phase::ShowingBack);

        assert_eq!(rate(&mut session, &mut cards, Rating::Good), Some(2));
        assert_eq!(session.phase(), Phase::ShowingFront);
        assert_eq!(session.remaining(), 1);

        session.flip().unwrap();
        assert_eq!(rate(&mut session, &mut cards, Rating::Again), None);
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.remaining(), 0);
        assert_eq!(session.reviewed(), 2);
    }

    #[test]
    fn test_flip_and_rate_guards() {
        let cards = cards(1);
        let mut session = ReviewSession::new();

        assert!(matches!(
            session.flip(),
            Err(Error::InvalidPhase { action: "flip", phase: Phase::Idle })
        ));

        session.start(&cards, now()).unwrap();
        assert!(matches!(
            session.awaiting_rating(),
            Err(Error::InvalidPhase { action: "rate", phase: Phase::ShowingFront })
        ));

        session.flip().unwrap();
        assert!(session.flip().is_err());
        assert_eq!(session.awaiting_rating().unwrap(), 1);
    }

    #[test]
    fn test_restart_after_finished() {
        let mut cards = cards(1);
        let mut session = ReviewSession::new();
        session.start(&cards, now()).unwrap();
        session.flip().unwrap();
        rate(&mut session, &mut cards, Rating::Easy);
        assert_eq!(session.phase(), Phase::Finished);

        // Rated card is a day out, so nothing is due yet
        assert!(session.start(&cards, now()).is_err());
        assert_eq!(session.phase(), Phase::Idle);

        let tomorrow = now() + Duration::days(1);
        assert_eq!(session.start(&cards, tomorrow).unwrap(), 1);
        assert_eq!(session.phase(), Phase::ShowingFront);
    }

    #[test]
    fn test_queue_not_rebuilt_mid_session() {
        let mut cards = cards(2);
        let mut session = ReviewSession::new();
        session.start(&cards, now()).unwrap();

        cards.push(Card::new(3, CardFields::new("new", "جديد"), now()));

        session.flip().unwrap();
        rate(&mut session, &mut cards, Rating::Good);
        session.flip().unwrap();
        assert_eq!(rate(&mut session, &mut cards, Rating::Good), None);
        assert_eq!(session.phase(), Phase::Finished);
    }

    #[test]
    fn test_deleted_cards_leave_the_queue() {
        let mut cards = cards(3);
        let mut session = ReviewSession::new();
        session.start(&cards, now()).unwrap();

        // Delete a queued card that is not on screen
        cards.retain(|c| c.id != 2);
        session.remove(2, &cards, now());
        assert_eq!(session.current(), Some(1));
        assert_eq!(session.remaining(), 2);

        // Delete the card on screen
        cards.retain(|c| c.id != 1);
        session.remove(1, &cards, now());
        assert_eq!(session.current(), Some(3));
        assert_eq!(session.phase(), Phase::ShowingFront);

        cards.clear();
        session.remove(3, &cards, now());
        assert_eq!(session.phase(), Phase::Finished);
    }

    #[test]
    fn test_cards_no_longer_due_are_skipped() {
        let mut cards = cards(2);
        let mut session = ReviewSession::new();
        session.start(&cards, now()).unwrap();

        // Card 2 gets scheduled elsewhere while card 1 is on screen
        cards[1] = compute_next_schedule(Rating::Good, &cards[1], now());

        session.flip().unwrap();
        assert_eq!(rate(&mut session, &mut cards, Rating::Good), None);
        assert_eq!(session.phase(), Phase::Finished);
    }
}
