use crate::bundle::{ExportBundle, PendingImport};
use crate::card::{Card, CardFields, CardId, next_id, sample_cards};
use crate::error::{Error, Result};
use crate::queue::due_count;
use crate::scheduler::{Rating, compute_next_schedule};
use crate::session::ReviewSession;
use crate::stats::Stats;
use crate::storage::Store;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, warn};

/// Counters shown next to the review card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overview {
    pub cards_remaining: usize,
    pub total_cards: usize,
    pub reviewed_today: u32,
    pub success_rate: u32,
    pub streak: u32,
}

/// Owns the card collection, the review history and the current session
///
/// Every mutation is written through to the store. A failed write is
/// returned to the caller only after the in-memory change has been made,
/// so the in-memory state stays authoritative.
pub struct Trainer<S: Store> {
    store: S,
    cards: Vec<Card>,
    stats: Stats,
    session: ReviewSession,
}

impl<S: Store> Trainer<S> {
    /// Load the collection, installing the starter deck on first run
    pub fn open(mut store: S, seed_samples: bool, now: DateTime<Utc>) -> Result<Self> {
        let snapshot = store.load()?;

        let cards = match snapshot.cards {
            Some(cards) => cards,
            None if seed_samples => {
                let cards = sample_cards(now);
                store.save_cards(&cards)?;
                info!(count = cards.len(), "Installed starter deck");
                cards
            }
            None => Vec::new(),
        };

        info!(cards = cards.len(), "Loaded collection");

        Ok(Self {
            store,
            cards,
            stats: snapshot.stats.unwrap_or_default(),
            session: ReviewSession::new(),
        })
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn session(&self) -> &ReviewSession {
        &self.session
    }

    /// Card on screen in the running session
    pub fn current_card(&self) -> Option<&Card> {
        self.session.current().and_then(|id| self.card(id))
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn overview(&self, now: DateTime<Utc>) -> Overview {
        let local = now.with_timezone(&Local);
        let today = local.date_naive();

        Overview {
            cards_remaining: due_count(&self.cards, now),
            total_cards: self.cards.len(),
            reviewed_today: self.stats.reviewed_on(today),
            success_rate: self.stats.success_rate(today),
            streak: self.stats.streak(&local),
        }
    }

    /// Start (or restart) a review session over the cards due now
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<&Card> {
        let id = self.session.start(&self.cards, now)?;
        info!(due = self.session.remaining(), "Review session started");
        self.find(id)
    }

    pub fn flip(&mut self) -> Result<&Card> {
        let id = self.session.flip()?;
        self.find(id)
    }

    /// Rate the flipped card and move to the next one
    ///
    /// Returns the next card id, or `None` once the session is finished.
    pub fn rate(&mut self, rating: Rating, now: DateTime<Utc>) -> Result<Option<CardId>> {
        let id = self.session.awaiting_rating()?;
        let index = self.index_of(id)?;

        let rescheduled = compute_next_schedule(rating, &self.cards[index], now);
        if let Some(state) = rescheduled.schedule.state() {
            debug!(
                card = id,
                rating = rating.as_u8(),
                interval = state.interval,
                ease_factor = state.ease_factor,
                "Card rescheduled"
            );
        }
        self.cards[index] = rescheduled;
        let cards_saved = self.persist_cards();

        self.stats.record_review(rating, &now.with_timezone(&Local));
        let stats_saved = self.persist_stats();

        let next = self.session.complete_current(&self.cards, now);
        if next.is_none() {
            info!(reviewed = self.session.reviewed(), "Review session finished");
        }

        cards_saved.and(stats_saved)?;
        Ok(next)
    }

    pub fn add_card(&mut self, fields: CardFields, now: DateTime<Utc>) -> Result<CardId> {
        let fields = fields.validate()?;
        let id = next_id(&self.cards);

        self.cards.push(Card::new(id, fields, now));
        info!(card = id, "Card added");

        self.persist_cards()?;
        Ok(id)
    }

    /// Replace a card's content; its schedule is left as it is
    pub fn edit_card(&mut self, id: CardId, fields: CardFields) -> Result<()> {
        let fields = fields.validate()?;
        let index = self.index_of(id)?;

        self.cards[index].set_fields(fields);
        info!(card = id, "Card edited");

        self.persist_cards()
    }

    pub fn delete_card(&mut self, id: CardId, now: DateTime<Utc>) -> Result<()> {
        let index = self.index_of(id)?;

        self.cards.remove(index);
        self.session.remove(id, &self.cards, now);
        info!(card = id, "Card deleted");

        self.persist_cards()
    }

    pub fn search(&self, query: &str) -> Vec<&Card> {
        self.cards.iter().filter(|card| card.matches(query)).collect()
    }

    pub fn export(&self, now: DateTime<Utc>) -> ExportBundle {
        info!(cards = self.cards.len(), "Exporting collection");
        ExportBundle::new(&self.cards, &self.stats, now)
    }

    /// Validate an import without touching the current collection
    pub fn prepare_import(&self, json: &str) -> Result<PendingImport> {
        let bundle =
            ExportBundle::from_json(json).inspect_err(|e| warn!("Import rejected: {e}"))?;

        Ok(PendingImport {
            bundle,
            current_cards: self.cards.len(),
        })
    }

    /// Replace the whole collection with a confirmed import
    pub fn apply_import(&mut self, pending: PendingImport) -> Result<()> {
        let bundle = pending.bundle;

        self.cards = bundle.cards;
        if let Some(stats) = bundle.stats {
            self.stats = stats;
        }
        self.session = ReviewSession::new();
        info!(cards = self.cards.len(), "Collection imported");

        let cards_saved = self.persist_cards();
        let stats_saved = self.persist_stats();
        cards_saved.and(stats_saved)
    }

    fn index_of(&self, id: CardId) -> Result<usize> {
        self.cards
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::CardNotFound(id))
    }

    fn find(&self, id: CardId) -> Result<&Card> {
        self.card(id).ok_or(Error::CardNotFound(id))
    }

    fn persist_cards(&mut self) -> Result<()> {
        self.store
            .save_cards(&self.cards)
            .inspect_err(|e| warn!("Failed to save cards: {e}"))
    }

    fn persist_stats(&mut self) -> Result<()> {
        self.store
            .save_stats(&self.stats)
            .inspect_err(|e| warn!("Failed to save stats: {e}"))
    }
}
