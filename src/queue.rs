use crate::card::{Card, Schedule};
use chrono::{DateTime, Utc};

/// A card is due when it was never scheduled or its review date has passed
pub fn is_due(card: &Card, now: DateTime<Utc>) -> bool {
    match &card.schedule {
        Schedule::Unscheduled => true,
        Schedule::Scheduled(state) => state.next_review <= now,
    }
}

/// Due cards in collection order
pub fn due_cards(cards: &[Card], now: DateTime<Utc>) -> Vec<&Card> {
    cards.iter().filter(|card| is_due(card, now)).collect()
}

pub fn due_count(cards: &[Card], now: DateTime<Utc>) -> usize {
    cards.iter().filter(|card| is_due(card, now)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardFields, ScheduleState};
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-10-17T09:00:00Z".parse().unwrap()
    }

    fn card(id: u64, next_review: Option<DateTime<Utc>>) -> Card {
        let mut card = Card::new(id, CardFields::new("front", "back"), now());
        if let Some(next_review) = next_review {
            card.schedule = Schedule::Scheduled(ScheduleState {
                repetitions: 1,
                ease_factor: 2.5,
                interval: 1,
                next_review,
                last_reviewed: next_review - Duration::days(1),
            });
        }
        card
    }

    #[test]
    fn test_unscheduled_always_due() {
        let cards = vec![card(1, None)];
        let long_ago = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!(due_cards(&cards, long_ago).len(), 1);
        assert_eq!(due_cards(&cards, now()).len(), 1);
    }

    #[test]
    fn test_due_boundary_is_inclusive() {
        let cards = vec![card(1, Some(now()))];
        assert!(is_due(&cards[0], now()));
        assert!(!is_due(&cards[0], now() - Duration::seconds(1)));
    }

    #[test]
    fn test_due_cards_keeps_collection_order() {
        let cards = vec![
            card(1, Some(now() - Duration::days(2))),
            card(2, Some(now() + Duration::days(1))),
            card(3, None),
            card(4, Some(now() - Duration::hours(1))),
        ];

        let ids: Vec<u64> = due_cards(&cards, now()).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(due_count(&cards, now()), 3);
    }

    #[test]
    fn test_empty_collection() {
        assert!(due_cards(&[], now()).is_empty());
        assert_eq!(due_count(&[], now()), 0);
    }
}
