use crate::error::{Error, Result};
use crate::scheduler::{DEFAULT_EASE_FACTOR, MAX_INTERVAL, MIN_EASE_FACTOR};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub type CardId = u64;

/// Scheduling state of a card
///
/// A card stays `Unscheduled` until its first rating, and is always due
/// while it is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Schedule {
    #[default]
    Unscheduled,
    Scheduled(ScheduleState),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleState {
    /// Consecutive passing ratings since the last failure
    pub repetitions: u32,
    /// Interval multiplier, never below 1.3
    pub ease_factor: f64,
    /// Whole days between `last_reviewed` and `next_review`
    pub interval: u32,
    pub next_review: DateTime<Utc>,
    pub last_reviewed: DateTime<Utc>,
}

impl Schedule {
    pub fn state(&self) -> Option<&ScheduleState> {
        match self {
            Schedule::Unscheduled => None,
            Schedule::Scheduled(state) => Some(state),
        }
    }

    pub fn next_review(&self) -> Option<DateTime<Utc>> {
        self.state().map(|s| s.next_review)
    }
}

/// User-editable content of a card
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFields {
    pub front: String,
    pub back: String,
    pub example: Option<String>,
    pub alt_form: Option<String>,
}

impl CardFields {
    pub fn new(front: &str, back: &str) -> Self {
        Self {
            front: front.to_string(),
            back: back.to_string(),
            example: None,
            alt_form: None,
        }
    }

    pub fn with_example(mut self, example: &str) -> Self {
        self.example = Some(example.to_string());
        self
    }

    pub fn with_alt_form(mut self, alt_form: &str) -> Self {
        self.alt_form = Some(alt_form.to_string());
        self
    }

    /// Trim every field, drop blank optional text and reject blank terms
    pub fn validate(self) -> Result<Self> {
        let front = self.front.trim().to_string();
        let back = self.back.trim().to_string();

        if front.is_empty() {
            return Err(Error::EmptyField("French"));
        }
        if back.is_empty() {
            return Err(Error::EmptyField("Darija"));
        }

        Ok(Self {
            front,
            back,
            example: non_blank(self.example),
            alt_form: non_blank(self.alt_form),
        })
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// A French / Darija word pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CardRecord", into = "CardRecord")]
pub struct Card {
    pub id: CardId,
    /// French term
    pub front: String,
    /// Darija term
    pub back: String,
    pub example: Option<String>,
    /// Classical Arabic form
    pub alt_form: Option<String>,
    pub created_at: DateTime<Utc>,
    pub schedule: Schedule,
}

impl Card {
    /// Create an unscheduled card; `fields` are expected to be validated
    pub fn new(id: CardId, fields: CardFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            front: fields.front,
            back: fields.back,
            example: fields.example,
            alt_form: fields.alt_form,
            created_at: now,
            schedule: Schedule::Unscheduled,
        }
    }

    /// Replace the content, keeping identity, creation time and schedule
    pub fn set_fields(&mut self, fields: CardFields) {
        self.front = fields.front;
        self.back = fields.back;
        self.example = fields.example;
        self.alt_form = fields.alt_form;
    }

    pub fn fields(&self) -> CardFields {
        CardFields {
            front: self.front.clone(),
            back: self.back.clone(),
            example: self.example.clone(),
            alt_form: self.alt_form.clone(),
        }
    }

    /// Case-insensitive match on the French term, substring match on the Darija term
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        self.front.to_lowercase().contains(&query.to_lowercase()) || self.back.contains(query)
    }
}

/// Next free id for a collection
pub fn next_id(cards: &[Card]) -> CardId {
    cards.iter().map(|c| c.id).max().unwrap_or(0) + 1
}

/// Flat JSON form of a card, compatible with exports that predate the
/// scheduling fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardRecord {
    id: CardId,
    word_fr: String,
    word_ar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    arabic_classic: Option<String>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repetitions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ease_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_review: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_reviewed: Option<DateTime<Utc>>,
}

impl TryFrom<CardRecord> for Card {
    type Error = String;

    fn try_from(record: CardRecord) -> std::result::Result<Self, Self::Error> {
        // A record is only scheduled once it carries a review date
        let schedule = match record.next_review {
            Some(next_review) => {
                let interval = record.interval.unwrap_or(1).clamp(1, MAX_INTERVAL);
                let last_reviewed = match record.last_reviewed {
                    Some(last_reviewed) => last_reviewed,
                    None => next_review
                        .checked_sub_signed(Duration::days(interval as i64))
                        .ok_or_else(|| format!("card {}: nextReview out of range", record.id))?,
                };
                Schedule::Scheduled(ScheduleState {
                    repetitions: record.repetitions.unwrap_or(0),
                    ease_factor: record
                        .ease_factor
                        .unwrap_or(DEFAULT_EASE_FACTOR)
                        .max(MIN_EASE_FACTOR),
                    interval,
                    next_review,
                    last_reviewed,
                })
            }
            None => Schedule::Unscheduled,
        };

        Ok(Card {
            id: record.id,
            front: record.word_fr,
            back: record.word_ar,
            example: non_blank(record.example),
            alt_form: non_blank(record.arabic_classic),
            created_at: record.created_at,
            schedule,
        })
    }
}

impl From<Card> for CardRecord {
    fn from(card: Card) -> Self {
        let state = card.schedule.state();
        CardRecord {
            id: card.id,
            word_fr: card.front,
            word_ar: card.back,
            example: card.example,
            arabic_classic: card.alt_form,
            created_at: card.created_at,
            repetitions: state.map(|s| s.repetitions),
            ease_factor: state.map(|s| s.ease_factor),
            interval: state.map(|s| s.interval),
            next_review: state.map(|s| s.next_review),
            last_reviewed: state.map(|s| s.last_reviewed),
        }
    }
}

/// Starter deck installed on first run
pub fn sample_cards(now: DateTime<Utc>) -> Vec<Card> {
    const SAMPLES: [(&str, &str, &str, &str); 15] = [
        ("Bonjour", "السلام عليكم", "السلام عليكم، كيف حالك؟ - Bonjour, comment vas-tu ?", "مرحبا"),
        ("Merci", "شكرا", "شكرا بزاف - Merci beaucoup", "شكرا لك"),
        ("Pain", "خبز", "بغيت شوية ديال الخبز - Je veux un peu de pain", "خبز"),
        ("Eau", "ما", "عطيني كاس ديال الما - Donne-moi un verre d'eau", "ماء"),
        ("Maison", "دار", "غادي نمشي للدار - Je vais rentrer à la maison", "بيت / منزل"),
        ("Comment", "كيفاش", "كيفاش غادي نمشيو؟ - Comment allons-nous y aller ?", "كيف"),
        ("Maintenant", "دابا", "خاصني نمشي دابا - Je dois partir maintenant", "الآن"),
        ("Demain", "غدا", "نشوفوك غدا إن شاء الله - On se voit demain si Dieu le veut", "غدا"),
        ("Ami", "صاحب", "هذا صاحبي - C'est mon ami", "صديق"),
        ("Argent", "فلوس", "ما عنديش الفلوس - Je n'ai pas d'argent", "مال / نقود"),
        ("Travail", "خدمة", "غادي للخدمة - Je vais au travail", "عمل"),
        ("Manger", "كلا", "بغيت ناكل شي حاجة - Je veux manger quelque chose", "أكل"),
        ("Dormir", "نعس", "بغيت ننعس شوية - Je veux dormir un peu", "نام"),
        ("Grand", "كبير", "هاد الدار كبيرة بزاف - Cette maison est très grande", "كبير"),
        ("Petit", "صغير", "عندي واحد الكلب صغير - J'ai un petit chien", "صغير"),
    ];

    SAMPLES
        .iter()
        .zip(1..)
        .map(|((front, back, example, alt_form), id)| {
            let fields = CardFields::new(front, back)
                .with_example(example)
                .with_alt_form(alt_form);
            Card::new(id, fields, now)
        })
        .collect()
}
