//! JSON export bundle and import validation

use crate::card::Card;
use crate::error::{Error, Result};
use crate::stats::Stats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;

pub const BUNDLE_VERSION: &str = "1.0";
pub const APP_NAME: &str = "Répétition Espacée - Arabe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub total_cards: usize,
    pub app_name: String,
}

/// Everything needed to restore a collection elsewhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    #[serde(deserialize_with = "deserialize_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
    pub cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl ExportBundle {
    pub fn new(cards: &[Card], stats: &Stats, now: DateTime<Utc>) -> Self {
        Self {
            version: BUNDLE_VERSION.to_string(),
            export_date: Some(now),
            cards: cards.to_vec(),
            stats: Some(stats.clone()),
            metadata: Some(Metadata {
                total_cards: cards.len(),
                app_name: APP_NAME.to_string(),
            }),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a bundle, requiring `version` and `cards` to be present
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Error::InvalidFormat(e.to_string()))?;

        if !is_present(value.get("version")) {
            return Err(Error::InvalidFormat("missing version".to_string()));
        }
        if !is_present(value.get("cards")) {
            return Err(Error::InvalidFormat("missing cards".to_string()));
        }

        serde_json::from_value(value).map_err(|e| Error::InvalidFormat(e.to_string()))
    }

    /// Default file name, e.g. `flashcards-export-2026-10-17.json`
    pub fn file_name(now: DateTime<Utc>) -> String {
        format!("flashcards-export-{}.json", now.format("%Y-%m-%d"))
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

/// Accept `"1.0"` as well as a bare `1.0`
fn deserialize_version<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(version) => Ok(version),
        Value::Number(version) => Ok(version.to_string()),
        other => Err(de::Error::custom(format!("invalid version: {other}"))),
    }
}

/// A validated bundle waiting for the user to confirm the replacement
#[derive(Debug, Clone)]
pub struct PendingImport {
    pub bundle: ExportBundle,
    /// Size of the collection that would be replaced
    pub current_cards: usize,
}

impl PendingImport {
    pub fn incoming_cards(&self) -> usize {
        self.bundle.cards.len()
    }

    pub fn export_date(&self) -> Option<DateTime<Utc>> {
        self.bundle.export_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::sample_cards;
    use crate::scheduler::Rating;

    fn now() -> DateTime<Utc> {
        "2026-10-17T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_new_bundle_metadata() {
        let cards = sample_cards(now());
        let bundle = ExportBundle::new(&cards, &Stats::default(), now());

        assert_eq!(bundle.version, "1.0");
        assert_eq!(bundle.export_date, Some(now()));
        let metadata = bundle.metadata.unwrap();
        assert_eq!(metadata.total_cards, 15);
        assert_eq!(metadata.app_name, APP_NAME);
    }

    #[test]
    fn test_json_shape() {
        let cards = sample_cards(now());
        let mut stats = Stats::default();
        stats.record_review(Rating::Easy, &now());
        let json = ExportBundle::new(&cards[..1], &stats, now()).to_json().unwrap();

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["exportDate"], "2026-10-17T09:00:00Z");
        assert_eq!(value["cards"][0]["wordFr"], "Bonjour");
        assert_eq!(value["metadata"]["totalCards"], 1);
        assert_eq!(value["stats"]["daily"]["2026-10-17"]["reviewed"], 1);
    }

    #[test]
    fn test_from_json_round_trip() {
        let cards = sample_cards(now());
        let bundle = ExportBundle::new(&cards, &Stats::default(), now());
        let parsed = ExportBundle::from_json(&bundle.to_json().unwrap()).unwrap();
        assert_eq!(parsed, bundle);
    }

    #[test]
    fn test_from_json_requires_version_and_cards() {
        let missing_version = r#"{"cards": []}"#;
        let empty_version = r#"{"version": "", "cards": []}"#;
        let missing_cards = r#"{"version": "1.0"}"#;
        let null_cards = r#"{"version": "1.0", "cards": null}"#;

        for json in [missing_version, empty_version, missing_cards, null_cards] {
            assert!(matches!(
                ExportBundle::from_json(json),
                Err(Error::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ExportBundle::from_json("not json"),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            ExportBundle::from_json(r#"{"version": "1.0", "cards": [{"id": "x"}]}"#),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_minimal_bundle() {
        let json = r#"{
            "version": "1.0",
            "cards": [
                {"id": 1, "wordFr": "Ami", "wordAr": "صاحب", "createdAt": "2026-10-01T08:00:00Z"}
            ]
        }"#;

        let bundle = ExportBundle::from_json(json).unwrap();
        assert_eq!(bundle.cards.len(), 1);
        assert!(bundle.stats.is_none());
        assert!(bundle.export_date.is_none());
    }

    #[test]
    fn test_numeric_version_is_accepted() {
        let bundle = ExportBundle::from_json(r#"{"version": 1.0, "cards": []}"#).unwrap();
        assert_eq!(bundle.version, "1.0");

        for json in [
            r#"{"version": 0, "cards": []}"#,
            r#"{"version": false, "cards": []}"#,
            r#"{"version": ["1.0"], "cards": []}"#,
        ] {
            assert!(matches!(
                ExportBundle::from_json(json),
                Err(Error::InvalidFormat(_))
            ));
        }
    }

    #[test]
    fn test_bundle_with_date_string_stats() {
        let json = r#"{
            "version": "1.0",
            "exportDate": "2026-10-17T09:00:00.000Z",
            "cards": [
                {
                    "id": 1760000000001,
                    "wordFr": "Merci",
                    "wordAr": "شكرا",
                    "example": "",
                    "arabicClassic": "",
                    "createdAt": "2026-10-01T08:00:00.000Z",
                    "repetitions": 2,
                    "easeFactor": 2.36,
                    "interval": 3,
                    "nextReview": "2026-10-20T09:00:00.000Z",
                    "lastReviewed": "2026-10-17T09:00:00.000Z"
                }
            ],
            "stats": {
                "daily": {"Sat Oct 17 2026": {"reviewed": 4, "correct": 3}},
                "lastReviewDate": "Sat Oct 17 2026"
            },
            "metadata": {"totalCards": 1, "appName": "Répétition Espacée - Arabe"}
        }"#;

        let bundle = ExportBundle::from_json(json).unwrap();
        assert_eq!(bundle.cards.len(), 1);
        assert_eq!(bundle.cards[0].schedule.state().unwrap().interval, 3);

        let stats = bundle.stats.unwrap();
        let day = chrono::NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(stats.reviewed_on(day), 4);
        assert_eq!(stats.success_rate(day), 75);
        assert_eq!(stats.last_review_date, Some(day));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            ExportBundle::file_name(now()),
            "flashcards-export-2026-10-17.json"
        );
    }
}
