//! Item types and the mapping from a draft to a Zotero item template.
//!
//! Each item type carries a static field schema. Fields a type does not have
//! are dropped when the template is built, so the API never sees them.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    JournalArticle,
    Book,
    BookSection,
    ConferencePaper,
    Thesis,
    Report,
    Webpage,
    BlogPost,
    NewspaperArticle,
    MagazineArticle,
    Document,
    Statute,
    Case,
    Patent,
    VideoRecording,
    Podcast,
    Presentation,
}

/// Field names an item type uses in the Zotero data model.
struct ItemSchema {
    title: &'static str,
    date: Option<&'static str>,
    publication: Option<&'static str>,
    volume: Option<&'static str>,
    issue: Option<&'static str>,
    pages: Option<&'static str>,
    doi: bool,
    creator_type: &'static str,
}

const SHORT_NAMES: &[(&str, ItemType)] = &[
    ("article", ItemType::JournalArticle),
    ("journal", ItemType::JournalArticle),
    ("book", ItemType::Book),
    ("chapter", ItemType::BookSection),
    ("conference", ItemType::ConferencePaper),
    ("thesis", ItemType::Thesis),
    ("report", ItemType::Report),
    ("webpage", ItemType::Webpage),
    ("blog", ItemType::BlogPost),
    ("news", ItemType::NewspaperArticle),
    ("magazine", ItemType::MagazineArticle),
    ("document", ItemType::Document),
    ("legal", ItemType::Statute),
    ("case", ItemType::Case),
    ("patent", ItemType::Patent),
    ("video", ItemType::VideoRecording),
    ("podcast", ItemType::Podcast),
    ("presentation", ItemType::Presentation),
];

const ALL: &[ItemType] = &[
    ItemType::JournalArticle,
    ItemType::Book,
    ItemType::BookSection,
    ItemType::ConferencePaper,
    ItemType::Thesis,
    ItemType::Report,
    ItemType::Webpage,
    ItemType::BlogPost,
    ItemType::NewspaperArticle,
    ItemType::MagazineArticle,
    ItemType::Document,
    ItemType::Statute,
    ItemType::Case,
    ItemType::Patent,
    ItemType::VideoRecording,
    ItemType::Podcast,
    ItemType::Presentation,
];

impl ItemType {
    /// Short names accepted from agents, in display order.
    pub fn short_names() -> Vec<&'static str> {
        SHORT_NAMES.iter().map(|(name, _)| *name).collect()
    }

    /// Name used by the Zotero API (`itemType`).
    pub fn zotero_name(&self) -> &'static str {
        match self {
            ItemType::JournalArticle => "journalArticle",
            ItemType::Book => "book",
            ItemType::BookSection => "bookSection",
            ItemType::ConferencePaper => "conferencePaper",
            ItemType::Thesis => "thesis",
            ItemType::Report => "report",
            ItemType::Webpage => "webpage",
            ItemType::BlogPost => "blogPost",
            ItemType::NewspaperArticle => "newspaperArticle",
            ItemType::MagazineArticle => "magazineArticle",
            ItemType::Document => "document",
            ItemType::Statute => "statute",
            ItemType::Case => "case",
            ItemType::Patent => "patent",
            ItemType::VideoRecording => "videoRecording",
            ItemType::Podcast => "podcast",
            ItemType::Presentation => "presentation",
        }
    }

    fn schema(&self) -> ItemSchema {
        let base = ItemSchema {
            title: "title",
            date: Some("date"),
            publication: None,
            volume: None,
            issue: None,
            pages: None,
            doi: false,
            creator_type: "author",
        };
        match self {
            ItemType::JournalArticle => ItemSchema {
                publication: Some("publicationTitle"),
                volume: Some("volume"),
                issue: Some("issue"),
                pages: Some("pages"),
                doi: true,
                ..base
            },
            ItemType::Book => ItemSchema {
                volume: Some("volume"),
                ..base
            },
            ItemType::BookSection => ItemSchema {
                publication: Some("bookTitle"),
                volume: Some("volume"),
                pages: Some("pages"),
                ..base
            },
            ItemType::ConferencePaper => ItemSchema {
                publication: Some("proceedingsTitle"),
                volume: Some("volume"),
                pages: Some("pages"),
                doi: true,
                ..base
            },
            ItemType::Thesis | ItemType::Document => base,
            ItemType::Report => ItemSchema {
                pages: Some("pages"),
                ..base
            },
            ItemType::Webpage => ItemSchema {
                publication: Some("websiteTitle"),
                ..base
            },
            ItemType::BlogPost => ItemSchema {
                publication: Some("blogTitle"),
                ..base
            },
            ItemType::NewspaperArticle => ItemSchema {
                publication: Some("publicationTitle"),
                pages: Some("pages"),
                ..base
            },
            ItemType::MagazineArticle => ItemSchema {
                publication: Some("publicationTitle"),
                volume: Some("volume"),
                issue: Some("issue"),
                pages: Some("pages"),
                ..base
            },
            ItemType::Statute => ItemSchema {
                title: "nameOfAct",
                date: Some("dateEnacted"),
                pages: Some("pages"),
                ..base
            },
            ItemType::Case => ItemSchema {
                title: "caseName",
                date: Some("dateDecided"),
                publication: Some("reporter"),
                volume: Some("reporterVolume"),
                pages: Some("firstPage"),
                ..base
            },
            ItemType::Patent => ItemSchema {
                date: Some("issueDate"),
                pages: Some("pages"),
                creator_type: "inventor",
                ..base
            },
            ItemType::VideoRecording => ItemSchema {
                volume: Some("volume"),
                creator_type: "director",
                ..base
            },
            ItemType::Podcast => ItemSchema {
                date: None,
                publication: Some("seriesTitle"),
                creator_type: "podcaster",
                ..base
            },
            ItemType::Presentation => ItemSchema {
                publication: Some("meetingName"),
                creator_type: "presenter",
                ..base
            },
        }
    }
}

impl FromStr for ItemType {
    type Err = RecordError;

    /// Accepts a short name (`article`) or the Zotero name (`journalArticle`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        SHORT_NAMES
            .iter()
            .find(|(name, _)| *name == needle)
            .map(|(_, item_type)| *item_type)
            .or_else(|| {
                ALL.iter()
                    .copied()
                    .find(|t| t.zotero_name().to_lowercase() == needle)
            })
            .ok_or_else(|| {
                RecordError::InvalidTemplate(format!(
                    "Unknown item type '{}'. Options: {}",
                    s,
                    Self::short_names().join(", ")
                ))
            })
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.zotero_name())
    }
}

/// Metadata supplied by the caller for a new record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDraft {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub date: Option<String>,
    pub url: Option<String>,
    pub abstract_note: Option<String>,
    pub publication: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub collection: Option<String>,
    pub extra: Option<String>,
}

fn set_opt(map: &mut Map<String, Value>, field: Option<&str>, value: &Option<String>) {
    if let (Some(field), Some(value)) = (field, value.as_deref()) {
        let value = value.trim();
        if !value.is_empty() {
            map.insert(field.to_string(), Value::String(value.to_string()));
        }
    }
}

/// "Ada King Lovelace" becomes first "Ada King", last "Lovelace";
/// a single token is kept as a single-field name.
fn creator(name: &str, creator_type: &str) -> Value {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.split_last() {
        Some((last, first)) if !first.is_empty() => json!({
            "creatorType": creator_type,
            "firstName": first.join(" "),
            "lastName": last,
        }),
        _ => json!({
            "creatorType": creator_type,
            "name": name.trim(),
        }),
    }
}

impl ItemDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Build the JSON template for `item_type`, dropping fields the type lacks.
    pub fn to_template(&self, item_type: ItemType) -> Result<Value, RecordError> {
        if self.title.trim().is_empty() {
            return Err(RecordError::InvalidTemplate(
                "title must not be empty".to_string(),
            ));
        }

        let schema = item_type.schema();
        let mut map = Map::new();
        map.insert(
            "itemType".to_string(),
            Value::String(item_type.zotero_name().to_string()),
        );
        map.insert(
            schema.title.to_string(),
            Value::String(self.title.trim().to_string()),
        );

        set_opt(&mut map, schema.date, &self.date);
        set_opt(&mut map, Some("url"), &self.url);
        set_opt(&mut map, Some("abstractNote"), &self.abstract_note);
        set_opt(&mut map, schema.publication, &self.publication);
        set_opt(&mut map, schema.volume, &self.volume);
        set_opt(&mut map, schema.issue, &self.issue);
        set_opt(&mut map, schema.pages, &self.pages);
        set_opt(&mut map, schema.doi.then_some("DOI"), &self.doi);
        set_opt(&mut map, Some("extra"), &self.extra);

        let creators: Vec<Value> = self
            .authors
            .iter()
            .filter(|a| !a.trim().is_empty())
            .map(|a| creator(a, schema.creator_type))
            .collect();
        map.insert("creators".to_string(), Value::Array(creators));

        let tags: Vec<Value> = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| json!({ "tag": t }))
            .collect();
        map.insert("tags".to_string(), Value::Array(tags));

        let collections: Vec<Value> = self
            .collection
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(|c| Value::String(c.to_string()))
            .collect();
        map.insert("collections".to_string(), Value::Array(collections));

        Ok(Value::Object(map))
    }
}
