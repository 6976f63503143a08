//! MCP tool request types with JSON Schema for AI parameter generation

use schemars::JsonSchema;
use serde::Deserialize;
use shelfmark_core::{AttachmentRequest, ItemDraft};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct SaveToZoteroRequest {
    #[schemars(description = "Item title")]
    pub title: String,
    #[schemars(
        description = "Type of item: article, journal, book, chapter, conference, thesis, report, webpage, blog, news, magazine, document, legal, case, patent, video, podcast, presentation. Defaults to webpage"
    )]
    pub item_type: Option<String>,
    #[schemars(
        description = "Author names, e.g. [\"John Smith\", \"World Health Organization\"]"
    )]
    pub authors: Option<Vec<String>>,
    #[schemars(description = "Publication date, e.g. 2025-07-25, July 2025 or 2025")]
    pub date: Option<String>,
    #[schemars(description = "URL of the item")]
    pub url: Option<String>,
    #[serde(rename = "abstract")]
    #[schemars(description = "Abstract or summary")]
    pub abstract_note: Option<String>,
    #[schemars(description = "Journal, publication or website name")]
    pub publication: Option<String>,
    #[schemars(description = "Volume number")]
    pub volume: Option<String>,
    #[schemars(description = "Issue number")]
    pub issue: Option<String>,
    #[schemars(description = "Page range, e.g. 1-10")]
    pub pages: Option<String>,
    #[schemars(description = "DOI identifier")]
    pub doi: Option<String>,
    #[schemars(description = "2-5 descriptive tags")]
    pub tags: Option<Vec<String>>,
    #[schemars(description = "Collection key from list_zotero_collections")]
    pub collection_id: Option<String>,
    #[schemars(description = "URL of a PDF to attach (preferred over snapshot_url)")]
    pub pdf_url: Option<String>,
    #[schemars(description = "URL of a web page to attach as an HTML snapshot")]
    pub snapshot_url: Option<String>,
    #[schemars(description = "Additional notes for the Extra field")]
    pub extra: Option<String>,
}

impl SaveToZoteroRequest {
    pub fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            title: self.title.clone(),
            authors: self.authors.clone().unwrap_or_default(),
            date: self.date.clone(),
            url: self.url.clone(),
            abstract_note: self.abstract_note.clone(),
            publication: self.publication.clone(),
            volume: self.volume.clone(),
            issue: self.issue.clone(),
            pages: self.pages.clone(),
            doi: self.doi.clone(),
            tags: self.tags.clone().unwrap_or_default(),
            collection: self.collection_id.clone(),
            extra: self.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AttachPdfRequest {
    #[schemars(description = "Key of the parent item to attach to")]
    pub parent_item_key: String,
    #[schemars(description = "URL to download the PDF from")]
    pub pdf_url: String,
    #[schemars(description = "Filename for the attachment (derived from the download if omitted)")]
    pub filename: Option<String>,
}

impl From<AttachPdfRequest> for AttachmentRequest {
    fn from(req: AttachPdfRequest) -> Self {
        AttachmentRequest::new(req.parent_item_key, req.pdf_url).with_filename(req.filename)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AttachSnapshotRequest {
    #[schemars(description = "Key of the parent item, as returned by save_to_zotero")]
    pub parent_item_key: String,
    #[schemars(description = "URL of the web page to snapshot")]
    pub url: String,
    #[schemars(description = "Snapshot title (taken from the page if omitted)")]
    pub title: Option<String>,
}

impl From<AttachSnapshotRequest> for AttachmentRequest {
    fn from(req: AttachSnapshotRequest) -> Self {
        AttachmentRequest::new(req.parent_item_key, req.url).with_title(req.title)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PrepareUrlRequest {
    #[schemars(description = "URL you want to save to Zotero")]
    pub url: String,
}
