//! Workflow guidance returned by the help tools.

use serde::Serialize;
use shelfmark_ingest::resolve;

#[derive(Debug, Clone, Serialize)]
pub struct Workflow {
    pub step1_fetch: &'static str,
    pub step2_extract: &'static str,
    pub step3_find_collection: &'static str,
    pub step4_assess_confidence: &'static str,
    pub step5_save: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelpResponse {
    pub workflow: Workflow,
    pub available_tools: Vec<&'static str>,
    pub tips: Vec<&'static str>,
}

/// Fetch instructions for one URL.
#[derive(Debug, Clone, Serialize)]
pub struct UrlPreparation {
    pub url: String,
    /// `url` with renderer/proxy wrappers removed.
    pub resolved_url: String,
    pub is_pdf: bool,
    pub instructions: String,
    pub next_steps: Vec<String>,
}

pub fn help() -> HelpResponse {
    HelpResponse {
        workflow: Workflow {
            step1_fetch: "Use your own fetch tools (web_fetch, read_url or similar) to read the URL. \
                          Avoid opening browser tabs just to read content.",
            step2_extract: "Extract title, authors (organizations are fine), date, abstract \
                            (write one if missing), publisher or website name, and 2-5 tags.",
            step3_find_collection: "Call list_zotero_collections to find the right collection. \
                                    If several match and the user did not say, ask.",
            step4_assess_confidence: "If the metadata is clear, proceed. If you guessed fields \
                                      or wrote the abstract, ask the user to confirm first.",
            step5_save: "Call save_to_zotero with the metadata. Include pdf_url when a PDF is \
                         available, otherwise snapshot_url for web pages.",
        },
        available_tools: vec![
            "save_to_zotero - Save an item with metadata and an attachment",
            "list_zotero_collections - Find collection keys",
            "get_zotero_item_types - See valid item types",
            "attach_pdf_from_url - Add a PDF to an existing item",
            "attach_snapshot - Add a web page snapshot to an existing item",
            "prepare_url_for_zotero - Get fetch instructions for a URL",
        ],
        tips: vec![
            "Always include 2-5 descriptive tags",
            "Write an abstract if the source lacks one",
            "Authors can be organizations like 'World Health Organization'",
            "Use pdf_url for documents and snapshot_url for web pages",
        ],
    }
}

/// Whether `url` looks like a direct PDF link.
pub fn looks_like_pdf(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.ends_with(".pdf") || lower.contains("/pdf/")
}

pub fn prepare_url(url: &str) -> UrlPreparation {
    let resolved_url = resolve(url);
    let is_pdf = looks_like_pdf(&resolved_url);

    let instructions = if is_pdf {
        "This appears to be a PDF. Pass this URL as pdf_url to save_to_zotero to attach it, \
         and take metadata from the PDF or the page linking to it."
    } else {
        "Do not open a browser tab for this URL. Read it with your own fetch tool, \
         extract the metadata, then call save_to_zotero."
    };
    let attach_hint = if is_pdf {
        format!(" and pdf_url='{}'", resolved_url)
    } else {
        format!(" and snapshot_url='{}'", resolved_url)
    };

    UrlPreparation {
        url: url.to_string(),
        next_steps: vec![
            format!("1. Fetch content from {} using your own tools", resolved_url),
            "2. Extract title, authors, date, abstract and tags".to_string(),
            "3. Call list_zotero_collections to find the right collection".to_string(),
            format!("4. Call save_to_zotero with the metadata{}", attach_hint),
        ],
        resolved_url,
        is_pdf,
        instructions: instructions.to_string(),
    }
}
