//! Article and project records
//!
//! News articles and investment-project listings arrive as a list of
//! heterogeneous blocks keyed by a `type` field. They are parsed into
//! [`ContentBlock`] at the content store boundary so nothing downstream has
//! to deal with loosely-typed records.

use serde::{Deserialize, Serialize};

/// One block of article or project body content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A heading (level 1-3)
    Heading {
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    /// A paragraph of text
    Paragraph { text: String },
    /// A bulleted list
    Bullets { items: Vec<String> },
    /// A pull quote with optional attribution
    Quote {
        text: String,
        #[serde(default)]
        attribution: Option<String>,
    },
    /// An image reference
    Image {
        url: String,
        #[serde(default)]
        caption: Option<String>,
    },
    /// An outbound link
    Link { label: String, url: String },
    /// A headline figure, e.g. "Jobs created: 1,200"
    Stat { label: String, value: String },
    /// A horizontal rule
    Divider,
}

fn default_heading_level() -> u8 {
    2
}

impl ContentBlock {
    /// Estimate word count for this block
    pub fn word_count(&self) -> usize {
        match self {
            ContentBlock::Heading { text, .. }
            | ContentBlock::Paragraph { text }
            | ContentBlock::Quote { text, .. } => text.split_whitespace().count(),
            ContentBlock::Bullets { items } => {
                items.iter().map(|s| s.split_whitespace().count()).sum()
            }
            ContentBlock::Stat { label, value } => {
                label.split_whitespace().count() + value.split_whitespace().count()
            }
            ContentBlock::Link { label, .. } => label.split_whitespace().count(),
            ContentBlock::Image { .. } | ContentBlock::Divider => 0,
        }
    }

    /// Get plain text representation (if applicable)
    pub fn plain_text(&self) -> Option<String> {
        match self {
            ContentBlock::Heading { text, .. } | ContentBlock::Paragraph { text } => {
                Some(text.clone())
            }
            ContentBlock::Bullets { items } => {
                Some(items.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n"))
            }
            ContentBlock::Quote { text, attribution } => Some(match attribution {
                Some(who) => format!("\"{text}\" ({who})"),
                None => format!("\"{text}\""),
            }),
            ContentBlock::Image { caption, .. } => {
                caption.as_ref().filter(|c| !c.is_empty()).map(|c| format!("[Image: {c}]"))
            }
            ContentBlock::Link { label, url } => Some(format!("{label} <{url}>")),
            ContentBlock::Stat { label, value } => Some(format!("{label}: {value}")),
            ContentBlock::Divider => None,
        }
    }
}

/// Plain text for a body, one block per paragraph
pub fn body_text(blocks: &[ContentBlock]) -> String {
    blocks.iter().filter_map(ContentBlock::plain_text).collect::<Vec<_>>().join("\n\n")
}

/// A news or education article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Short teaser
    #[serde(default)]
    pub summary: Option<String>,
    /// Publication time (ms since epoch)
    #[serde(default)]
    pub published_at: i64,
    /// Body content
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

impl Article {
    /// Estimated reading time in minutes
    pub fn reading_time_minutes(&self) -> u32 {
        let words: usize = self.blocks.iter().map(ContentBlock::word_count).sum();
        // Average reading speed: 200 words per minute
        (words / 200).max(1) as u32
    }
}

/// An investment project listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: String,
    /// Project name
    pub name: String,
    /// City / state
    #[serde(default)]
    pub location: String,
    /// Project category (e.g. "Hospitality")
    #[serde(default)]
    pub category: String,
    /// Minimum investment in USD
    #[serde(default)]
    pub minimum_investment: Option<u64>,
    /// Whether the project sits in a targeted employment area
    #[serde(default)]
    pub targeted_employment_area: bool,
    /// Body content
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}
