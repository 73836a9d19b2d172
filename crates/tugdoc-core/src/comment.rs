//! Structured comments attached to reflections.
//!
//! Comments arrive already parsed from the comment producer. The store only
//! needs to keep their cross references intact: inline tags may point at a
//! reflection (remapped on load like any other reference) and relative links
//! point at a file registry entry.

use std::collections::BTreeSet;

use crate::ids::FileId;
use crate::types::ReferenceTarget;

/// Where an inline tag such as `{@link Foo}` points.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineTagTarget {
    Reflection(ReferenceTarget),
    Url(String),
}

/// A fragment of rendered comment text.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentDisplayPart {
    Text {
        text: String,
    },
    Code {
        text: String,
    },
    InlineTag {
        tag: String,
        text: String,
        target: Option<InlineTagTarget>,
    },
    RelativeLink {
        text: String,
        target: Option<FileId>,
        target_anchor: Option<String>,
    },
}

impl CommentDisplayPart {
    /// Plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        CommentDisplayPart::Text { text: text.into() }
    }

    /// Code span part.
    pub fn code(text: impl Into<String>) -> Self {
        CommentDisplayPart::Code { text: text.into() }
    }

    /// The visible text of this part.
    pub fn display_text(&self) -> &str {
        match self {
            CommentDisplayPart::Text { text }
            | CommentDisplayPart::Code { text }
            | CommentDisplayPart::InlineTag { text, .. }
            | CommentDisplayPart::RelativeLink { text, .. } => text,
        }
    }
}

/// Concatenate the visible text of a run of display parts.
pub fn combine_display_parts(parts: &[CommentDisplayPart]) -> String {
    parts.iter().map(CommentDisplayPart::display_text).collect()
}

/// A block tag such as `@returns` or `@param x`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentTag {
    pub tag: String,
    /// Parameter name for `@param`-style tags.
    pub name: Option<String>,
    pub content: Vec<CommentDisplayPart>,
}

impl CommentTag {
    pub fn new(tag: impl Into<String>, content: Vec<CommentDisplayPart>) -> Self {
        CommentTag {
            tag: tag.into(),
            name: None,
            content,
        }
    }
}

/// A parsed comment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comment {
    pub summary: Vec<CommentDisplayPart>,
    pub block_tags: Vec<CommentTag>,
    pub modifier_tags: BTreeSet<String>,
}

impl Comment {
    /// Comment with only a summary.
    pub fn new(summary: Vec<CommentDisplayPart>) -> Self {
        Comment {
            summary,
            ..Comment::default()
        }
    }

    /// True when nothing would render.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.block_tags.is_empty() && self.modifier_tags.is_empty()
    }

    pub fn has_modifier(&self, tag: &str) -> bool {
        self.modifier_tags.contains(tag)
    }

    /// First block tag named `tag`.
    pub fn get_tag(&self, tag: &str) -> Option<&CommentTag> {
        self.block_tags.iter().find(|t| t.tag == tag)
    }

    /// Every display part in the summary and block tags.
    pub fn display_parts(&self) -> impl Iterator<Item = &CommentDisplayPart> {
        self.summary
            .iter()
            .chain(self.block_tags.iter().flat_map(|t| t.content.iter()))
    }

    /// Every display part in the summary and block tags, mutably.
    pub fn display_parts_mut(&mut self) -> impl Iterator<Item = &mut CommentDisplayPart> {
        self.summary
            .iter_mut()
            .chain(self.block_tags.iter_mut().flat_map(|t| t.content.iter_mut()))
    }
}
