use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload kind of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Audio,
    Image,
    Pdf,
    Discussion,
}

impl ContentType {
    pub const ALL: &[ContentType] = &[
        ContentType::Text,
        ContentType::Audio,
        ContentType::Image,
        ContentType::Pdf,
        ContentType::Discussion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Audio => "audio",
            ContentType::Image => "image",
            ContentType::Pdf => "pdf",
            ContentType::Discussion => "discussion",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(ContentType::Text),
            "audio" => Some(ContentType::Audio),
            "image" => Some(ContentType::Image),
            "pdf" => Some(ContentType::Pdf),
            "discussion" => Some(ContentType::Discussion),
            _ => None,
        }
    }

    /// Fixed label shown in place of the body. `None` means the stored body is shown.
    pub fn display_label(&self) -> Option<&'static str> {
        match self {
            ContentType::Text => None,
            ContentType::Audio => Some("audio comment"),
            ContentType::Image => Some("image comment"),
            ContentType::Pdf => Some("pdf document"),
            ContentType::Discussion => Some("discussion comment"),
        }
    }

    pub fn has_attachment(&self) -> bool {
        match self {
            ContentType::Audio | ContentType::Image | ContentType::Pdf => true,
            ContentType::Text | ContentType::Discussion => false,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical format of a stored attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentFormat {
    Wav,
    Gif,
    Jpg,
    Pdf,
}

impl AttachmentFormat {
    /// Extension including the leading dot, as persisted.
    pub fn extension(&self) -> &'static str {
        match self {
            AttachmentFormat::Wav => ".wav",
            AttachmentFormat::Gif => ".gif",
            AttachmentFormat::Jpg => ".jpg",
            AttachmentFormat::Pdf => ".pdf",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".wav" => Some(AttachmentFormat::Wav),
            ".gif" => Some(AttachmentFormat::Gif),
            ".jpg" => Some(AttachmentFormat::Jpg),
            ".pdf" => Some(AttachmentFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for AttachmentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
