use serde::{Deserialize, Serialize};

/// One typed fragment of message content.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text {
        text: String,
    },
    /// Visible intermediate reasoning, kept apart from the answer text.
    Reasoning {
        text: String,
    },
    File {
        url: String,
        #[serde(rename = "mediaType")]
        media_type: String,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn reasoning(text: impl Into<String>) -> Self {
        Part::Reasoning { text: text.into() }
    }

    pub fn file(url: impl Into<String>, media_type: impl Into<String>) -> Self {
        Part::File {
            url: url.into(),
            media_type: media_type.into(),
        }
    }
}
