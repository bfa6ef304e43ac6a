//! Source URL types - the output of the classifier.

use serde::{Deserialize, Serialize};

/// A supported content platform.
///
/// There is deliberately no `Unknown` variant: a URL that matches no
/// platform is a `ClassifyError::UnsupportedPlatform`, so every
/// `Platform` value in the pipeline is a platform we can extract from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Douyin,
    Bilibili,
    Xiaohongshu,
    Zhihu,
}

impl Platform {
    /// All platforms in classifier priority order.
    pub const ALL: [Platform; 4] = [
        Platform::Douyin,
        Platform::Bilibili,
        Platform::Xiaohongshu,
        Platform::Zhihu,
    ];

    /// Stable lowercase name, used in node labels and rendered output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Douyin => "douyin",
            Platform::Bilibili => "bilibili",
            Platform::Xiaohongshu => "xiaohongshu",
            Platform::Zhihu => "zhihu",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified source URL.
///
/// Created by the classifier and immutable afterwards. `canonical_id` is
/// the platform-specific resource identifier extracted from the URL; for
/// short-link forms it is the share slug until the extractor resolves the
/// redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUrl {
    /// The raw input URL, untouched.
    pub raw: String,

    /// Which platform the URL belongs to.
    pub platform: Platform,

    /// Platform-specific resource identifier.
    pub canonical_id: String,

    /// True when `canonical_id` came from a short link and still needs
    /// redirect resolution by the extractor.
    pub is_short_link: bool,
}

impl SourceUrl {
    pub fn new(
        raw: impl Into<String>,
        platform: Platform,
        canonical_id: impl Into<String>,
    ) -> Self {
        Self {
            raw: raw.into(),
            platform,
            canonical_id: canonical_id.into(),
            is_short_link: false,
        }
    }

    /// Mark the canonical id as a provisional short-link slug.
    pub fn short_link(mut self) -> Self {
        self.is_short_link = true;
        self
    }
}
