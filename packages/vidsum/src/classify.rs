//! URL classifier - maps an input URL to a platform and canonical id.
//!
//! Platforms are matched in a fixed priority order (Douyin, Bilibili,
//! Xiaohongshu, Zhihu); the first matching pattern wins. A URL matching
//! no pattern is `UnsupportedPlatform`, which the pipeline surfaces as a
//! terminal rejection, not a retryable error. No side effects.

use regex::Regex;
use tracing::debug;

use crate::error::ClassifyError;
use crate::types::url::{Platform, SourceUrl};

struct UrlPattern {
    platform: Platform,
    pattern: &'static str,

    /// Short-link form: the captured id is a share slug that the
    /// extractor must resolve via redirect before use.
    short_link: bool,
}

/// Known URL shapes, priority order. Multi-capture patterns (the Zhihu
/// answer form) join their captures with `-` to form the canonical id.
const PATTERNS: &[UrlPattern] = &[
    // Douyin
    UrlPattern {
        platform: Platform::Douyin,
        pattern: r"^https?://(?:www\.)?douyin\.com/video/(\d+)",
        short_link: false,
    },
    UrlPattern {
        platform: Platform::Douyin,
        pattern: r"^https?://v\.douyin\.com/([A-Za-z0-9_-]+)/?",
        short_link: true,
    },
    UrlPattern {
        platform: Platform::Douyin,
        pattern: r"^https?://(?:www\.)?iesdouyin\.com/share/video/(\d+)",
        short_link: false,
    },
    UrlPattern {
        platform: Platform::Douyin,
        pattern: r"^https?://(?:www\.)?douyin\.com/user/.*modal_id=(\d+)",
        short_link: false,
    },
    // Bilibili
    UrlPattern {
        platform: Platform::Bilibili,
        pattern: r"^https?://(?:www\.)?bilibili\.com/video/([A-Za-z0-9]+)",
        short_link: false,
    },
    UrlPattern {
        platform: Platform::Bilibili,
        pattern: r"^https?://b23\.tv/([A-Za-z0-9]+)",
        short_link: true,
    },
    // Xiaohongshu
    UrlPattern {
        platform: Platform::Xiaohongshu,
        pattern: r"^https?://(?:www\.)?xiaohongshu\.com/explore/([a-f0-9]+)",
        short_link: false,
    },
    UrlPattern {
        platform: Platform::Xiaohongshu,
        pattern: r"^https?://(?:www\.)?xiaohongshu\.com/discovery/item/([a-f0-9]+)",
        short_link: false,
    },
    UrlPattern {
        platform: Platform::Xiaohongshu,
        pattern: r"^https?://xhslink\.com/([A-Za-z0-9]+)",
        short_link: true,
    },
    // Zhihu
    UrlPattern {
        platform: Platform::Zhihu,
        pattern: r"^https?://(?:www\.)?zhihu\.com/question/(\d+)/answer/(\d+)",
        short_link: false,
    },
    UrlPattern {
        platform: Platform::Zhihu,
        pattern: r"^https?://(?:www\.)?zhihu\.com/question/(\d+)",
        short_link: false,
    },
    UrlPattern {
        platform: Platform::Zhihu,
        pattern: r"^https?://zhuanlan\.zhihu\.com/p/(\d+)",
        short_link: false,
    },
    UrlPattern {
        platform: Platform::Zhihu,
        pattern: r"^https?://(?:www\.)?zhihu\.com/pin/(\d+)",
        short_link: false,
    },
];

/// Classify a raw URL into a `SourceUrl`.
pub fn classify(url: &str) -> Result<SourceUrl, ClassifyError> {
    let trimmed = url.trim();

    for entry in PATTERNS {
        let re = Regex::new(entry.pattern).expect("static pattern must compile");
        if let Some(captures) = re.captures(trimmed) {
            let canonical_id = captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("-");

            debug!(
                url = %trimmed,
                platform = %entry.platform,
                canonical_id = %canonical_id,
                "URL classified"
            );

            let mut source = SourceUrl::new(trimmed, entry.platform, canonical_id);
            if entry.short_link {
                source = source.short_link();
            }
            return Ok(source);
        }
    }

    Err(ClassifyError::UnsupportedPlatform {
        url: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_douyin_shapes() {
        let full = classify("https://www.douyin.com/video/7123456789012345678").unwrap();
        assert_eq!(full.platform, Platform::Douyin);
        assert_eq!(full.canonical_id, "7123456789012345678");
        assert!(!full.is_short_link);

        let short = classify("https://v.douyin.com/iRst4Uab/").unwrap();
        assert_eq!(short.platform, Platform::Douyin);
        assert_eq!(short.canonical_id, "iRst4Uab");
        assert!(short.is_short_link);

        let share = classify("https://www.iesdouyin.com/share/video/7123456789012345678").unwrap();
        assert_eq!(share.canonical_id, "7123456789012345678");

        let modal =
            classify("https://www.douyin.com/user/MS4wLjAB?modal_id=7123456789012345678").unwrap();
        assert_eq!(modal.canonical_id, "7123456789012345678");
    }

    #[test]
    fn test_bilibili_shapes() {
        let full = classify("https://www.bilibili.com/video/BV1234567890").unwrap();
        assert_eq!(full.platform, Platform::Bilibili);
        assert_eq!(full.canonical_id, "BV1234567890");

        let short = classify("https://b23.tv/abc123").unwrap();
        assert!(short.is_short_link);
        assert_eq!(short.canonical_id, "abc123");
    }

    #[test]
    fn test_xiaohongshu_shapes() {
        let explore = classify("https://www.xiaohongshu.com/explore/65f0a1b2c3d4e5f601234567").unwrap();
        assert_eq!(explore.platform, Platform::Xiaohongshu);
        assert_eq!(explore.canonical_id, "65f0a1b2c3d4e5f601234567");

        let item =
            classify("https://www.xiaohongshu.com/discovery/item/65f0a1b2c3d4e5f601234567").unwrap();
        assert_eq!(item.platform, Platform::Xiaohongshu);

        let short = classify("https://xhslink.com/AbCdEf").unwrap();
        assert!(short.is_short_link);
    }

    #[test]
    fn test_zhihu_shapes() {
        let answer = classify("https://www.zhihu.com/question/12345/answer/67890").unwrap();
        assert_eq!(answer.platform, Platform::Zhihu);
        assert_eq!(answer.canonical_id, "12345-67890");

        let question = classify("https://www.zhihu.com/question/12345").unwrap();
        assert_eq!(question.canonical_id, "12345");

        let article = classify("https://zhuanlan.zhihu.com/p/445566").unwrap();
        assert_eq!(article.canonical_id, "445566");

        let pin = classify("https://www.zhihu.com/pin/778899").unwrap();
        assert_eq!(pin.canonical_id, "778899");
    }

    #[test]
    fn test_unsupported_platform() {
        let err = classify("https://www.youtube.com/watch?v=abc").unwrap_err();
        assert!(matches!(err, ClassifyError::UnsupportedPlatform { .. }));

        assert!(classify("not a url at all").is_err());
        assert!(classify("").is_err());
    }

    #[test]
    fn test_priority_is_first_match() {
        // A Douyin URL never falls through to a later platform.
        let source = classify("https://www.douyin.com/video/111").unwrap();
        assert_eq!(source.platform, Platform::Douyin);
    }
}
