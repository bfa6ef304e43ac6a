//! Per-platform request strategies.
//!
//! Each platform gets differentiated request headers and pacing: some
//! require a mobile user agent or a referer to serve content at all,
//! and each tolerates a different request rate before tripping risk
//! control.

use governor::Quota;
use nonzero_ext::nonzero;

use crate::types::url::Platform;

const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MOBILE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1";

/// Request strategy for one platform.
#[derive(Debug, Clone)]
pub struct PlatformStrategy {
    pub user_agent: &'static str,

    /// Referer header value, for platforms that check it.
    pub referer: Option<&'static str>,

    pub accept_language: &'static str,

    /// Pacing quota for the platform.
    pub quota: Quota,
}

/// The strategy table. Douyin is the strictest (mobile UA, referer,
/// slow pacing); Zhihu is the most tolerant.
pub fn strategy_for(platform: Platform) -> PlatformStrategy {
    match platform {
        Platform::Douyin => PlatformStrategy {
            user_agent: MOBILE_UA,
            referer: Some("https://www.douyin.com/"),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8",
            quota: Quota::per_minute(nonzero!(8u32)),
        },
        Platform::Bilibili => PlatformStrategy {
            user_agent: DESKTOP_UA,
            referer: Some("https://www.bilibili.com/"),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8",
            quota: Quota::per_minute(nonzero!(30u32)),
        },
        Platform::Xiaohongshu => PlatformStrategy {
            user_agent: DESKTOP_UA,
            referer: Some("https://www.xiaohongshu.com/"),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8",
            quota: Quota::per_minute(nonzero!(12u32)),
        },
        Platform::Zhihu => PlatformStrategy {
            user_agent: DESKTOP_UA,
            referer: Some("https://www.zhihu.com/"),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8",
            quota: Quota::per_minute(nonzero!(20u32)),
        },
    }
}

/// Neutral strategy for requests not tied to a platform (image
/// downloads, redirect probes on unknown hosts).
pub fn default_strategy() -> PlatformStrategy {
    PlatformStrategy {
        user_agent: DESKTOP_UA,
        referer: None,
        accept_language: "zh-CN,zh;q=0.9,en;q=0.8",
        quota: Quota::per_minute(nonzero!(20u32)),
    }
}
