//! Platform extractors and the dispatch registry.
//!
//! One extractor per platform, registered in a fixed table keyed by the
//! platform enum. The exhaustive match means adding a platform without
//! an extractor is a compile error, not a runtime surprise.

pub mod bilibili;
pub mod douyin;
mod parse;
pub mod xiaohongshu;
pub mod zhihu;

pub use bilibili::BilibiliExtractor;
pub use douyin::DouyinExtractor;
pub use xiaohongshu::XiaohongshuExtractor;
pub use zhihu::ZhihuExtractor;

use crate::traits::extractor::Extractor;
use crate::types::url::Platform;

static DOUYIN: DouyinExtractor = DouyinExtractor;
static BILIBILI: BilibiliExtractor = BilibiliExtractor;
static XIAOHONGSHU: XiaohongshuExtractor = XiaohongshuExtractor;
static ZHIHU: ZhihuExtractor = ZhihuExtractor;

/// Look up the extractor for a platform.
pub fn extractor_for(platform: Platform) -> &'static dyn Extractor {
    match platform {
        Platform::Douyin => &DOUYIN,
        Platform::Bilibili => &BILIBILI,
        Platform::Xiaohongshu => &XIAOHONGSHU,
        Platform::Zhihu => &ZHIHU,
    }
}
