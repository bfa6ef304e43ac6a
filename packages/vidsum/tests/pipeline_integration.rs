//! End-to-end pipeline scenarios over mocked collaborators.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use vidsum::{
    ErrorKind, FetchRequest, FetchResponse, Fetcher, MockFetcher, MockOcr, NodeType, OcrResult,
    Pipeline, PipelineConfig, PipelineResult, RejectReason, RetryConfig,
};

const BILI_VIEW: &str = "https://api.bilibili.com/x/web-interface/view?bvid=BV1xx411c7mD";

fn bilibili_view_payload() -> String {
    serde_json::json!({
        "code": 0,
        "message": "0",
        "data": {
            "title": "Rust 所有权完全指南",
            "desc": "本视频系统讲解Rust语言的所有权与借用检查机制，并配有完整的代码示例。\n第二部分介绍生命周期标注的常见错误以及排查思路。",
            "duration": 1200,
            "pubdate": 1700000000,
            "owner": {"name": "编程up主"},
            "stat": {"view": 54321, "like": 999},
            "pic": "https://i0.hdslb.com/cover.jpg",
            "pages": [{"page": 1, "part": "正片"}],
            "bvid": "BV1xx411c7mD"
        }
    })
    .to_string()
}

fn fast_config() -> PipelineConfig {
    PipelineConfig::new().with_retry(RetryConfig {
        max_attempts: 2,
        initial_backoff_ms: 1,
        max_backoff_ms: 4,
    })
}

#[tokio::test]
async fn bilibili_primary_extraction_is_accepted() {
    let fetcher = MockFetcher::new()
        .with_response(BILI_VIEW, FetchResponse::ok(bilibili_view_payload(), BILI_VIEW));
    let pipeline = Pipeline::new(fetcher, MockOcr::new());

    let result = pipeline
        .process_video(
            "https://www.bilibili.com/video/BV1xx411c7mD",
            "markdown",
            None,
        )
        .await;

    let PipelineResult::Accepted {
        graph,
        rendered_output,
    } = result
    else {
        panic!("expected accepted result, got {result:?}");
    };

    assert_eq!(graph.nodes_of_type(NodeType::Source).count(), 1);
    assert_eq!(graph.nodes_of_type(NodeType::Topic).count(), 1);
    assert!(graph.claim_count() >= 1);
    assert!(graph.validate());

    assert!(rendered_output.contains("# Rust 所有权完全指南"));
    assert!(rendered_output.contains("bilibili"));
    assert!(rendered_output.contains("primary"));
}

#[tokio::test]
async fn xiaohongshu_ocr_merges_only_confident_text() {
    let note_id = "65f0a1b2c3d4e5f601234567";
    let note_url = format!("https://www.xiaohongshu.com/explore/{note_id}");
    let state = serde_json::json!({
        "note": {
            "noteDetailMap": {
                note_id: {
                    "note": {
                        "title": "护肤笔记",
                        "desc": "看图中详细说明",
                        "user": {"nickname": "小红薯"},
                        "imageList": [
                            {"urlDefault": "https://sns-img.xhscdn.com/1.jpg"},
                            {"urlDefault": "https://sns-img.xhscdn.com/2.jpg"}
                        ]
                    }
                }
            }
        }
    });
    let page = format!("<html><body><script>window.__INITIAL_STATE__={state};</script></body></html>");

    let fetcher = MockFetcher::new()
        .with_response(note_url.as_str(), FetchResponse::ok(page, note_url.as_str()))
        .with_image("https://sns-img.xhscdn.com/1.jpg", vec![1, 2])
        .with_image("https://sns-img.xhscdn.com/2.jpg", vec![3, 4]);
    let ocr = MockOcr::new().with_results(vec![
        OcrResult {
            text: "每天坚持防晒是最重要也最省钱的护肤步骤，没有之一 #防晒".into(),
            confidence: 0.92,
        },
        OcrResult {
            text: "低置信度乱码".into(),
            confidence: 0.2,
        },
    ]);

    let pipeline = Pipeline::new(fetcher, ocr);
    let result = pipeline.process_video(&note_url, "markdown", None).await;

    let graph = result.graph().expect("expected a graph");

    // Native text exists, so the run stays primary.
    let rendered = result.rendered_output().unwrap();
    assert!(rendered.contains("primary"));

    // The confident OCR line became a claim (scaled by the OCR factor);
    // the low-confidence line is nowhere in the graph.
    let claims: Vec<_> = graph.nodes_of_type(NodeType::Claim).collect();
    assert!(claims.iter().any(|c| c.label.contains("防晒")));
    assert!(claims.iter().all(|c| !c.label.contains("乱码")));
    let ocr_claim = claims.iter().find(|c| c.label.contains("防晒")).unwrap();
    assert!((ocr_claim.confidence - 0.8).abs() < f32::EPSILON);

    // The OCR-only hashtag entity is present and scaled down.
    let entity = graph
        .nodes_of_type(NodeType::Entity)
        .find(|n| n.label == "防晒")
        .expect("OCR hashtag should become an entity");
    assert!((entity.confidence - 0.8).abs() < f32::EPSILON);
}

#[tokio::test]
async fn douyin_blocked_without_context_is_rejected_with_guidance() {
    let video_url = "https://www.douyin.com/video/7123456789012345678";
    let fetcher = MockFetcher::new().with_response(
        video_url,
        FetchResponse::ok("<html><body>请完成验证</body></html>", video_url),
    );
    let pipeline = Pipeline::new(fetcher, MockOcr::new()).with_config(fast_config());

    let result = pipeline.process_video(video_url, "markdown", None).await;

    let PipelineResult::Rejected { reason } = result else {
        panic!("expected rejection, got {result:?}");
    };
    match &reason {
        RejectReason::ExtractionFailed {
            kind, guidance, ..
        } => {
            assert_eq!(*kind, ErrorKind::Blocked);
            assert!(guidance.as_deref().unwrap().contains("context_text"));
        }
        other => panic!("expected extraction failure, got {other:?}"),
    }
    // The human-readable reason carries the guidance too.
    assert!(reason.to_string().contains("context_text"));
}

#[tokio::test]
async fn douyin_blocked_with_context_degrades() {
    let video_url = "https://www.douyin.com/video/7123456789012345678";
    let fetcher = MockFetcher::new().with_response(
        video_url,
        FetchResponse::ok("<html><body>请完成验证</body></html>", video_url),
    );
    let pipeline = Pipeline::new(fetcher, MockOcr::new()).with_config(fast_config());

    let context = "这个视频详细讲解了如何在一周内养成晨跑的习惯，并给出了循序渐进的计划。\n\n第二部分分享了三个坚持下来的心理技巧。";
    let result = pipeline
        .process_video(video_url, "markdown", Some(context))
        .await;

    let PipelineResult::Degraded {
        graph,
        rendered_output,
        warnings,
    } = result
    else {
        panic!("expected degraded result, got {result:?}");
    };

    assert!(warnings.iter().any(|w| w.contains("context-assisted")));
    assert!(rendered_output.contains("## 警告"));
    assert!(rendered_output.contains("context-assisted"));
    assert!(graph.claim_count() >= 1);

    // Context-assisted confidence base is 0.6.
    let claim = graph.nodes_of_type(NodeType::Claim).next().unwrap();
    assert!((claim.confidence - 0.6).abs() < f32::EPSILON);
}

#[tokio::test]
async fn rate_limited_extraction_retries_then_rejects() {
    let fetcher = MockFetcher::new().with_status(BILI_VIEW, 429);
    let pipeline = Pipeline::new(fetcher, MockOcr::new()).with_config(fast_config());

    let result = pipeline
        .process_video(
            "https://www.bilibili.com/video/BV1xx411c7mD",
            "markdown",
            None,
        )
        .await;

    match result {
        PipelineResult::Rejected {
            reason: RejectReason::ExtractionFailed { kind, .. },
        } => assert_eq!(kind, ErrorKind::RateLimited),
        other => panic!("expected rate-limited rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn zhihu_answer_end_to_end() {
    let url = "https://www.zhihu.com/question/12345/answer/67890";
    let state = serde_json::json!({
        "entities": {
            "answers": {
                "67890": {
                    "content": "<p>先从所有权模型学起，理解借用检查器为什么拒绝你的代码。</p><p>然后大量练习编写迭代器和错误处理，这是日常工作中最常用的部分。</p>",
                    "voteupCount": 2048,
                    "author": {"name": "资深答主"},
                    "question": {"title": "如何系统地学习 Rust？"}
                }
            }
        }
    });
    let page = format!("<html><body><script>window.__INITIAL_STATE__={state};</script></body></html>");
    let fetcher = MockFetcher::new().with_response(url, FetchResponse::ok(page, url));
    let pipeline = Pipeline::new(fetcher, MockOcr::new());

    let result = pipeline.process_video(url, "markdown", None).await;

    let PipelineResult::Accepted { graph, .. } = result else {
        panic!("expected accepted result, got {result:?}");
    };
    assert!(graph.claim_count() >= 2);
    assert!(graph
        .nodes_of_type(NodeType::Entity)
        .any(|n| n.label == "资深答主"));
}

/// A fetcher that hangs, to exercise mid-flight cancellation.
struct HangingFetcher;

#[async_trait]
impl Fetcher for HangingFetcher {
    async fn fetch(
        &self,
        _request: &FetchRequest,
    ) -> Result<FetchResponse, vidsum::FetchError> {
        tokio::time::sleep(std::time::Duration::from_secs(600)).await;
        unreachable!("cancelled before completion")
    }

    async fn fetch_bytes(&self, _request: &FetchRequest) -> Result<Vec<u8>, vidsum::FetchError> {
        tokio::time::sleep(std::time::Duration::from_secs(600)).await;
        unreachable!("cancelled before completion")
    }

    async fn resolve_redirect(&self, url: &str) -> Result<String, vidsum::FetchError> {
        Ok(url.to_string())
    }
}

#[tokio::test]
async fn cancellation_mid_flight_rejects_without_partial_result() {
    let pipeline = Pipeline::new(HangingFetcher, MockOcr::new());
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let result = pipeline
        .process_video_with_cancel(
            "https://www.bilibili.com/video/BV1xx411c7mD",
            "markdown",
            None,
            &cancel,
        )
        .await;

    assert!(matches!(
        result,
        PipelineResult::Rejected {
            reason: RejectReason::Cancelled
        }
    ));
    assert!(result.graph().is_none());
}
