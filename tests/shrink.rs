//! End-to-end tests of the router: middleware chain, dispatcher and envelope.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use shrinkimages::optimizer::{DEFAULT_QUALITY, OptimizationOptions};

mod common;

use common::{
    app, app_with, authorized, body_bytes, json, multipart, test_config, upload, Behavior,
    MockOptimizer, MockTransport, API_KEY, USER_AGENT,
};

const IMAGE: &[u8] = b"\x89PNG fake image bytes";

#[tokio::test]
async fn test_ping() {
    let router = app(MockOptimizer::new(Behavior::Succeed), MockTransport::new(IMAGE));

    for method in [Method::GET, Method::POST] {
        let response = router
            .clone()
            .oneshot(authorized(method, "/v1/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("privacy-policy").unwrap(),
            "https://example.com/privacy"
        );
        assert_eq!(
            response.headers().get("terms-of-service").unwrap(),
            "https://example.com/terms"
        );
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(&body_bytes(response).await[..], b"pong");
    }
}

#[tokio::test]
async fn test_root_redirects_and_unknown_paths_are_404() {
    let router = app(MockOptimizer::new(Behavior::Succeed), MockTransport::new(IMAGE));

    let response = router
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "https://shrinkimages.com"
    );

    let response = router
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = json(response).await;
    assert_eq!(body["code"], 404);
    assert!(body.get("documentation").is_none());
}

#[tokio::test]
async fn test_missing_or_wrong_api_key_is_401_for_every_method() {
    let router = app(MockOptimizer::new(Behavior::Succeed), MockTransport::new(IMAGE));

    for path in ["/v1/ping", "/v1/shrink"] {
        for method in [Method::GET, Method::POST, Method::HEAD, Method::PUT, Method::DELETE] {
            for auth in [None, Some("Bearer nope".to_string()), Some(API_KEY.to_string())] {
                let mut request = Request::builder()
                    .method(method.clone())
                    .uri(path)
                    .header(header::USER_AGENT, USER_AGENT);
                if let Some(auth) = auth {
                    request = request.header(header::AUTHORIZATION, auth);
                }

                let response = router
                    .clone()
                    .oneshot(request.body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
            }
        }
    }
}

#[tokio::test]
async fn test_missing_user_agent_is_400_before_auth() {
    let router = app(MockOptimizer::new(Behavior::Succeed), MockTransport::new(IMAGE));

    let response = router
        .oneshot(Request::delete("/v1/shrink").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_disallowed_method_is_405() {
    let router = app(MockOptimizer::new(Behavior::Succeed), MockTransport::new(IMAGE));

    let response = router
        .oneshot(authorized(Method::PUT, "/v1/shrink").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST, GET, HEAD");
}

#[tokio::test]
async fn test_upload_reaches_optimizer_once_with_the_uploaded_bytes() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let router = app(optimizer.clone(), MockTransport::new(IMAGE));

    let response = router
        .oneshot(upload("", multipart("input", "cat.png", IMAGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "octet/stream");
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=cat.png"
    );
    assert_eq!(
        &body_bytes(response).await[..],
        [b"optimized:".as_slice(), IMAGE].concat().as_slice()
    );

    let calls = &optimizer.calls;
    assert_eq!(calls.opened(), vec![bytes::Bytes::from_static(IMAGE)]);
    assert_eq!(calls.optimized(), vec![OptimizationOptions::default()]);
    assert!(calls.resized().is_empty());
    assert_eq!(calls.released(), 1);
}

#[tokio::test]
async fn test_upload_filename_keeps_only_the_base_name() {
    let router = app(MockOptimizer::new(Behavior::Succeed), MockTransport::new(IMAGE));

    let response = router
        .oneshot(upload("", multipart("input", "../../etc/passwd", IMAGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=passwd"
    );
}

#[tokio::test]
async fn test_non_ascii_upload_filename_is_kept() {
    let router = app(MockOptimizer::new(Behavior::Succeed), MockTransport::new(IMAGE));

    let response = router
        .oneshot(upload("", multipart("input", "naïve.png", IMAGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap().as_bytes(),
        "attachment; filename=naïve.png".as_bytes()
    );
}

#[tokio::test]
async fn test_out_of_range_quality_uses_default() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let router = app(optimizer.clone(), MockTransport::new(IMAGE));

    let response = router
        .oneshot(upload("quality=200&compression=3", multipart("input", "a.png", IMAGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let optimized = optimizer.calls.optimized();
    assert_eq!(optimized.len(), 1);
    assert_eq!(optimized[0].quality, DEFAULT_QUALITY);
    assert_eq!(optimized[0].compression, 3);
}

#[tokio::test]
async fn test_width_over_maximum_is_rejected_before_the_optimizer() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let router = app(optimizer.clone(), MockTransport::new(IMAGE));

    let response = router
        .oneshot(upload("quality=200&width=99999", multipart("input", "a.png", IMAGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert_eq!(body["code"], 400);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("width") && message.contains("10000"), "{message}");
    assert!(optimizer.calls.opened().is_empty());
}

#[tokio::test]
async fn test_unparseable_parameter_is_400() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let router = app(optimizer.clone(), MockTransport::new(IMAGE));

    let response = router
        .oneshot(upload("trellis_quant=maybe", multipart("input", "a.png", IMAGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json(response).await["message"]
        .as_str()
        .unwrap()
        .contains("trellis quant"));
    assert!(optimizer.calls.opened().is_empty());
}

#[tokio::test]
async fn test_negative_dimensions_mean_no_resize() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let router = app(optimizer.clone(), MockTransport::new(IMAGE));

    let response = router
        .oneshot(upload("width=-10&height=-1", multipart("input", "a.png", IMAGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(optimizer.calls.optimized().len(), 1);
    assert!(optimizer.calls.resized().is_empty());
}

#[tokio::test]
async fn test_positive_dimension_resizes() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let router = app(optimizer.clone(), MockTransport::new(IMAGE));

    let response = router
        .oneshot(upload("height=300", multipart("input", "a.png", IMAGE)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(optimizer.calls.optimized().is_empty());
    let resized = optimizer.calls.resized();
    assert_eq!(resized.len(), 1);
    assert_eq!((resized[0].0, resized[0].1), (0, 300));
}

#[tokio::test]
async fn test_optimizer_failures_map_to_status_codes() {
    let cases = [
        (Behavior::Unsupported, StatusCode::UNSUPPORTED_MEDIA_TYPE, 0),
        (Behavior::BrokenDecode, StatusCode::INTERNAL_SERVER_ERROR, 0),
        (Behavior::BrokenEncode, StatusCode::INTERNAL_SERVER_ERROR, 1),
        (Behavior::Panic, StatusCode::INTERNAL_SERVER_ERROR, 0),
    ];

    for (behavior, status, released) in cases {
        let optimizer = MockOptimizer::new(behavior);
        let router = app(optimizer.clone(), MockTransport::new(IMAGE));

        let response = router
            .oneshot(upload("", multipart("input", "a.png", IMAGE)))
            .await
            .unwrap();

        assert_eq!(response.status(), status, "{behavior:?}");
        assert_eq!(json(response).await["code"], status.as_u16(), "{behavior:?}");
        assert_eq!(optimizer.calls.released(), released, "{behavior:?}");
    }
}

#[tokio::test]
async fn test_declared_length_over_limit_is_413() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let router = app(optimizer.clone(), MockTransport::new(IMAGE));

    let mut request = upload("", multipart("input", "a.png", IMAGE));
    request
        .headers_mut()
        .insert(header::CONTENT_LENGTH, (2u64 << 20).into());

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(optimizer.calls.opened().is_empty());
}

#[tokio::test]
async fn test_body_over_limit_without_declared_length_is_400() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let router = app(optimizer.clone(), MockTransport::new(IMAGE));

    let big = vec![0u8; (1 << 20) + 1024];
    let response = router
        .oneshot(upload("", multipart("input", "big.png", &big)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(optimizer.calls.opened().is_empty());
}

#[tokio::test]
async fn test_missing_input_field_or_malformed_body_is_400() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let router = app(optimizer.clone(), MockTransport::new(IMAGE));

    let response = router
        .clone()
        .oneshot(upload("", multipart("file", "a.png", IMAGE)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(
            authorized(Method::POST, "/v1/shrink")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(optimizer.calls.opened().is_empty());
}

#[tokio::test]
async fn test_remote_url_is_fetched_and_shrunk() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let transport = MockTransport::new(IMAGE);
    let router = app(optimizer.clone(), transport.clone());

    let response = router
        .oneshot(
            authorized(Method::GET, "/v1/shrink?url=https%3A%2F%2Fexample.com%2Fimg%2F1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=remote.png"
    );
    assert_eq!(transport.calls(), 1);
    assert_eq!(optimizer.calls.opened(), vec![bytes::Bytes::from_static(IMAGE)]);
}

#[tokio::test]
async fn test_plain_http_url_fails_without_network() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let transport = MockTransport::new(IMAGE);
    let router = app(optimizer.clone(), transport.clone());

    let response = router
        .oneshot(
            authorized(Method::GET, "/v1/shrink?url=http://example.com/a.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(transport.calls(), 0);
    assert!(optimizer.calls.opened().is_empty());
}

#[tokio::test]
async fn test_oversized_remote_image_is_400() {
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let transport = MockTransport::new(vec![0u8; (1 << 20) + 1]);
    let router = app(optimizer.clone(), transport.clone());

    let response = router
        .oneshot(
            authorized(Method::GET, "/v1/shrink?url=https://example.com/huge.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert!(body["message"].as_str().unwrap().contains("1 MB"));
    assert!(optimizer.calls.opened().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_remote_fetch_times_out_with_error_body() {
    let mut config = test_config();
    config.timeouts.request_secs = 1;
    let optimizer = MockOptimizer::new(Behavior::Succeed);
    let transport = MockTransport::with_delay(IMAGE, Duration::from_secs(5));
    let router = app_with(config, optimizer.clone(), transport.clone());

    let response = router
        .oneshot(
            authorized(Method::GET, "/v1/shrink?url=https://example.com/a.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = json(response).await;
    assert_eq!(body["code"], 408);
    assert!(body["message"].as_str().unwrap().contains("too long"));
    assert_eq!(transport.calls(), 1);
    assert!(optimizer.calls.opened().is_empty());
}
