use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use flightlog::{AppState, build_app, build_app_with_state};
use http_body_util::BodyExt;
use tower::ServiceExt;

const BOUNDARY: &str = "flightlog-test-boundary";

const SAMPLE_IGC: &str = "AXCT7F3AXCTRACK\r\n\
HFDTE280825\r\n\
HFSITSITE:Interlaken\r\n\
B1000004600000N00600000EA0100001000\r\n\
B1005004600540N00600000EA0150001500\r\n";

fn multipart_upload(filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
Content-Type: application/octet-stream\r\n\r\n\
{content}\r\n\
--{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_string(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn landing_page_responds() {
    let app = build_app();
    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = build_app();
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", "multipart/form-data; boundary=--boundary")
        .body(Body::from("----boundary--"))
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_then_process_then_read_back() {
    let state = AppState::default();
    let app = build_app_with_state(state.clone());

    let (status, body) = body_string(app.clone(), multipart_upload("alps.igc", SAMPLE_IGC)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"created\":1"), "got {body}");

    let (_, status_body) = body_string(app.clone(), get("/flights/status")).await;
    assert!(status_body.contains("\"pending\":1"), "got {status_body}");

    let req = Request::builder()
        .method("POST")
        .uri("/flights/process")
        .body(Body::empty())
        .unwrap();
    let (status, body) = body_string(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"attempted\":1"), "got {body}");

    let (_, status_body) = body_string(app.clone(), get("/flights/status")).await;
    assert!(status_body.contains("\"pending\":0"), "got {status_body}");
    assert!(status_body.contains("\"processed\":1"), "got {status_body}");

    let (status, list) = body_string(app.clone(), get("/flights")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.contains("alps.igc"));
    assert!(list.contains("Interlaken"));

    let id = state.store.list()[0].id;
    let (status, detail) = body_string(app.clone(), get(&format!("/flights/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(detail.contains("Interlaken"));
    assert!(detail.contains("5m 00s"));

    let (status, download) = body_string(app, get(&format!("/flights/{id}/download"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(download, SAMPLE_IGC);
}

#[tokio::test]
async fn duplicate_upload_is_skipped() {
    let app = build_app_with_state(AppState::default());

    let (_, first) = body_string(app.clone(), multipart_upload("a.igc", SAMPLE_IGC)).await;
    assert!(first.contains("\"created\":1"));

    let (_, second) = body_string(app.clone(), multipart_upload("b.igc", SAMPLE_IGC)).await;
    assert!(second.contains("\"created\":0"), "got {second}");
    assert!(second.contains("\"skipped_duplicates\":1"), "got {second}");
}

#[tokio::test]
async fn unparseable_upload_is_counted_as_rejected() {
    let app = build_app_with_state(AppState::default());
    let (status, body) =
        body_string(app, multipart_upload("junk.igc", "<html>not igc</html>")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"rejected\":1"), "got {body}");
    assert!(body.contains("\"created\":0"), "got {body}");
}

#[tokio::test]
async fn deleted_flight_disappears() {
    let state = AppState::default();
    let app = build_app_with_state(state.clone());

    let (status, _) = body_string(app.clone(), multipart_upload("alps.igc", SAMPLE_IGC)).await;
    assert_eq!(status, StatusCode::OK);
    let id = state.store.list()[0].id;

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/flights/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = body_string(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"ok\":true"), "got {body}");

    let response = app.clone().oneshot(get(&format!("/flights/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (_, status_body) = body_string(app.clone(), get("/flights/status")).await;
    assert!(status_body.contains("\"pending\":0"), "got {status_body}");

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/flights/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_reflect_processed_flights() {
    let app = build_app_with_state(AppState::default());

    let (_, body) = body_string(app.clone(), get("/flights/stats")).await;
    assert!(body.contains("\"total_flights\":0"), "got {body}");

    body_string(app.clone(), multipart_upload("alps.igc", SAMPLE_IGC)).await;
    let req = Request::builder()
        .method("POST")
        .uri("/flights/process")
        .body(Body::empty())
        .unwrap();
    body_string(app.clone(), req).await;

    let (status, body) = body_string(app, get("/flights/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"total_flights\":1"), "got {body}");
    assert!(body.contains("\"total_flight_time_seconds\":300"), "got {body}");
    assert!(body.contains("\"altitude_max_meters\":1500"), "got {body}");
}

#[tokio::test]
async fn unknown_flight_is_not_found() {
    let app = build_app();
    let response = app
        .oneshot(get("/flights/00000000-0000-0000-0000-000000000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
