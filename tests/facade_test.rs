use std::time::Duration;

use serde_json::json;
use ulearning_export::api::{CoursewareApi, EndpointTable, Generation};
use ulearning_export::clients::HttpClient;
use ulearning_export::config::{ApiVersion, Config, Timeouts};
use ulearning_export::error::EndpointError;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        course_id: "46099".to_string(),
        class_id: "851527".to_string(),
        authorization_token: "TOKEN".to_string(),
        ua_authorization_token: "TOKEN".to_string(),
        base_api_url: server.uri(),
        timeouts: Timeouts {
            short: Duration::from_millis(300),
            default: Duration::from_millis(300),
            long: Duration::from_millis(300),
        },
        ..Config::default()
    }
}

fn api_for(server: &MockServer) -> CoursewareApi {
    CoursewareApi::new(&config_for(server)).expect("创建门面失败")
}

#[tokio::test]
async fn test_current_success_does_not_touch_legacy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": {"name": "张三"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let response = api.get_user_info().await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.data(), Some(&json!({"name": "张三"})));
    assert_eq!(api.current_generation(), Generation::Current);
}

#[tokio::test]
async fn test_transport_error_retries_legacy_once_and_sticks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"name": "李四"}})))
        .expect(2)
        .mount(&server)
        .await;

    let api = api_for(&server);

    let first = api.get_user_info().await.unwrap();
    assert!(first.is_success());
    assert_eq!(first.data(), Some(&json!({"name": "李四"})));
    assert_eq!(api.current_generation(), Generation::Legacy);

    // 之后的调用直接走旧版
    let second = api.get_user_info().await.unwrap();
    assert!(second.is_success());
    assert_eq!(api.current_generation(), Generation::Legacy);
}

#[tokio::test]
async fn test_unsuccessful_envelope_falls_back_to_legacy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/course/46099/directory"))
        .and(query_param("classId", "851527"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 500, "message": "服务异常"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/course/stu/46099/directory"))
        .and(query_param("classId", "851527"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"coursename": "数据结构", "chapters": []})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let response = api.get_course_directory("46099", "851527").await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.data().unwrap()["coursename"], json!("数据结构"));
    assert_eq!(api.current_generation(), Generation::Legacy);
}

#[tokio::test]
async fn test_http_status_error_falls_back_to_legacy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/questionAnswer/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/questionAnswer/1"))
        .and(query_param("parentId", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"correctAnswerList": ["A"]})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let response = api.get_question_answer("1", "10").await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.data(), Some(&json!({"correctAnswerList": ["A"]})));
}

#[tokio::test]
async fn test_both_generations_failing_returns_failed_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/wholepage/chapter/stu/7"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wholepage/chapter/stu/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "无权限"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let response = api.get_whole_chapter_page_content("7").await.unwrap();

    assert!(!response.is_success());
    assert!(response.data().is_none());
    assert!(response.message().contains("无权限"));
}

#[tokio::test]
async fn test_pinned_legacy_never_calls_current() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        api_version: ApiVersion::Legacy,
        ..config_for(&server)
    };
    let api = CoursewareApi::new(&config).unwrap();
    let response = api.get_user_info().await.unwrap();

    assert!(!response.is_success());
    assert_eq!(api.current_generation(), Generation::Legacy);
}

#[tokio::test]
async fn test_pinned_current_does_not_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        api_version: ApiVersion::Current,
        ..config_for(&server)
    };
    let api = CoursewareApi::new(&config).unwrap();
    assert!(!api.get_user_info().await.unwrap().is_success());
    assert!(!api.get_user_info().await.unwrap().is_success());
    assert_eq!(api.current_generation(), Generation::Current);
}

#[tokio::test]
async fn test_unavailable_probe_skips_current_call() {
    let server = MockServer::start().await;
    Mock::given(method("OPTIONS"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": {"name": "王五"}})))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        probe_endpoints: true,
        ..config_for(&server)
    };
    let api = CoursewareApi::new(&config).unwrap();
    let response = api.get_user_info().await.unwrap();

    assert!(response.is_success());
    assert_eq!(api.current_generation(), Generation::Legacy);
}

#[tokio::test]
async fn test_method_not_allowed_probe_counts_as_available() {
    let server = MockServer::start().await;
    Mock::given(method("OPTIONS"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": {"name": "赵六"}})))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        probe_endpoints: true,
        ..config_for(&server)
    };
    let api = CoursewareApi::new(&config).unwrap();

    assert!(api.get_user_info().await.unwrap().is_success());
    assert_eq!(api.current_generation(), Generation::Current);
}

#[tokio::test]
async fn test_switch_generation_reverts_sticky_switch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": {"name": "新"}})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.switch_generation(Generation::Legacy);
    assert_eq!(api.current_generation(), Generation::Legacy);

    api.switch_generation(Generation::Current);
    let response = api.get_user_info().await.unwrap();
    assert_eq!(response.data(), Some(&json!({"name": "新"})));
}

#[tokio::test]
async fn test_current_only_operation_after_sticky_switch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/studyrecord/heartbeat/r1/123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": null})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uaapi/studyrecord/item/r1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.switch_generation(Generation::Legacy);

    // 旧版没有心跳接口，直接使用新版；成功响应可以没有数据
    let heartbeat = api.send_study_heartbeat("r1", Some(123)).await.unwrap();
    assert!(heartbeat.is_success());
    assert!(heartbeat.data().is_none());

    // 失败时没有旧版可回退，直接返回失败响应
    let record = api.get_study_record("r1").await.unwrap();
    assert!(!record.is_success());
    assert_eq!(api.current_generation(), Generation::Legacy);
}

#[tokio::test]
async fn test_sync_personal_data_posts_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uaapi/yws/api/personal/sync"))
        .and(body_json(json!("ENCRYPTED")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let response = api.sync_personal_data("ENCRYPTED").await.unwrap();
    assert_eq!(response.data(), Some(&json!("ok")));
}

#[tokio::test]
async fn test_non_json_body_is_bare_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/course/46099/remaining"))
        .respond_with(ResponseTemplate::new(200).set_body_string("42"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let remaining = api.get_course_remaining("46099").await.unwrap();
    assert_eq!(remaining.data(), Some(&json!(42)));

    let user = api.get_user_info().await.unwrap();
    assert_eq!(user.data(), Some(&json!("<html>login</html>")));
}

#[tokio::test]
async fn test_detect_best_generation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uaapi/user"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let generation = api.detect_best_generation().await.unwrap();
    assert_eq!(generation, Generation::Legacy);
    assert_eq!(api.current_generation(), Generation::Legacy);
}

#[tokio::test]
async fn test_unknown_operation_is_fatal() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    let http = HttpClient::new(&config).unwrap();
    let api = CoursewareApi::with_parts(http, EndpointTable::empty(&server.uri()), &config);

    let err = api.get_user_info().await.unwrap_err();
    assert!(matches!(err, EndpointError::UnknownOperation { .. }));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
