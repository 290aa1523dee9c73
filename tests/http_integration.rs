//! Integration tests for the resource managers using wiremock
//!
//! These tests run a real ClientSession against mocked endpoints, checking
//! the requests each operation sends and how responses and errors come back.

use mcclient::config::Config;
use mcclient::error::{format_error, Error};
use mcclient::modulebase::{Batcher, Getter, Lister, Mutator, ResourceManager};
use mcclient::modules::default_registry;
use mcclient::session::{ClientSession, Session};
use serde_json::json;
use reqwest::header::HeaderMap;
use reqwest::Method;
use wiremock::matchers::{
    body_json, body_string, header, header_exists, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(server: &MockServer) -> ClientSession {
    let config = Config {
        token: Some("test-token".to_string()),
        roles: vec!["admin".to_string()],
        ..Config::default()
    }
    .with_endpoint("compute_v2", &server.uri())
    .with_endpoint("image", &format!("{}/v1", server.uri()));

    ClientSession::new(&config).expect("session should build")
}

fn module(s: &dyn Session, keyword: &str) -> ResourceManager {
    default_registry()
        .expect("declarations should parse")
        .get_module(s, keyword)
        .expect("module should be registered")
        .resource()
        .clone()
}

/// Reading resources
mod read_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_sends_query_and_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/servers"))
            .and(query_param("limit", "20"))
            .and(query_param("status", "running"))
            .and(header("X-Auth-Token", "test-token"))
            .and(header_exists("X-Request-Id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "servers": [{"id": "s1", "name": "web"}, {"id": "s2", "name": "db"}],
                "total": 42,
                "limit": 20
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let servers = module(&s, "servers");
        let result = servers
            .list(&s, Some(&json!({"limit": 20, "status": "running"})))
            .await
            .expect("list should succeed");

        assert_eq!(result.data.len(), 2);
        assert_eq!(result.total, 42);
        assert_eq!(result.limit, 20);
    }

    #[tokio::test]
    async fn test_get_falls_back_to_name_on_404() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/servers/web"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "class": "ResourceNotFoundError", "details": "server web not found"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/servers"))
            .and(query_param("name", "web"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "servers": [{"id": "s1", "name": "web"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let obj = module(&s, "servers")
            .get(&s, "web", None)
            .await
            .expect("name lookup should succeed");
        assert_eq!(obj["id"], "s1");
    }

    #[tokio::test]
    async fn test_get_duplicate_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/servers/web"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/servers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "servers": [{"id": "s1", "name": "web"}, {"id": "s2", "name": "web"}]
            })))
            .mount(&server)
            .await;

        let s = session(&server);
        let err = module(&s, "servers").get(&s, "web", None).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert_eq!(err.status_code(), Some(409));
    }

    #[tokio::test]
    async fn test_versioned_module_path_and_head() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/v1/images/img1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-image-name", "cirros")
                    .insert_header("x-image-disk_format", "qcow2"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let obj = module(&s, "images")
            .head(&s, "img1", None)
            .await
            .expect("head should succeed");
        assert_eq!(obj, json!({"name": "cirros", "disk_format": "qcow2"}));
    }

    #[tokio::test]
    async fn test_list_all_follows_marker() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/disks"))
            .and(query_param("paging_marker", "d2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "disks": [{"id": "d3"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/disks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "disks": [{"id": "d1"}, {"id": "d2"}],
                "next_marker": "d2",
                "marker_field": "id"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let all = module(&s, "disks")
            .list_all(&s, None)
            .await
            .expect("list all should succeed");
        let ids: Vec<_> = all.data.iter().map(|d| d["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["d1", "d2", "d3"]);
    }

    #[tokio::test]
    async fn test_version_uses_bare_host() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(ResponseTemplate::new(200).set_body_string("v3.11.2\n"))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let version = module(&s, "images")
            .base
            .get_version(&s)
            .await
            .expect("version should succeed");
        assert_eq!(version, "v3.11.2");
    }

    #[tokio::test]
    async fn test_worker_stats_uses_bare_host() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/worker_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "workers": [{"name": "default", "active_worker_cnt": 2, "queue_cnt": 0}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let stats = module(&s, "images")
            .base
            .get_worker_stats(&s)
            .await
            .expect("worker stats should succeed");
        assert_eq!(stats["workers"][0]["active_worker_cnt"], 2);
    }

    #[tokio::test]
    async fn test_unversioned_module_under_versioned_catalog() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/servers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "servers": [{"id": "s1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config::default()
            .with_endpoint("compute_v2", &format!("{}/api/v2", server.uri()));
        let s = ClientSession::new(&config).unwrap();
        let result = module(&s, "servers")
            .list(&s, None)
            .await
            .expect("list should succeed");
        assert_eq!(result.data[0]["id"], "s1");
    }
}

/// Writing resources
mod write_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_wraps_under_keyword() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/servers"))
            .and(body_json(json!({"server": {"name": "web", "vcpu_count": 2}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "server": {"id": "s1", "name": "web"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let created = module(&s, "servers")
            .create(&s, Some(&json!({"name": "web", "vcpu_count": 2})))
            .await
            .expect("create should succeed");
        assert_eq!(created["id"], "s1");
    }

    #[tokio::test]
    async fn test_action_in_context() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/hosts/h1/storages/st1/sync"))
            .and(body_json(json!({"storage": {"force": true}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "storage": {"id": "st1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let hosts = module(&s, "hosts");
        let result = module(&s, "storages")
            .perform_action_in_context(&s, "st1", "sync", Some(&json!({"force": true})), &hosts, "h1")
            .await
            .expect("action should succeed");
        assert_eq!(result["id"], "st1");
    }

    #[tokio::test]
    async fn test_batch_create_single_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/servers"))
            .and(body_json(json!({"server": {"name": "web"}, "count": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "servers": [
                    {"status": 200, "body": {"id": "s1"}},
                    {"status": 400, "body": {"details": "no capacity"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let results = module(&s, "servers")
            .batch_create(&s, Some(&json!({"name": "web"})), 2)
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, 200);
        assert_eq!(results[0].id, "s1");
        assert_eq!(results[1].status, 400);
    }

    #[tokio::test]
    async fn test_batch_delete_partial_failure() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/servers/b"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": 403, "class": "ForbiddenError", "details": "protected"
            })))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "server": {"status": "deleting"}
            })))
            .mount(&server)
            .await;

        let s = session(&server);
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let results = module(&s, "servers").batch_delete(&s, &ids, None).await;

        assert_eq!(results.len(), 3);
        let failed: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, "b");
        assert_eq!(failed[0].status, 403);
        assert_eq!(failed[0].data["class"], "ForbiddenError");
    }

    #[tokio::test]
    async fn test_raw_request_passes_body_through() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v1/images/img1/upload"))
            .and(header("X-Auth-Token", "test-token"))
            .and(body_string("raw image bytes"))
            .respond_with(ResponseTemplate::new(200).set_body_string("uploaded"))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let resp = module(&s, "images")
            .base
            .raw_request(
                &s,
                Method::PUT,
                "/images/img1/upload",
                HeaderMap::new(),
                Some(b"raw image bytes".to_vec()),
            )
            .await
            .expect("raw request should succeed");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.text(), "uploaded");
    }

    #[tokio::test]
    async fn test_joint_attach() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/hosts/h1/storages/st1"))
            .and(body_json(json!({"hoststorage": {"mount_point": "/opt/data"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hoststorage": {"host_id": "h1", "storage_id": "st1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let joint = default_registry()
            .unwrap()
            .get_joint_module(&s, "hoststorages")
            .unwrap();
        let attached = joint
            .attach(&s, "h1", "st1", Some(&json!({"mount_point": "/opt/data"})))
            .await
            .expect("attach should succeed");
        assert_eq!(attached["storage_id"], "st1");
    }
}

/// Error handling
mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_403_is_permission_denied() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/servers/s1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "class": "ForbiddenError", "details": "not allowed"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let s = session(&server);
        let err = module(&s, "servers").get(&s, "s1", None).await.unwrap_err();
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(format_error(&anyhow::Error::new(err)), "Permission denied.");
    }

    #[tokio::test]
    async fn test_plain_text_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/zones"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let s = session(&server);
        let err = module(&s, "zones").list(&s, None).await.unwrap_err();
        match err {
            Error::Client(e) => {
                assert_eq!(e.code, 502);
                assert_eq!(e.class, "InternalServerError");
                assert_eq!(e.details, "bad gateway");
            },
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_endpoint() {
        let config = Config::default();
        let s = ClientSession::new(&config).unwrap();
        let err = module(&s, "servers").list(&s, None).await.unwrap_err();
        assert!(matches!(err, Error::Endpoint(_)));
    }
}
