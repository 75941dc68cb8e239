//! ABOUTME: End-to-end tests for the profile cache-aside flow
//! ABOUTME: Store stubbed with wiremock, cache backed by the memory backend

use halo_cache::{MemoryBackend, ProfileCache, RecordingSink};
use halo_core::Error;
use halo_profile::{ProfileService, UpdateProfileRequest};
use halo_store::{ClientPool, PoolOptions, StoreClient, StoreClientFactory};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use test_support::{full_profile_json, profile_json, unique_user_id};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const TTL: Duration = Duration::from_secs(3600);

struct Harness {
    service: ProfileService,
    backend: Arc<MemoryBackend>,
    sink: Arc<RecordingSink>,
    server: MockServer,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let backend = Arc::new(MemoryBackend::new(64));
    let sink = Arc::new(RecordingSink::new());
    let cache = ProfileCache::new(backend.clone(), sink.clone());

    let factory = Arc::new(StoreClientFactory::new(&server.uri(), "svc-key"));
    let pool = ClientPool::<StoreClient>::connect(
        factory,
        PoolOptions {
            max_clients: 4,
            min_clients: 1,
            acquire_timeout: Duration::from_secs(1),
            ..PoolOptions::default()
        },
    )
    .await
    .expect("pool should start");

    Harness {
        service: ProfileService::new(cache, pool, TTL),
        backend,
        sink,
        server,
    }
}

/// Matches PATCH bodies that carry the stripped update shape: no `id`,
/// no `created_at`, and a server-stamped `updated_at`.
struct StrippedUpdateBody;

impl Match for StrippedUpdateBody {
    fn matches(&self, request: &Request) -> bool {
        let Ok(body) = serde_json::from_slice::<serde_json::Value>(&request.body) else {
            return false;
        };
        let Some(obj) = body.as_object() else {
            return false;
        };
        !obj.contains_key("id") && !obj.contains_key("created_at") && obj.contains_key("updated_at")
    }
}

#[tokio::test]
async fn cold_read_populates_cache_and_second_read_skips_store() {
    let h = harness().await;
    let user_id = unique_user_id();

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(vec![profile_json(&user_id, "Ada")]),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let first = h.service.get_profile(&user_id).await.unwrap().unwrap();
    assert_eq!(first.first_name.as_deref(), Some("Ada"));
    assert!(h.backend.contains(&format!("profile:{}", user_id)));

    // Second read within the TTL returns the identical value; the
    // expect(1) on the mock proves the store was not touched again.
    let second = h.service.get_profile(&user_id).await.unwrap().unwrap();
    assert_eq!(second, first);
}

#[tokio::test]
async fn missing_row_returns_none_and_writes_nothing_to_cache() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&h.server)
        .await;

    let result = h.service.get_profile("ghost").await.unwrap();
    assert!(result.is_none());

    // No negative caching: a second read goes to the store again and
    // nothing was written under the key.
    assert!(h.backend.is_empty());
    assert!(h.service.get_profile("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn mismatched_payload_id_rejects_before_any_store_write() {
    let h = harness().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let update = UpdateProfileRequest {
        id: Some(unique_user_id()),
        first_name: Some("X".to_string()),
        ..Default::default()
    };

    let err = h
        .service
        .update_profile(&unique_user_id(), update)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IdentityMismatch(_)));
}

#[tokio::test]
async fn update_strips_immutable_fields_and_invalidates_cache() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![profile_json("user-1", "Ada")]))
        .expect(1)
        .mount(&h.server)
        .await;

    // Warm the cache
    h.service.get_profile("user-1").await.unwrap();
    assert!(h.backend.contains("profile:user-1"));

    let updated_row = json!({
        "id": "user-1",
        "first_name": "Grace",
        "last_name": null,
        "display_name": null,
        "avatar_url": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-06-01T12:00:00Z",
    });
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "eq.user-1"))
        .and(StrippedUpdateBody)
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![updated_row]))
        .expect(1)
        .mount(&h.server)
        .await;

    let update = UpdateProfileRequest {
        // Matching id is allowed, then stripped; created_at is dropped
        id: Some("user-1".to_string()),
        first_name: Some("Grace".to_string()),
        created_at: Some("1999-01-01T00:00:00Z".to_string()),
        ..Default::default()
    };
    let updated = h.service.update_profile("user-1", update).await.unwrap();
    assert_eq!(updated.first_name.as_deref(), Some("Grace"));
    assert_eq!(updated.created_at, "2024-01-01T00:00:00Z");
    assert_ne!(updated.updated_at, "2024-01-01T00:00:00Z");

    // Invalidated, not rewritten: the entry is gone until the next read
    assert!(!h.backend.contains("profile:user-1"));
}

#[tokio::test]
async fn update_of_missing_row_fails_without_touching_cache() {
    let h = harness().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .mount(&h.server)
        .await;

    let err = h
        .service
        .update_profile(
            "ghost",
            UpdateProfileRequest {
                first_name: Some("X".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn empty_batch_touches_neither_cache_nor_store() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<serde_json::Value>::new()))
        .expect(0)
        .mount(&h.server)
        .await;

    let profiles = h.service.get_profiles(&[]).await.unwrap();
    assert!(profiles.is_empty());
    assert!(h.sink.events().is_empty());
}

#[tokio::test]
async fn batch_merges_cache_hits_with_one_store_fetch_in_request_order() {
    let h = harness().await;

    // Make `a` cache-hot through a normal read
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "eq.a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![profile_json("a", "A")]))
        .expect(1)
        .mount(&h.server)
        .await;
    h.service.get_profile("a").await.unwrap();

    // Exactly one batched query for the two cold ids
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "in.(b,c)"))
        .respond_with(
            ResponseTemplate::new(200)
                // Store answers out of order; the service must reorder
                .set_body_json(vec![profile_json("c", "C"), profile_json("b", "B")]),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let profiles = h.service.get_profiles(&ids).await.unwrap();

    let returned: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(returned, vec!["a", "b", "c"]);

    // Both cold ids are now individually cached
    assert!(h.backend.contains("profile:b"));
    assert!(h.backend.contains("profile:c"));
}

#[tokio::test]
async fn batch_drops_ids_with_no_row() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "in.(a,ghost)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![full_profile_json("a")]))
        .expect(1)
        .mount(&h.server)
        .await;

    let ids: Vec<String> = ["a", "ghost"].iter().map(|s| s.to_string()).collect();
    let profiles = h.service.get_profiles(&ids).await.unwrap();

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, "a");
    // The absent id was not negatively cached
    assert!(!h.backend.contains("profile:ghost"));
}

#[tokio::test]
async fn fully_cached_batch_skips_the_store() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "eq.a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![profile_json("a", "A")]))
        .expect(1)
        .mount(&h.server)
        .await;
    h.service.get_profile("a").await.unwrap();

    // No `in.(...)` mock is mounted: a batched store call would 404 and
    // surface as a store error.
    let profiles = h.service.get_profiles(&["a".to_string()]).await.unwrap();
    assert_eq!(profiles.len(), 1);
}

#[tokio::test]
async fn round_trip_update_then_read_reflects_submitted_fields() {
    let h = harness().await;

    let merged = json!({
        "id": "user-1",
        "first_name": "Grace",
        "last_name": "Hopper",
        "display_name": "gh",
        "avatar_url": null,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-06-01T12:00:00Z",
    });
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![merged.clone()]))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![merged]))
        .expect(1)
        .mount(&h.server)
        .await;

    let update = UpdateProfileRequest {
        first_name: Some("Grace".to_string()),
        last_name: Some("Hopper".to_string()),
        display_name: Some("gh".to_string()),
        ..Default::default()
    };
    let updated = h.service.update_profile("user-1", update).await.unwrap();

    // Invalidation forces this read back to the store, which is the
    // point: the next read observes the post-write row.
    let read_back = h.service.get_profile("user-1").await.unwrap().unwrap();
    assert_eq!(read_back, updated);
    assert_eq!(read_back.id, "user-1");
    assert_eq!(read_back.created_at, "2024-01-01T00:00:00Z");
}

#[tokio::test]
async fn invalidate_all_clears_only_profile_keys() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("id", "eq.a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![profile_json("a", "A")]))
        .mount(&h.server)
        .await;
    h.service.get_profile("a").await.unwrap();
    assert!(h.backend.contains("profile:a"));

    assert!(h.service.invalidate_all().await);
    assert!(!h.backend.contains("profile:a"));
}

#[tokio::test]
async fn store_failure_surfaces_without_caching_anything() {
    let h = harness().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    let err = h.service.get_profile("user-1").await.unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert!(h.backend.is_empty());
}
