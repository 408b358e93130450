mod common;

use common::{create_test_app, hours_from_now, link_config, new_link, seed_link, test_server};
use short_url::domain::entities::{DeviceType, NewShortLink, TrackingFields};
use short_url::domain::repositories::{ShortLinkRepository, VisitRepository};

const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

#[tokio::test]
async fn test_redirect_success() {
    let app = create_test_app(link_config());
    seed_link(&app.links, new_link("abc12", "https://example.com/target")).await;

    let server = test_server(app.state.clone());
    let response = server.get("/short/abc12").await;

    assert_eq!(response.status_code(), 301);
    assert_eq!(response.header("location"), "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_uses_link_status_code() {
    let app = create_test_app(link_config());
    seed_link(
        &app.links,
        NewShortLink {
            redirect_status_code: 302,
            ..new_link("temp1", "https://example.com/temporary")
        },
    )
    .await;

    let server = test_server(app.state.clone());
    let response = server.get("/short/temp1").await;

    assert_eq!(response.status_code(), 302);
    assert_eq!(response.header("location"), "https://example.com/temporary");
}

#[tokio::test]
async fn test_redirect_not_found() {
    let app = create_test_app(link_config());
    let server = test_server(app.state.clone());

    let response = server.get("/short/missing").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_without_prefix_is_not_routed() {
    let app = create_test_app(link_config());
    seed_link(&app.links, new_link("abc12", "https://example.com")).await;
    let server = test_server(app.state.clone());

    let response = server.get("/abc12").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_pending_link_not_found() {
    let app = create_test_app(link_config());
    seed_link(
        &app.links,
        NewShortLink {
            activated_at: Some(hours_from_now(1)),
            ..new_link("later", "https://example.com")
        },
    )
    .await;
    let server = test_server(app.state.clone());

    let response = server.get("/short/later").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_expired_link_not_found() {
    let app = create_test_app(link_config());
    seed_link(
        &app.links,
        NewShortLink {
            activated_at: Some(hours_from_now(-2)),
            deactivated_at: Some(hours_from_now(-1)),
            ..new_link("gone1", "https://example.com")
        },
    )
    .await;
    let server = test_server(app.state.clone());

    let response = server.get("/short/gone1").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_redirect_records_visit_and_sets_session_cookie() {
    let mut app = create_test_app(link_config());
    let link = seed_link(&app.links, new_link("abc12", "https://example.com")).await;
    let server = test_server(app.state.clone());

    let response = server
        .get("/short/abc12")
        .add_header("user-agent", IPHONE_UA)
        .add_header("referer", "https://news.example.org/post")
        .await;

    assert_eq!(response.status_code(), 301);
    let cookie = response.cookie("link_session");
    assert!(!cookie.value().is_empty());
    assert_eq!(cookie.path(), Some("/short/abc12"));

    let visits = app.visits.list_for_link(link.id, 0, 10).await.unwrap();
    assert_eq!(visits.len(), 1);
    assert!(visits[0].session_token.is_some());

    let attributes = &visits[0].attributes;
    assert_eq!(attributes.ip_address.as_deref(), Some("127.0.0.1"));
    assert_eq!(attributes.device_type, Some(DeviceType::Mobile));
    assert_eq!(
        attributes.referer_url.as_deref(),
        Some("https://news.example.org/post")
    );
    assert!(attributes.browser.is_some());

    let event = app.events.try_recv().unwrap();
    assert_eq!(event.short_link.url_key, "abc12");
    assert_eq!(event.visit.id, visits[0].id);
}

#[tokio::test]
async fn test_repeat_visit_with_session_cookie_is_not_recorded() {
    let app = create_test_app(link_config());
    let link = seed_link(&app.links, new_link("abc12", "https://example.com")).await;
    let server = test_server(app.state.clone());

    let first = server.get("/short/abc12").await;
    let cookie = first.cookie("link_session");

    let second = server.get("/short/abc12").add_cookie(cookie).await;

    assert_eq!(second.status_code(), 301);
    assert_eq!(app.visits.count_for_link(link.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_repeat_visit_keeps_session_cookie_usable() {
    let app = create_test_app(link_config());
    let link = seed_link(&app.links, new_link("abc12", "https://example.com")).await;
    let server = test_server(app.state.clone());

    let first = server.get("/short/abc12").await;
    let second = server
        .get("/short/abc12")
        .add_cookie(first.cookie("link_session"))
        .await;
    let third = server
        .get("/short/abc12")
        .add_cookie(second.cookie("link_session"))
        .await;

    assert_eq!(third.status_code(), 301);
    assert_eq!(app.visits.count_for_link(link.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_each_recorded_visit_gets_its_own_token() {
    let app = create_test_app(link_config());
    let first_link = seed_link(&app.links, new_link("first", "https://example.com/1")).await;
    let second_link = seed_link(&app.links, new_link("second", "https://example.com/2")).await;
    let server = test_server(app.state.clone());

    let first = server.get("/short/first").await;
    let second = server
        .get("/short/second")
        .add_cookie(first.cookie("link_session"))
        .await;

    assert_eq!(second.cookie("link_session").path(), Some("/short/second"));

    let first_visits = app.visits.list_for_link(first_link.id, 0, 10).await.unwrap();
    let second_visits = app.visits.list_for_link(second_link.id, 0, 10).await.unwrap();
    assert_eq!(second_visits.len(), 1);
    assert!(second_visits[0].session_token.is_some());
    assert_ne!(first_visits[0].session_token, second_visits[0].session_token);
}

#[tokio::test]
async fn test_visits_without_cookie_are_recorded_separately() {
    let app = create_test_app(link_config());
    let link = seed_link(&app.links, new_link("abc12", "https://example.com")).await;
    let server = test_server(app.state.clone());

    server.get("/short/abc12").await;
    server.get("/short/abc12").await;

    let visits = app.visits.list_for_link(link.id, 0, 10).await.unwrap();
    assert_eq!(visits.len(), 2);
    assert_ne!(visits[0].session_token, visits[1].session_token);
}

#[tokio::test]
async fn test_untracked_link_records_nothing() {
    let app = create_test_app(link_config());
    let link = seed_link(
        &app.links,
        NewShortLink {
            track_visits: false,
            ..new_link("quiet", "https://example.com")
        },
    )
    .await;
    let server = test_server(app.state.clone());

    let response = server.get("/short/quiet").await;

    assert_eq!(response.status_code(), 301);
    assert_eq!(app.visits.count_for_link(link.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_tracking_mask_drops_disabled_fields() {
    let app = create_test_app(link_config());
    let link = seed_link(
        &app.links,
        NewShortLink {
            tracking: TrackingFields {
                device_type: true,
                ..TrackingFields::NONE
            },
            ..new_link("masked", "https://example.com")
        },
    )
    .await;
    let server = test_server(app.state.clone());

    server
        .get("/short/masked")
        .add_header("user-agent", IPHONE_UA)
        .add_header("referer", "https://news.example.org/post")
        .await;

    let visits = app.visits.list_for_link(link.id, 0, 10).await.unwrap();
    let attributes = &visits[0].attributes;
    assert_eq!(attributes.device_type, Some(DeviceType::Mobile));
    assert!(attributes.ip_address.is_none());
    assert!(attributes.browser.is_none());
    assert!(attributes.operating_system.is_none());
    assert!(attributes.referer_url.is_none());
}

#[tokio::test]
async fn test_single_use_link_stops_after_first_visit() {
    let app = create_test_app(link_config());
    let link = seed_link(
        &app.links,
        NewShortLink {
            single_use: true,
            ..new_link("once1", "https://example.com/secret")
        },
    )
    .await;
    let server = test_server(app.state.clone());

    let first = server.get("/short/once1").await;
    assert_eq!(first.status_code(), 301);

    let second = server.get("/short/once1").await;
    second.assert_status_not_found();

    let stored = app.links.find_by_key("once1").await.unwrap().unwrap();
    assert!(stored.deactivated_at.is_some());
    assert_eq!(app.visits.count_for_link(link.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_single_use_link_without_tracking_still_deactivates() {
    let app = create_test_app(link_config());
    seed_link(
        &app.links,
        NewShortLink {
            single_use: true,
            track_visits: false,
            ..new_link("once2", "https://example.com/secret")
        },
    )
    .await;
    let server = test_server(app.state.clone());

    assert_eq!(server.get("/short/once2").await.status_code(), 301);
    server.get("/short/once2").await.assert_status_not_found();
}

#[tokio::test]
async fn test_query_params_forwarded_when_enabled() {
    let app = create_test_app(link_config());
    seed_link(
        &app.links,
        NewShortLink {
            forward_query_params: true,
            ..new_link("fwd01", "https://example.com/page?ref=short")
        },
    )
    .await;
    let server = test_server(app.state.clone());

    let response = server.get("/short/fwd01?utm_source=mail&id=7").await;

    assert_eq!(
        response.header("location"),
        "https://example.com/page?ref=short&utm_source=mail&id=7"
    );
}

#[tokio::test]
async fn test_query_params_dropped_when_disabled() {
    let app = create_test_app(link_config());
    seed_link(&app.links, new_link("plain", "https://example.com/page")).await;
    let server = test_server(app.state.clone());

    let response = server.get("/short/plain?utm_source=mail").await;

    assert_eq!(response.header("location"), "https://example.com/page");
}

#[tokio::test]
async fn test_forwarded_ip_used_behind_proxy() {
    let app = create_test_app(link_config());
    let link = seed_link(&app.links, new_link("proxy", "https://example.com")).await;
    let server = test_server(app.state.clone().with_behind_proxy(true));

    server
        .get("/short/proxy")
        .add_header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .await;

    let visits = app.visits.list_for_link(link.id, 0, 10).await.unwrap();
    assert_eq!(visits[0].attributes.ip_address.as_deref(), Some("203.0.113.7"));
}

#[tokio::test]
async fn test_forwarded_ip_ignored_without_proxy() {
    let app = create_test_app(link_config());
    let link = seed_link(&app.links, new_link("direct", "https://example.com")).await;
    let server = test_server(app.state.clone());

    server
        .get("/short/direct")
        .add_header("x-forwarded-for", "203.0.113.7")
        .await;

    let visits = app.visits.list_for_link(link.id, 0, 10).await.unwrap();
    assert_eq!(visits[0].attributes.ip_address.as_deref(), Some("127.0.0.1"));
}
