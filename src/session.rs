//! Server-side sessions.
//!
//! The browser only holds an opaque session id in the `sessionid` cookie; the
//! data lives in an in-process `moka` cache with a fixed time-to-live.

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};
use moka::future::Cache;
use tracing::{debug, trace};
use uuid::Uuid;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "sessionid";

/// Data kept for one logged-in browser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionData {
    pub driver_id: i32,
    /// Dashboard visits made with this session.
    pub num_visits: u32,
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    cache: Cache<String, SessionData>,
}

impl SessionStore {
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Start a new session for `driver_id` and return its id.
    pub async fn create(&self, driver_id: i32) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.cache
            .insert(
                session_id.clone(),
                SessionData {
                    driver_id,
                    num_visits: 0,
                },
            )
            .await;
        debug!("Created session for driver {}", driver_id);
        session_id
    }

    pub async fn get(&self, session_id: &str) -> Option<SessionData> {
        self.cache.get(session_id).await
    }

    /// Count one more dashboard visit and return the new total.
    ///
    /// Returns `None` if the session expired in the meantime.
    pub async fn record_visit(&self, session_id: &str) -> Option<u32> {
        let mut data = self.cache.get(session_id).await?;
        data.num_visits += 1;
        let visits = data.num_visits;
        self.cache.insert(session_id.to_string(), data).await;
        trace!("Session visit count is now {}", visits);
        Some(visits)
    }

    pub async fn remove(&self, session_id: &str) {
        self.cache.invalidate(session_id).await;
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

/// Extract the session id from the request's `Cookie` headers.
///
/// Only the first `sessionid` pair counts; later duplicates are ignored.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value binding the browser to `session_id`.
pub fn session_cookie(session_id: &str) -> HeaderValue {
    let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    // A UUID only contains characters valid in a header value
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| expired_session_cookie())
}

/// `Set-Cookie` value telling the browser to forget its session id.
pub fn expired_session_cookie() -> HeaderValue {
    HeaderValue::from_static("sessionid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(60), 100)
    }

    #[tokio::test]
    async fn test_visit_counter_starts_at_one() {
        let sessions = store();
        let session_id = sessions.create(7).await;

        assert_eq!(sessions.record_visit(&session_id).await, Some(1));
        assert_eq!(sessions.record_visit(&session_id).await, Some(2));
        assert_eq!(sessions.record_visit(&session_id).await, Some(3));

        let data = sessions.get(&session_id).await.unwrap();
        assert_eq!(data.driver_id, 7);
        assert_eq!(data.num_visits, 3);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let sessions = store();
        let first = sessions.create(1).await;
        let second = sessions.create(1).await;
        assert_ne!(first, second);

        sessions.record_visit(&first).await;
        sessions.record_visit(&first).await;

        assert_eq!(sessions.record_visit(&second).await, Some(1));
    }

    #[tokio::test]
    async fn test_removed_session_is_gone() {
        let sessions = store();
        let session_id = sessions.create(1).await;
        sessions.remove(&session_id).await;

        assert!(sessions.get(&session_id).await.is_none());
        assert_eq!(sessions.record_visit(&session_id).await, None);
    }

    #[test]
    fn test_session_id_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("csrftoken=abc; sessionid=1234-5678; theme=dark"),
        );
        assert_eq!(session_id_from_headers(&headers), Some("1234-5678".to_string()));

        let mut empty = HeaderMap::new();
        empty.insert(header::COOKIE, HeaderValue::from_static("sessionid="));
        assert_eq!(session_id_from_headers(&empty), None);

        let mut duplicated = HeaderMap::new();
        duplicated.insert(header::COOKIE, HeaderValue::from_static("sessionid=first; sessionid=second"));
        assert_eq!(session_id_from_headers(&duplicated), Some("first".to_string()));

        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc");
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("sessionid=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
    }
}
