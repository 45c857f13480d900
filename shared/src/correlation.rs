//! Request correlation id
//!
//! The server binds the id of the request being handled for the lifetime of
//! the handler future. Envelopes read it back when they turn into responses,
//! so errors raised deep inside middleware still carry the id.

use std::future::Future;

tokio::task_local! {
    static CORRELATION_ID: String;
}

/// Run `fut` with `id` as the current correlation id
pub async fn scope<F>(id: String, fut: F) -> F::Output
where
    F: Future,
{
    CORRELATION_ID.scope(id, fut).await
}

/// Correlation id of the request being handled, if any
pub fn current() -> Option<String> {
    CORRELATION_ID.try_with(|id| id.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_current_inside_scope() {
        let seen = scope("req-42".to_string(), async { current() }).await;
        assert_eq!(seen.as_deref(), Some("req-42"));
    }

    #[test]
    fn test_current_outside_scope() {
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn test_nested_scope_shadows() {
        let (outer, inner) = scope("outer".to_string(), async {
            let inner = scope("inner".to_string(), async { current() }).await;
            (current(), inner)
        })
        .await;
        assert_eq!(outer.as_deref(), Some("outer"));
        assert_eq!(inner.as_deref(), Some("inner"));
    }
}
