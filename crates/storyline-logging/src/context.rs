//! Viewer context injection
//!
//! Thread-local storage for the viewer a scope is acting for, so spans
//! opened inside it can be attributed without passing ids around.
//!
//! The guard also enters a `viewer` span carrying `viewer_id` and
//! `session_id`. Events and spans opened inside the scope nest under it, so
//! the JSONL output lists both ids in each line's `spans`.

use std::cell::RefCell;

use storyline_core::UserId;
use tracing::field;
use tracing::span::EnteredSpan;
use uuid::Uuid;

/// Viewer context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContextData {
    /// Short id of the signed-in viewer, `None` when anonymous
    pub viewer_id: Option<String>,
    /// Unique id of this viewing session
    pub session_id: Uuid,
}

thread_local! {
    static VIEWER_CONTEXT: RefCell<Option<ViewerContextData>> = const { RefCell::new(None) };
}

/// RAII guard for viewer context
///
/// Sets the context for the current thread and restores the previous one
/// when dropped.
///
/// ```ignore
/// let _guard = ViewerContextGuard::new(Some(user_id));
/// tracing::info_span!("feed").in_scope(|| tracing::info!("Loaded"));
/// ```
pub struct ViewerContextGuard {
    previous: Option<ViewerContextData>,
    _span: EnteredSpan,
}

impl ViewerContextGuard {
    /// Enter a fresh session for `viewer`
    pub fn new(viewer: Option<UserId>) -> Self {
        Self::with_session_id(viewer, Uuid::new_v4())
    }

    /// Enter a session with a known id, e.g. a running viewer session's
    pub fn with_session_id(viewer: Option<UserId>, session_id: Uuid) -> Self {
        let previous = Self::current();
        let data = ViewerContextData {
            viewer_id: viewer.map(|id| id.short_id()),
            session_id,
        };
        let viewer_id = data.viewer_id.clone();
        // Set before the span exists so the span itself is attributed.
        VIEWER_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(data));

        let span = tracing::info_span!("viewer", viewer_id = field::Empty, session_id = %session_id);
        if let Some(viewer_id) = &viewer_id {
            span.record("viewer_id", viewer_id.as_str());
        }
        Self {
            previous,
            _span: span.entered(),
        }
    }

    pub fn current() -> Option<ViewerContextData> {
        VIEWER_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    pub fn current_session_id() -> Option<Uuid> {
        Self::current().map(|ctx| ctx.session_id)
    }

    pub fn current_viewer_id() -> Option<String> {
        Self::current().and_then(|ctx| ctx.viewer_id)
    }
}

impl Drop for ViewerContextGuard {
    fn drop(&mut self) {
        VIEWER_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}

/// Run a block inside a viewer context
///
/// ```ignore
/// with_viewer_context!(Some(user_id), {
///     tracing::info!("Opening viewer");
/// });
/// ```
#[macro_export]
macro_rules! with_viewer_context {
    ($viewer:expr, $body:block) => {{
        let _guard = $crate::context::ViewerContextGuard::new($viewer);
        $body
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_context_guard() {
        assert!(ViewerContextGuard::current().is_none());

        let user = UserId::generate();
        {
            let _guard = ViewerContextGuard::new(Some(user));
            assert_eq!(ViewerContextGuard::current_viewer_id(), Some(user.short_id()));
            assert!(ViewerContextGuard::current_session_id().is_some());
        }

        assert!(ViewerContextGuard::current().is_none());
    }

    #[test]
    fn test_nested_contexts_restore() {
        let outer = Uuid::new_v4();
        let inner = Uuid::new_v4();
        {
            let _a = ViewerContextGuard::with_session_id(None, outer);
            {
                let _b = ViewerContextGuard::with_session_id(Some(UserId::generate()), inner);
                assert_eq!(ViewerContextGuard::current_session_id(), Some(inner));
            }
            assert_eq!(ViewerContextGuard::current_session_id(), Some(outer));
            assert_eq!(ViewerContextGuard::current_viewer_id(), None);
        }
        assert!(ViewerContextGuard::current_session_id().is_none());
    }

    #[test]
    fn test_macro_scopes_context() {
        let seen = with_viewer_context!(None, { ViewerContextGuard::current_session_id() });
        assert!(seen.is_some());
        assert!(ViewerContextGuard::current().is_none());
    }
}
