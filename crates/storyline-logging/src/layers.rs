//! Custom tracing layers

use tracing::{Subscriber, span};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::config::JsonlConfig;
use crate::context::{ViewerContextData, ViewerContextGuard};

/// Layer that attaches the active viewer context to every new span
///
/// Spans created while a [`ViewerContextGuard`] is live carry a
/// [`ViewerContextExtension`] that later layers can read. The formatted
/// output gets the same ids from the `viewer` span the guard enters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewerContextLayer;

impl ViewerContextLayer {
    pub fn new() -> Self {
        Self
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct ViewerContextExtension {
    pub data: ViewerContextData,
}

impl<S> Layer<S> for ViewerContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        if let Some(data) = ViewerContextGuard::current() {
            span.extensions_mut().insert(ViewerContextExtension { data });
        }
    }
}

/// JSONL formatting layer writing to `writer`
pub fn jsonl_layer<S, W>(writer: W, config: &JsonlConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(config.include_spans)
        .flatten_event(config.flatten_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread_info)
        .with_thread_names(config.include_thread_info)
        .with_writer(writer)
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use storyline_core::UserId;
    use tracing_subscriber::layer::SubscriberExt;

    /// Records the viewer id found on each new span
    struct Probe(Arc<Mutex<Vec<Option<String>>>>);

    impl<S> Layer<S> for Probe
    where
        S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
            let found = ctx.span(id).and_then(|span| {
                span.extensions()
                    .get::<ViewerContextExtension>()
                    .map(|ext| ext.data.viewer_id.clone().unwrap_or_default())
            });
            self.0.lock().unwrap().push(found);
        }
    }

    #[test]
    fn test_spans_carry_viewer_context() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry()
            .with(ViewerContextLayer::new())
            .with(Probe(seen.clone()));

        let user = UserId::generate();
        tracing::subscriber::with_default(subscriber, || {
            let _outside = tracing::info_span!("outside");
            let _guard = ViewerContextGuard::new(Some(user));
            let _inside = tracing::info_span!("inside");
        });

        let seen = seen.lock().unwrap();
        // outside, the guard's own `viewer` span, inside
        assert_eq!(*seen, vec![None, Some(user.short_id()), Some(user.short_id())]);
    }
}
