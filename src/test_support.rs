//! Shared helpers for unit tests.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

pub(crate) fn get(uri: &str) -> http::Request<Bytes> {
    http::Request::get(uri)
        .header("host", "example.com")
        .body(Bytes::new())
        .unwrap()
}

/// Warning messages recorded on the current thread.
#[derive(Clone, Default)]
pub(crate) struct Warnings(Arc<Mutex<Vec<String>>>);

impl Warnings {
    pub(crate) fn count(&self) -> usize {
        self.0.lock().len()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Installs a thread-local subscriber that records `WARN` events until the
/// guard is dropped. `#[tokio::test]` runs on the current thread, so async
/// tests can use it too.
pub(crate) fn capture_warnings() -> (DefaultGuard, Warnings) {
    let warnings = Warnings::default();
    let subscriber = Registry::default().with(CaptureLayer(warnings.clone()));
    (tracing::subscriber::set_default(subscriber), warnings)
}

struct CaptureLayer(Warnings);

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut message = MessageVisitor(String::new());
        event.record(&mut message);
        (self.0).0.lock().push(message.0);
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}
