//! In-memory capture of operation boundary events for tests
//!
//! Command handlers emit `start` / `end` / `end_error` events through the
//! `log_op_*!` macros; this module collects those events so tests can assert
//! the logging boundary instead of trusting it. Unit tests inside one module
//! should install the layer scoped via [`TestCapture::scoped`]; integration
//! test binaries that need process-wide capture use [`init_test_capture`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::field::Visit;
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use orderdesk_core_types::schema;

/// One captured log event, flattened to string fields
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    /// `component` field (the emitting module path)
    pub component: Option<String>,
    /// `op` field (e.g. `order_create`)
    pub op: Option<String>,
    /// `event` field: `start`, `end` or `end_error`
    pub event: Option<String>,
    /// Every recorded field, stringified
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    /// Value of an arbitrary recorded field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn matches(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }
}

#[derive(Default)]
struct FieldVisitor {
    fields: HashMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }
}

struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let captured = CapturedEvent {
            level: *event.metadata().level(),
            component: visitor.fields.get(schema::FIELD_COMPONENT).cloned(),
            op: visitor.fields.get(schema::FIELD_OP).cloned(),
            event: visitor.fields.get(schema::FIELD_EVENT).cloned(),
            fields: visitor.fields,
        };

        self.events
            .lock()
            .map(|mut events| events.push(captured))
            .ok();
    }
}

/// Handle over the events a capture layer has collected
#[derive(Clone)]
pub struct TestCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl TestCapture {
    fn new() -> (CaptureLayer, Self) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let layer = CaptureLayer {
            events: events.clone(),
        };
        (layer, Self { events })
    }

    /// Run a closure with capture installed as the thread's subscriber
    ///
    /// Scoped alternative to [`init_test_capture`] for unit tests: nothing
    /// global is touched, so tests in one binary cannot collide over the
    /// default subscriber.
    pub fn scoped<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
        let (layer, capture) = Self::new();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        capture.events()
    }

    /// Snapshot of all captured events, oldest first
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// All events carrying a given `op` field, oldest first
    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.op.as_deref() == Some(op))
            .collect()
    }

    /// Assert that an event with this op and event type was captured
    ///
    /// # Panics
    ///
    /// Panics when no matching event exists.
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.matches(op, event)),
            "expected op={} event={} among {} captured events",
            op,
            event,
            events.len()
        );
    }

    /// Assert a well-formed operation boundary for `op`
    ///
    /// A `start` event must precede a terminal event (`end` or `end_error`),
    /// and the terminal event must carry a `duration_ms` field.
    ///
    /// # Panics
    ///
    /// Panics when the boundary is missing or malformed.
    pub fn assert_boundary(&self, op: &str) {
        let events = self.events_for_op(op);
        let start = events
            .iter()
            .position(|e| e.event.as_deref() == Some(schema::EVENT_START));
        let terminal = events.iter().position(|e| {
            matches!(
                e.event.as_deref(),
                Some(schema::EVENT_END) | Some(schema::EVENT_END_ERROR)
            )
        });

        let (Some(start), Some(terminal)) = (start, terminal) else {
            panic!(
                "incomplete boundary for op={}: {} events, start={:?}, terminal={:?}",
                op,
                events.len(),
                start,
                terminal
            );
        };
        assert!(start < terminal, "terminal event precedes start for {}", op);
        assert!(
            events[terminal].field(schema::FIELD_DURATION_MS).is_some(),
            "terminal event for {} lacks duration_ms",
            op
        );
    }

    /// Drop all captured events
    pub fn clear(&self) {
        self.events.lock().map(|mut e| e.clear()).ok();
    }

    /// Count events matching a predicate
    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install capture as the process-wide default subscriber
///
/// For integration test binaries whose tests run on multiple threads, where
/// a scoped thread-local subscriber would miss events. First call installs
/// the layer, every call returns the same shared handle; tests in one
/// binary therefore see each other's events and should filter by op.
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCapture::new();
            tracing_subscriber::registry().with(layer).init();
            capture
        })
        .clone()
}
