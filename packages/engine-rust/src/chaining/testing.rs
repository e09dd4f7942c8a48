//! Recording plugins and table stubs shared by the engine's unit tests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use things_core::{ThingsMessage, ThingsResponse};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use super::filter_chain::FilterChain;
use super::keys::RoutingKey;
use super::table::{RoutingSlot, RoutingTable, RoutingTables};
use crate::traits::{Filter, Handler, Interceptor};

/// Shared, ordered log of plugin invocations.
#[derive(Debug, Default, Clone)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }
}

pub(crate) fn message(method: &str, product_code: &str) -> ThingsMessage {
    ThingsMessage::new("msg-1", method, product_code)
}

// ---------------------------------------------------------------------------
// RecordingFilter
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum FilterMode {
    Pass,
    Block,
    Fail,
}

pub(crate) struct RecordingFilter {
    name: String,
    mode: FilterMode,
    journal: Journal,
}

impl RecordingFilter {
    fn with_mode(name: &str, journal: &Journal, mode: FilterMode) -> Self {
        Self {
            name: name.to_string(),
            mode,
            journal: journal.clone(),
        }
    }

    pub(crate) fn passing(name: &str, journal: &Journal) -> Self {
        Self::with_mode(name, journal, FilterMode::Pass)
    }

    /// Returns without proceeding.
    pub(crate) fn blocking(name: &str, journal: &Journal) -> Self {
        Self::with_mode(name, journal, FilterMode::Block)
    }

    pub(crate) fn failing(name: &str, journal: &Journal) -> Self {
        Self::with_mode(name, journal, FilterMode::Fail)
    }
}

impl Filter for RecordingFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        message: &ThingsMessage,
        response: &mut ThingsResponse,
        chain: FilterChain<'_>,
    ) -> anyhow::Result<()> {
        self.journal.push(format!("filter:{}", self.name));
        match self.mode {
            FilterMode::Pass => chain.proceed(message, response),
            FilterMode::Block => Ok(()),
            FilterMode::Fail => Err(anyhow::anyhow!("filter {} failed", self.name)),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingInterceptor
// ---------------------------------------------------------------------------

pub(crate) struct RecordingInterceptor {
    name: String,
    accept: bool,
    journal: Journal,
}

impl RecordingInterceptor {
    pub(crate) fn accepting(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            accept: true,
            journal: journal.clone(),
        }
    }

    pub(crate) fn rejecting(name: &str, journal: &Journal) -> Self {
        Self {
            accept: false,
            ..Self::accepting(name, journal)
        }
    }
}

impl Interceptor for RecordingInterceptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn pre_handle(&self, _message: &ThingsMessage, _response: &mut ThingsResponse) -> bool {
        self.journal.push(format!("pre:{}", self.name));
        self.accept
    }

    fn post_handle(&self, _message: &ThingsMessage, _response: &mut ThingsResponse) {
        self.journal.push(format!("post:{}", self.name));
    }

    fn after_completion(
        &self,
        _message: &ThingsMessage,
        _response: &mut ThingsResponse,
        error: Option<&anyhow::Error>,
    ) {
        match error {
            Some(err) => self.journal.push(format!("after:{} err={err}", self.name)),
            None => self.journal.push(format!("after:{}", self.name)),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingHandler
// ---------------------------------------------------------------------------

pub(crate) struct RecordingHandler {
    name: String,
    accepts: bool,
    fails: bool,
    journal: Journal,
}

impl RecordingHandler {
    pub(crate) fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            accepts: true,
            fails: false,
            journal: journal.clone(),
        }
    }

    /// `can_handle` returns `false`.
    pub(crate) fn declining(mut self) -> Self {
        self.accepts = false;
        self
    }

    /// `handle` returns `handler NAME failed`.
    pub(crate) fn failing(mut self) -> Self {
        self.fails = true;
        self
    }
}

impl Handler for RecordingHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, _message: &ThingsMessage, _response: &ThingsResponse) -> bool {
        self.accepts
    }

    fn handle(&self, _message: &ThingsMessage, response: &mut ThingsResponse) -> anyhow::Result<()> {
        self.journal.push(format!("handle:{}", self.name));
        if self.fails {
            anyhow::bail!("handler {} failed", self.name);
        }
        response.set_attribute("handled_by", serde_json::Value::from(self.name.clone()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CountingTable
// ---------------------------------------------------------------------------

/// Routing table stub that counts lookups.
pub(crate) struct CountingTable {
    inner: RoutingTables,
    lookups: AtomicUsize,
}

impl CountingTable {
    pub(crate) fn new(inner: RoutingTables) -> Self {
        Self {
            inner,
            lookups: AtomicUsize::new(0),
        }
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl RoutingTable for CountingTable {
    fn lookup(&self, key: &RoutingKey) -> Option<&RoutingSlot> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(key)
    }
}

/// Routes engine logs to the test harness output. Safe to call repeatedly.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// CapturedEvents
// ---------------------------------------------------------------------------

/// Fields of one captured log event, rendered as strings. The event text is
/// under `message`.
pub(crate) type EventFields = BTreeMap<String, String>;

/// Tracing layer that keeps every event emitted inside [`capture`].
///
/// [`capture`]: CapturedEvents::capture
#[derive(Debug, Default, Clone)]
pub(crate) struct CapturedEvents(Arc<Mutex<Vec<EventFields>>>);

impl CapturedEvents {
    /// Runs `f` with this layer as the thread's subscriber.
    pub(crate) fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Captured events whose text is `message`.
    pub(crate) fn with_message(&self, message: &str) -> Vec<EventFields> {
        self.0
            .lock()
            .iter()
            .filter(|fields| fields.get("message").map(String::as_str) == Some(message))
            .cloned()
            .collect()
    }
}

struct FieldCollector<'a>(&'a mut EventFields);

impl Visit for FieldCollector<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S: tracing::Subscriber> Layer<S> for CapturedEvents {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = EventFields::new();
        event.record(&mut FieldCollector(&mut fields));
        self.0.lock().push(fields);
    }
}
