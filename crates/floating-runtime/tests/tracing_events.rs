#![cfg(feature = "tracing")]

use std::sync::{Arc, Mutex};

use floating_core::{
    ComputePositionConfig, ComputePositionReturn, FloatingElement, FloatingError, PositionFuture,
};
use floating_runtime::{Cleanup, FloatingOptions, FloatingState, Updater};
use futures::executor::LocalPool;
use futures::future::{self, FutureExt};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Clone, PartialEq)]
struct El(u8);

impl FloatingElement for El {
    fn device_pixel_ratio(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, Default)]
struct Captured {
    messages: Vec<(tracing::Level, String)>,
}

impl Captured {
    fn saw(&self, level: tracing::Level, message: &str) -> bool {
        self.messages
            .iter()
            .any(|(l, m)| *l == level && m == message)
    }
}

struct FloatingTraceCapture {
    state: Arc<Mutex<Captured>>,
}

impl<S> Layer<S> for FloatingTraceCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct Msg {
            message: Option<String>,
        }
        impl tracing::field::Visit for Msg {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }
        let mut msg = Msg { message: None };
        event.record(&mut msg);
        if let Some(message) = msg.message {
            self.state
                .lock()
                .expect("floating trace lock")
                .messages
                .push((*event.metadata().level(), message));
        }
    }
}

fn failing_engine(_: &El, _: &El, _: ComputePositionConfig) -> PositionFuture {
    future::ready(Err(FloatingError::engine("detached element"))).boxed_local()
}

fn succeeding_engine(_: &El, _: &El, config: ComputePositionConfig) -> PositionFuture {
    future::ready(Ok(ComputePositionReturn {
        placement: config.placement,
        strategy: config.strategy,
        ..ComputePositionReturn::default()
    }))
    .boxed_local()
}

#[test]
fn lifecycle_events_are_emitted() {
    let state = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(FloatingTraceCapture {
        state: Arc::clone(&state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut pool = LocalPool::new();
    let options = FloatingOptions::<El, El>::new().while_elements_mounted(
        |_: &El, _: &El, updater: Updater| -> Cleanup {
            updater.update();
            Box::new(|| {})
        },
    );
    let floating = FloatingState::new(succeeding_engine, pool.spawner(), options);
    floating.set_reference(Some(El(1)));
    floating.set_floating(Some(El(2)));
    pool.run_until_stalled();
    floating.set_open(Some(false));
    drop(floating);

    let snapshot = state.lock().expect("floating trace lock");
    for message in [
        "floating.attach",
        "floating.update",
        "floating.reset",
        "floating.cleanup",
    ] {
        assert!(
            snapshot.saw(tracing::Level::DEBUG, message),
            "expected {message} debug event"
        );
    }
    assert!(!snapshot.saw(tracing::Level::WARN, "floating.update.failed"));
}

#[test]
fn failed_update_warns() {
    let state = Arc::new(Mutex::new(Captured::default()));
    let subscriber = tracing_subscriber::registry().with(FloatingTraceCapture {
        state: Arc::clone(&state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut pool = LocalPool::new();
    let floating = FloatingState::new(
        failing_engine,
        pool.spawner(),
        FloatingOptions::<El, El>::new(),
    );
    floating.set_reference(Some(El(1)));
    floating.set_floating(Some(El(2)));
    pool.run_until_stalled();

    assert!(floating.error().is_some());
    let snapshot = state.lock().expect("floating trace lock");
    assert!(
        snapshot.saw(tracing::Level::WARN, "floating.update.failed"),
        "expected floating.update.failed warn event"
    );
}
