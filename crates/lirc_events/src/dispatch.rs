use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::config::ThrottleConfig;
use crate::event::LircEvent;

/// Name under which a fallback callback can be registered with [`DispatcherBuilder::on`].
pub const DEFAULT_KEY: &str = "DEFAULT";

pub type Callback = Box<dyn FnMut(&LircEvent) + Send + 'static>;

/// Receives every successfully parsed event on the listener thread.
///
/// Implementations run inline with the socket loop: a slow handler delays
/// every later event and the listener's reaction to `stop()`.
pub trait EventHandler: Send + 'static {
    fn handle(&mut self, event: &LircEvent);
}

/// Which branch [`Dispatcher::dispatch`] took for an event.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DispatchOutcome {
    /// The callback registered for the event's key ran.
    Invoked,
    /// No keyed callback; the fallback ran.
    Fallback,
    /// The event came from a remote other than the configured one.
    RemoteFiltered,
    /// The repeat count is not a multiple of the throttle interval.
    Throttled { count: u64 },
    /// Throttling is on and the repeat count is not a number.
    InvalidRepeatCount,
    /// Neither a keyed callback nor a fallback exists.
    Unhandled,
}

impl DispatchOutcome {
    pub fn invoked_callback(self) -> bool {
        matches!(self, DispatchOutcome::Invoked | DispatchOutcome::Fallback)
    }
}

/// Routes events to per-key callbacks with optional remote filter and throttle.
pub struct Dispatcher {
    callbacks: HashMap<String, Callback>,
    fallback: Option<Callback>,
    throttle: ThrottleConfig,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn throttle(&self) -> &ThrottleConfig {
        &self.throttle
    }

    pub fn has_callback(&self, key: &str) -> bool {
        self.callbacks.contains_key(key)
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn dispatch(&mut self, event: &LircEvent) -> DispatchOutcome {
        if !self.throttle.accepts_remote(&event.remote) {
            return DispatchOutcome::RemoteFiltered;
        }

        if let Some(callback) = self.callbacks.get_mut(&event.key) {
            if self.throttle.is_enabled() {
                let count = match event.repeat_count_value() {
                    Ok(count) => count,
                    Err(_) => return DispatchOutcome::InvalidRepeatCount,
                };
                if count % u64::from(self.throttle.interval) != 0 {
                    return DispatchOutcome::Throttled { count };
                }
            }
            callback(event);
            return DispatchOutcome::Invoked;
        }

        match self.fallback.as_mut() {
            Some(fallback) => {
                fallback(event);
                DispatchOutcome::Fallback
            }
            None => DispatchOutcome::Unhandled,
        }
    }
}

impl EventHandler for Dispatcher {
    fn handle(&mut self, event: &LircEvent) {
        let outcome = self.dispatch(event);
        trace!(key = %event.key, remote = %event.remote, ?outcome, "dispatched lirc event");
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.callbacks.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Dispatcher")
            .field("keys", &keys)
            .field("fallback", &self.fallback.is_some())
            .field("throttle", &self.throttle)
            .finish()
    }
}

#[derive(Default)]
pub struct DispatcherBuilder {
    callbacks: HashMap<String, Callback>,
    fallback: Option<Callback>,
    throttle: ThrottleConfig,
}

impl DispatcherBuilder {
    /// Only every `interval`-th repeat of a held key reaches its callback.
    pub fn throttle(mut self, interval: u32) -> Self {
        self.throttle.interval = interval;
        self
    }

    /// Ignore events whose remote name differs from `remote`.
    pub fn remote(mut self, remote: impl Into<String>) -> Self {
        self.throttle.remote = Some(remote.into());
        self
    }

    pub fn throttle_config(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    /// Registers `callback` for `key`; the name `DEFAULT` sets the fallback.
    pub fn on<F>(mut self, key: impl Into<String>, callback: F) -> Self
    where
        F: FnMut(&LircEvent) + Send + 'static,
    {
        let key = key.into();
        if key == DEFAULT_KEY {
            self.fallback = Some(Box::new(callback));
        } else {
            self.callbacks.insert(key, Box::new(callback));
        }
        self
    }

    /// Called for keys without their own callback. Never throttled.
    pub fn fallback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&LircEvent) + Send + 'static,
    {
        self.fallback = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            callbacks: self.callbacks,
            fallback: self.fallback,
            throttle: self.throttle,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    type Calls = Arc<Mutex<Vec<String>>>;

    fn recorder(calls: &Calls, tag: &'static str) -> impl FnMut(&LircEvent) + Send + 'static {
        let calls = Arc::clone(calls);
        move |ev: &LircEvent| {
            calls
                .lock()
                .unwrap()
                .push(format!("{tag}:{}:{}", ev.key, ev.repeat_count));
        }
    }

    fn ev(count: &str, key: &str, remote: &str) -> LircEvent {
        LircEvent::new("a3f", count, key, remote)
    }

    #[test]
    fn other_remotes_are_always_filtered() {
        let calls = Calls::default();
        let mut d = Dispatcher::builder()
            .throttle(5)
            .remote("sony_tv")
            .on("KEY_UP", recorder(&calls, "up"))
            .fallback(recorder(&calls, "default"))
            .build();

        assert_eq!(d.dispatch(&ev("00", "KEY_UP", "onkyo")), DispatchOutcome::RemoteFiltered);
        assert_eq!(d.dispatch(&ev("05", "KEY_DOWN", "onkyo")), DispatchOutcome::RemoteFiltered);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn throttle_fires_on_multiples_only() {
        let calls = Calls::default();
        let mut d = Dispatcher::builder()
            .throttle(5)
            .remote("sony_tv")
            .on("KEY_UP", recorder(&calls, "up"))
            .build();

        assert_eq!(d.dispatch(&ev("00", "KEY_UP", "sony_tv")), DispatchOutcome::Invoked);
        assert_eq!(
            d.dispatch(&ev("03", "KEY_UP", "sony_tv")),
            DispatchOutcome::Throttled { count: 3 }
        );
        assert_eq!(d.dispatch(&ev("05", "KEY_UP", "sony_tv")), DispatchOutcome::Invoked);
        assert_eq!(d.dispatch(&ev("10", "KEY_UP", "sony_tv")), DispatchOutcome::Invoked);
        assert_eq!(
            d.dispatch(&ev("12", "KEY_UP", "sony_tv")),
            DispatchOutcome::Throttled { count: 12 }
        );
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["up:KEY_UP:00", "up:KEY_UP:05", "up:KEY_UP:10"]
        );
    }

    #[test]
    fn zero_interval_invokes_every_repeat() {
        let calls = Calls::default();
        let mut d = Dispatcher::builder()
            .on("KEY_UP", recorder(&calls, "up"))
            .build();

        for count in ["00", "01", "02", "07", "zz"] {
            assert_eq!(d.dispatch(&ev(count, "KEY_UP", "any")), DispatchOutcome::Invoked);
        }
        assert_eq!(calls.lock().unwrap().len(), 5);
    }

    #[test]
    fn unparsable_count_is_discarded_when_throttling() {
        let calls = Calls::default();
        let mut d = Dispatcher::builder()
            .throttle(2)
            .on("KEY_UP", recorder(&calls, "up"))
            .build();

        assert_eq!(
            d.dispatch(&ev("zz", "KEY_UP", "any")),
            DispatchOutcome::InvalidRepeatCount
        );
        assert_eq!(
            d.dispatch(&ev("0a", "KEY_UP", "any")),
            DispatchOutcome::InvalidRepeatCount
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn fallback_is_never_throttled() {
        let calls = Calls::default();
        let mut d = Dispatcher::builder()
            .throttle(5)
            .on("KEY_UP", recorder(&calls, "up"))
            .on(DEFAULT_KEY, recorder(&calls, "default"))
            .build();

        assert!(d.has_fallback());
        assert_eq!(d.dispatch(&ev("03", "KEY_OK", "any")), DispatchOutcome::Fallback);
        assert_eq!(d.dispatch(&ev("zz", "KEY_OK", "any")), DispatchOutcome::Fallback);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["default:KEY_OK:03", "default:KEY_OK:zz"]
        );
    }

    #[test]
    fn throttled_keyed_event_does_not_fall_back() {
        let calls = Calls::default();
        let mut d = Dispatcher::builder()
            .throttle(3)
            .on("KEY_UP", recorder(&calls, "up"))
            .fallback(recorder(&calls, "default"))
            .build();

        assert_eq!(
            d.dispatch(&ev("05", "KEY_UP", "any")),
            DispatchOutcome::Throttled { count: 5 }
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_callback_and_fallback_is_not_an_error() {
        let mut d = Dispatcher::builder().build();
        let outcome = d.dispatch(&ev("00", "KEY_UP", "any"));
        assert_eq!(outcome, DispatchOutcome::Unhandled);
        assert!(!outcome.invoked_callback());
    }
}
