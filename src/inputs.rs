pub mod event_source {
    use std::time::Duration;

    use anyhow::Result;
    use crossterm::event::{self, Event};

    /// Source of terminal events, abstracted so the app loop can be driven by
    /// a script in tests.
    pub trait EventSource {
        fn poll(&mut self, timeout: Duration) -> Result<bool>;
        fn read(&mut self) -> Result<Event>;
    }

    pub struct KeyboardEventSource;

    impl EventSource for KeyboardEventSource {
        fn poll(&mut self, timeout: Duration) -> Result<bool> {
            Ok(event::poll(timeout)?)
        }

        fn read(&mut self) -> Result<Event> {
            Ok(event::read()?)
        }
    }

    /// Replays a fixed list of events, then reports quiescence.
    #[cfg(any(test, feature = "test-utils"))]
    pub struct ScriptedEventSource {
        events: std::collections::VecDeque<Event>,
    }

    #[cfg(any(test, feature = "test-utils"))]
    impl ScriptedEventSource {
        pub fn new(events: Vec<Event>) -> Self {
            Self {
                events: events.into(),
            }
        }

        pub fn is_exhausted(&self) -> bool {
            self.events.is_empty()
        }
    }

    #[cfg(any(test, feature = "test-utils"))]
    impl EventSource for ScriptedEventSource {
        fn poll(&mut self, _timeout: Duration) -> Result<bool> {
            Ok(!self.events.is_empty())
        }

        fn read(&mut self) -> Result<Event> {
            self.events
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("scripted event source exhausted"))
        }
    }
}
