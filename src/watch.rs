use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::event::Event;
use crate::resolver::ThemeResolver;
use crate::theme::SignalProbe;

type Interrupt = Pin<Box<dyn Future<Output = ()> + Send>>;

fn ctrl_c() -> Interrupt {
    Box::pin(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
}

/// Polls a [`SignalProbe`] and yields an event whenever the reading changes.
///
/// One interrupt listener lives as long as the poller, so an interrupt that
/// lands while the probe is running is not lost.
pub struct SignalEvents {
    probe: Arc<dyn SignalProbe>,
    poll_interval: Duration,
    ticker: Option<Interval>,
    interrupt: Interrupt,
    interrupted: bool,
    last: bool,
}

impl SignalEvents {
    pub fn new(probe: Arc<dyn SignalProbe>, poll_interval: Duration, current: bool) -> Self {
        Self {
            probe,
            poll_interval,
            ticker: None,
            interrupt: ctrl_c(),
            interrupted: false,
            last: current,
        }
    }

    /// Replace Ctrl-C with another interrupt source.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: impl Future<Output = ()> + Send + 'static) -> Self {
        self.interrupt = Box::pin(interrupt);
        self
    }

    pub async fn next(&mut self) -> Event {
        if self.interrupted {
            return Event::Interrupt;
        }

        let poll_interval = self.poll_interval;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            // Interrupt is polled first so its listener is registered before any probe runs.
            tokio::select! {
                biased;
                () = &mut self.interrupt => {
                    self.interrupted = true;
                    return Event::Interrupt;
                }
                _ = ticker.tick() => {}
            }

            let probe = Arc::clone(&self.probe);
            let reading = tokio::select! {
                biased;
                () = &mut self.interrupt => {
                    self.interrupted = true;
                    return Event::Interrupt;
                }
                joined = tokio::task::spawn_blocking(move || probe.prefers_dark()) => joined,
            };

            match reading {
                Ok(Some(dark)) if dark != self.last => {
                    self.last = dark;
                    return Event::SignalChanged(dark);
                }
                Ok(Some(_)) => {}
                Ok(None) => debug!("system color scheme unavailable"),
                Err(e) => warn!(error = %e, "signal probe task failed"),
            }
        }
    }
}

/// Feed signal changes into the resolver until interrupted.
pub async fn run(resolver: &mut ThemeResolver, events: &mut SignalEvents) {
    loop {
        match events.next().await {
            Event::SignalChanged(dark) => {
                resolver.on_system_signal_change(dark);
            }
            Event::Interrupt => {
                debug!("watch interrupted");
                break;
            }
        }
    }
}
