//! Polling a probe until its result is truthy, and optionally stable.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use uitest_core::{Clock, Config, SystemClock, Truthy};

/// One probe result and the clock reading taken just before the probe ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<T> {
    /// Value returned by the probe
    pub value: T,
    /// Seconds since the epoch when the probe was started
    pub observed_at: f64,
}

/// A run of consecutive observations with equal candidates.
struct Run<T, P> {
    first: Observation<T>,
    candidate: P,
}

/// Repeatedly run a probe until it returns a truthy value.
///
/// With [`with_stable`](Self::with_stable) the candidate must also stay the
/// same for the given duration; the first observation of that stable run is
/// returned. After the timeout the probe is called one last time, and the
/// poller gives up with `None` if even that attempt is truthy but wasn't
/// accepted. A falsy last value is returned as `Some`, so callers can inspect
/// the failure (a non-matching result, for example).
#[derive(Debug, Clone)]
pub struct WaitUntil {
    timeout: Duration,
    interval: Duration,
    stable: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl Default for WaitUntil {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            interval: Duration::ZERO,
            stable: None,
            clock: Arc::new(SystemClock),
        }
    }
}

impl WaitUntil {
    /// Create a new poller with a 10 second timeout, no interval and no
    /// stability requirement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a poller with the defaults from the `wait` configuration section.
    ///
    /// Fails with `Error::Config` if a setting isn't a valid duration.
    pub fn from_config(config: &Config) -> uitest_core::Result<Self> {
        Ok(Self {
            timeout: config.wait.timeout()?,
            interval: config.wait.interval()?,
            stable: config.wait.stable()?,
            ..Self::default()
        })
    }

    /// Set the total time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the minimum spacing between probe invocations.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Require the candidate to stay the same for `stable`.
    ///
    /// A zero duration disables the requirement.
    pub fn with_stable(mut self, stable: Duration) -> Self {
        self.stable = (!stable.is_zero()).then_some(stable);
        self
    }

    /// Use a different clock (usually a `SimulatedClock` in tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Total time budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Minimum spacing between probe invocations.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stability requirement, if any.
    pub fn stable(&self) -> Option<Duration> {
        self.stable
    }

    /// Poll until the probe's own result is truthy (and stable).
    ///
    /// Results are only compared with `==` when a stability requirement is
    /// set.
    pub fn run<T, F>(&self, mut probe: F) -> Option<T>
    where
        F: FnMut() -> T,
        T: Truthy + PartialEq,
    {
        self.poll(
            || Ok::<_, Infallible>(probe()),
            |value| value.is_truthy(),
            |run, value, _| run.first.value == *value,
        )
        .unwrap_or_else(|never| match never {})
        .map(|observation| observation.value)
    }

    /// Poll until `predicate` applied to the probe's result is truthy (and
    /// stable).
    ///
    /// Stability compares predicate results, so a probe can return values
    /// that differ in detail (timestamps, say) while the part the predicate
    /// picks out stays put. The probe's result is returned, never the
    /// predicate's.
    pub fn run_with<T, P, F, G>(&self, mut probe: F, predicate: G) -> Option<T>
    where
        F: FnMut() -> T,
        G: FnMut(&T) -> P,
        T: Truthy,
        P: Truthy + PartialEq,
    {
        self.try_run_with(|| Ok::<_, Infallible>(probe()), predicate)
            .unwrap_or_else(|never| match never {})
    }

    /// Like [`run_with`](Self::run_with) for a fallible probe.
    ///
    /// The first error aborts polling and is returned unchanged.
    pub fn try_run_with<T, P, E, F, G>(&self, probe: F, predicate: G) -> Result<Option<T>, E>
    where
        F: FnMut() -> Result<T, E>,
        G: FnMut(&T) -> P,
        T: Truthy,
        P: Truthy + PartialEq,
    {
        Ok(self
            .observe_with(probe, predicate)?
            .map(|observation| observation.value))
    }

    /// Like [`try_run_with`](Self::try_run_with), also reporting when the
    /// returned value was observed.
    pub fn observe_with<T, P, E, F, G>(
        &self,
        probe: F,
        predicate: G,
    ) -> Result<Option<Observation<T>>, E>
    where
        F: FnMut() -> Result<T, E>,
        G: FnMut(&T) -> P,
        T: Truthy,
        P: Truthy + PartialEq,
    {
        self.poll(probe, predicate, |run, _, candidate| {
            run.candidate == *candidate
        })
    }

    fn poll<T, P, E>(
        &self,
        mut probe: impl FnMut() -> Result<T, E>,
        mut predicate: impl FnMut(&T) -> P,
        same_run: impl Fn(&Run<T, P>, &T, &P) -> bool,
    ) -> Result<Option<Observation<T>>, E>
    where
        T: Truthy,
        P: Truthy,
    {
        let start = self.clock.now();
        let deadline = start + self.timeout.as_secs_f64();
        let mut run: Option<Run<T, P>> = None;

        loop {
            let t = self.clock.now();
            let value = probe()?;
            let candidate = predicate(&value);

            let last = match self.stable {
                None if candidate.is_truthy() => {
                    debug!("wait_until succeeded after {:.3}s", t - start);
                    return Ok(Some(Observation {
                        value,
                        observed_at: t,
                    }));
                }
                None => Observation {
                    value,
                    observed_at: t,
                },
                Some(stable) => match run.take() {
                    Some(r) if same_run(&r, &value, &candidate) => {
                        let held = t - r.first.observed_at;
                        if candidate.is_truthy() && held >= stable.as_secs_f64() {
                            debug!(
                                "wait_until stable for {:.3}s after {:.3}s",
                                held,
                                t - start
                            );
                            return Ok(Some(r.first));
                        }
                        run = Some(r);
                        Observation {
                            value,
                            observed_at: t,
                        }
                    }
                    _ => {
                        // A new run is never stable yet (stable > 0).
                        let first = Observation {
                            value,
                            observed_at: t,
                        };
                        if t >= deadline {
                            return Ok(self.give_up(first, start));
                        }
                        run = Some(Run { first, candidate });
                        self.pace(t);
                        continue;
                    }
                },
            };

            if t >= deadline {
                return Ok(self.give_up(last, start));
            }
            self.pace(t);
        }
    }

    /// Outcome of the last try after the deadline.
    fn give_up<T: Truthy>(&self, last: Observation<T>, start: f64) -> Option<Observation<T>> {
        let waited = last.observed_at - start;
        if last.value.is_truthy() {
            debug!("wait_until timed out after {waited:.3}s without a stable result");
            None
        } else {
            debug!("wait_until timed out after {waited:.3}s, returning the last falsy value");
            Some(last)
        }
    }

    /// Sleep out the rest of the interval that started at `t`.
    fn pace(&self, t: f64) {
        let remaining = self.interval.as_secs_f64() - (self.clock.now() - t);
        if remaining > 0.0 {
            self.clock.sleep(Duration::from_secs_f64(remaining));
        }
    }
}

/// Wait with the default settings until `probe` returns a truthy value.
///
/// Shorthand for `WaitUntil::new().run(probe)`; build a [`WaitUntil`] to
/// change the timeout, interval or stability requirement.
pub fn wait_until<T, F>(probe: F) -> Option<T>
where
    F: FnMut() -> T,
    T: Truthy + PartialEq,
{
    WaitUntil::new().run(probe)
}
