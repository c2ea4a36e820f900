//! Timers run as Tokio tasks.
//!
//! Each timer is a spawned task that sleeps and then reports its event over a
//! channel. The owner drains the channel with [`Scheduler::next_until`] and
//! handles every event to completion before taking the next one, so handlers
//! never overlap. Under a paused Tokio clock the order is deterministic.

use crate::error::{HostError, HostResult};
use std::collections::HashMap;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

/// Milliseconds since the scheduler was created.
pub type Millis = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Fired<K, E> {
    id: TimerId,
    key: K,
    event: E,
}

#[derive(Debug)]
struct Timer {
    /// `None` for zero-delay timeouts, which are queued directly.
    task: Option<JoinHandle<()>>,
    repeating: bool,
}

/// Timer tasks for many owners, each event tagged with its owner's key.
#[derive(Debug)]
pub struct Scheduler<K, E> {
    handle: Handle,
    started: Instant,
    sender: UnboundedSender<Fired<K, E>>,
    receiver: UnboundedReceiver<Fired<K, E>>,
    timers: HashMap<TimerId, Timer>,
    next_id: u64,
}

impl<K, E> Scheduler<K, E>
where
    K: Copy + Send + 'static,
    E: Clone + Send + 'static,
{
    /// A scheduler spawning onto the current Tokio runtime.
    pub fn new() -> HostResult<Self> {
        let handle =
            Handle::try_current().map_err(|err| HostError::NoRuntime(err.to_string()))?;
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok(Self {
            handle,
            started: Instant::now(),
            sender,
            receiver,
            timers: HashMap::new(),
            next_id: 0,
        })
    }

    pub fn now(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }

    /// The instant `at` ms after the scheduler was created.
    pub fn instant_at(&self, at: Millis) -> Instant {
        self.started + Duration::from_millis(at)
    }

    /// Reports `event` once, `delay` ms from now.
    pub fn set_timeout(&mut self, key: K, delay: Millis, event: E) -> TimerId {
        let id = self.allocate();
        if delay == 0 {
            // The receiver lives as long as `self`.
            let _ = self.sender.send(Fired { id, key, event });
            self.timers.insert(
                id,
                Timer {
                    task: None,
                    repeating: false,
                },
            );
            return id;
        }

        let due = Instant::now() + Duration::from_millis(delay);
        let sender = self.sender.clone();
        let task = self.handle.spawn(async move {
            time::sleep_until(due).await;
            let _ = sender.send(Fired { id, key, event });
        });
        self.timers.insert(
            id,
            Timer {
                task: Some(task),
                repeating: false,
            },
        );
        id
    }

    /// Reports `event` every `period` ms, starting one period from now.
    pub fn set_interval(&mut self, key: K, period: Millis, event: E) -> TimerId {
        let id = self.allocate();
        let period = Duration::from_millis(period.max(1));
        let first = Instant::now() + period;
        let sender = self.sender.clone();
        let task = self.handle.spawn(async move {
            let mut ticks = time::interval_at(first, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let fired = Fired {
                    id,
                    key,
                    event: event.clone(),
                };
                if sender.send(fired).is_err() {
                    break;
                }
            }
        });
        self.timers.insert(
            id,
            Timer {
                task: Some(task),
                repeating: true,
            },
        );
        id
    }

    /// Cancels a timer. Returns `false` if it already fired or never existed.
    pub fn clear(&mut self, id: TimerId) -> bool {
        match self.timers.remove(&id) {
            Some(timer) => {
                if let Some(task) = timer.task {
                    task.abort();
                }
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Waits for the next live event, or returns `None` once `deadline` has
    /// passed and nothing due by then is left to report.
    pub async fn next_until(&mut self, deadline: Instant) -> Option<(K, E)> {
        loop {
            let fired = tokio::select! {
                biased;
                fired = self.receiver.recv() => fired,
                _ = time::sleep_until(deadline) => None,
            };
            let fired = match fired {
                Some(fired) => fired,
                None => {
                    // Timers woken together with the deadline report after one yield.
                    task::yield_now().await;
                    self.receiver.try_recv().ok()?
                }
            };
            if let Some(event) = self.accept(fired) {
                return Some(event);
            }
        }
    }

    fn accept(&mut self, fired: Fired<K, E>) -> Option<(K, E)> {
        let repeating = self.timers.get(&fired.id)?.repeating;
        if !repeating {
            self.timers.remove(&fired.id);
        }
        Some((fired.key, fired.event))
    }

    fn allocate(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl<K, E> Drop for Scheduler<K, E> {
    fn drop(&mut self) {
        for timer in self.timers.values() {
            if let Some(task) = &timer.task {
                task.abort();
            }
        }
    }
}

/// Scheduling surface handed to components that need timers.
pub trait Timers<E> {
    fn now(&self) -> Millis;
    fn set_timeout(&mut self, delay: Millis, event: E) -> TimerId;
    fn set_interval(&mut self, period: Millis, event: E) -> TimerId;
    fn clear(&mut self, id: TimerId) -> bool;
}

/// A single-owner scheduler needs no key.
impl<E: Clone + Send + 'static> Timers<E> for Scheduler<(), E> {
    fn now(&self) -> Millis {
        Scheduler::now(self)
    }

    fn set_timeout(&mut self, delay: Millis, event: E) -> TimerId {
        Scheduler::set_timeout(self, (), delay, event)
    }

    fn set_interval(&mut self, period: Millis, event: E) -> TimerId {
        Scheduler::set_interval(self, (), period, event)
    }

    fn clear(&mut self, id: TimerId) -> bool {
        Scheduler::clear(self, id)
    }
}

/// One owner's view of a shared scheduler.
pub struct Scoped<'a, K, E> {
    scheduler: &'a mut Scheduler<K, E>,
    key: K,
}

impl<'a, K, E> Scoped<'a, K, E> {
    pub fn new(scheduler: &'a mut Scheduler<K, E>, key: K) -> Self {
        Self { scheduler, key }
    }
}

impl<K, E> Timers<E> for Scoped<'_, K, E>
where
    K: Copy + Send + 'static,
    E: Clone + Send + 'static,
{
    fn now(&self) -> Millis {
        self.scheduler.now()
    }

    fn set_timeout(&mut self, delay: Millis, event: E) -> TimerId {
        self.scheduler.set_timeout(self.key, delay, event)
    }

    fn set_interval(&mut self, period: Millis, event: E) -> TimerId {
        self.scheduler.set_interval(self.key, period, event)
    }

    fn clear(&mut self, id: TimerId) -> bool {
        self.scheduler.clear(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(
        scheduler: &mut Scheduler<(), &'static str>,
        until: Millis,
    ) -> Vec<(Millis, &'static str)> {
        let deadline = scheduler.instant_at(until);
        let mut fired = Vec::new();
        while let Some(((), event)) = scheduler.next_until(deadline).await {
            fired.push((scheduler.now(), event));
        }
        fired
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_fire_in_due_order() {
        let mut scheduler = Scheduler::new().unwrap();
        scheduler.set_timeout((), 50, "late");
        scheduler.set_timeout((), 0, "now");
        scheduler.set_timeout((), 80, "later");

        assert_eq!(
            drain(&mut scheduler, 100).await,
            vec![(0, "now"), (50, "late"), (80, "later")]
        );
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn intervals_repeat_until_cleared() {
        let mut scheduler = Scheduler::new().unwrap();
        let poll = scheduler.set_interval((), 500, "poll");

        assert_eq!(
            drain(&mut scheduler, 1_200).await,
            vec![(500, "poll"), (1_000, "poll")]
        );
        assert!(scheduler.clear(poll));
        assert!(drain(&mut scheduler, 5_000).await.is_empty());
        assert!(!scheduler.clear(poll));
    }

    #[tokio::test(start_paused = true)]
    async fn events_due_at_the_deadline_are_included() {
        let mut scheduler = Scheduler::new().unwrap();
        scheduler.set_interval((), 500, "poll");
        assert_eq!(drain(&mut scheduler, 500).await, vec![(500, "poll")]);
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_timeout_never_fires() {
        let mut scheduler = Scheduler::new().unwrap();
        let retry = scheduler.set_timeout((), 50, "retry");
        let settle = scheduler.set_timeout((), 0, "settle");
        scheduler.set_timeout((), 60, "other");
        assert!(scheduler.clear(retry));
        assert!(scheduler.clear(settle));

        assert_eq!(drain(&mut scheduler, 100).await, vec![(60, "other")]);
    }

    #[tokio::test(start_paused = true)]
    async fn scoped_timers_tag_events() {
        let mut scheduler: Scheduler<u32, &'static str> = Scheduler::new().unwrap();
        {
            let mut scoped = Scoped::new(&mut scheduler, 7);
            scoped.set_timeout(10, "tick");
        }
        let deadline = scheduler.instant_at(10);
        assert_eq!(scheduler.next_until(deadline).await, Some((7, "tick")));
    }

    #[test]
    fn needs_a_tokio_runtime() {
        let result: HostResult<Scheduler<(), ()>> = Scheduler::new();
        assert!(matches!(result, Err(HostError::NoRuntime(_))));
    }
}
