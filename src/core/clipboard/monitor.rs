use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use super::engine::ClipboardEngine;
use crate::shared::errors::{EngineError, EngineResult};
use crate::shared::events::HistoryEvent;
use crate::shared::types::HistoryEntry;

const COMMAND_CHANNEL_CAPACITY: usize = 32;

enum Command {
    Start(oneshot::Sender<()>),
    Stop(oneshot::Sender<()>),
    IsRunning(oneshot::Sender<bool>),
    Items(oneshot::Sender<Vec<HistoryEntry>>),
    CopyToClipboard(Uuid, oneshot::Sender<EngineResult<()>>),
    TogglePin(Uuid, oneshot::Sender<EngineResult<bool>>),
    Remove(Uuid, oneshot::Sender<EngineResult<HistoryEntry>>),
    Clear(oneshot::Sender<()>),
    Shutdown,
}

enum Wake {
    Command(Option<Command>),
    Tick,
}

/// Handle to the clipboard engine running in its own task
///
/// The task is the engine's only owner: ticks and commands are handled one
/// at a time, in arrival order. Clones talk to the same task.
#[derive(Clone)]
pub struct ClipboardMonitor {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<HistoryEvent>,
}

impl ClipboardMonitor {
    /// Move `engine` into a new task. The monitor starts out stopped.
    pub fn spawn(engine: ClipboardEngine, poll_interval: Duration) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let events = engine.event_sender();
        let handle = tokio::spawn(run(engine, receiver, poll_interval));
        (Self { commands, events }, handle)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> EngineResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| EngineError::MonitorClosed)?;
        response.await.map_err(|_| EngineError::MonitorClosed)
    }

    /// Start polling; restarts the timer and re-reads the baseline if already running
    pub async fn start(&self) -> EngineResult<()> {
        self.request(Command::Start).await
    }

    /// Stop polling. No tick runs once this has returned.
    pub async fn stop(&self) -> EngineResult<()> {
        self.request(Command::Stop).await
    }

    pub async fn is_running(&self) -> EngineResult<bool> {
        self.request(Command::IsRunning).await
    }

    /// Snapshot of the history in display order
    pub async fn items(&self) -> EngineResult<Vec<HistoryEntry>> {
        self.request(Command::Items).await
    }

    pub async fn copy_to_clipboard(&self, id: Uuid) -> EngineResult<()> {
        self.request(|reply| Command::CopyToClipboard(id, reply)).await?
    }

    pub async fn toggle_pin(&self, id: Uuid) -> EngineResult<bool> {
        self.request(|reply| Command::TogglePin(id, reply)).await?
    }

    pub async fn remove(&self, id: Uuid) -> EngineResult<HistoryEntry> {
        self.request(|reply| Command::Remove(id, reply)).await?
    }

    pub async fn clear(&self) -> EngineResult<()> {
        self.request(Command::Clear).await
    }

    /// Ask the task to exit; await the `JoinHandle` from `spawn` to wait for it
    pub async fn shutdown(&self) -> EngineResult<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| EngineError::MonitorClosed)
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn new_ticker(poll_interval: Duration) -> Interval {
    // The first tick fires immediately, like a timer that is fired on start
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn run(mut engine: ClipboardEngine, mut commands: mpsc::Receiver<Command>, poll_interval: Duration) {
    let mut ticker: Option<Interval> = None;
    debug!(?poll_interval, "clipboard monitor task started");

    loop {
        let wake = tokio::select! {
            // Commands first, so a pending stop wins over a due tick
            biased;
            command = commands.recv() => Wake::Command(command),
            _ = next_tick(&mut ticker) => Wake::Tick,
        };

        let command = match wake {
            Wake::Tick => {
                engine.tick();
                continue;
            }
            Wake::Command(Some(command)) => command,
            // Every handle is gone
            Wake::Command(None) => break,
        };

        match command {
            Command::Start(reply) => {
                engine.start();
                ticker = Some(new_ticker(poll_interval));
                let _ = reply.send(());
            }
            Command::Stop(reply) => {
                ticker = None;
                engine.stop();
                let _ = reply.send(());
            }
            Command::IsRunning(reply) => {
                let _ = reply.send(engine.is_running());
            }
            Command::Items(reply) => {
                let _ = reply.send(engine.items());
            }
            Command::CopyToClipboard(id, reply) => {
                let _ = reply.send(engine.copy_to_clipboard(id));
            }
            Command::TogglePin(id, reply) => {
                let _ = reply.send(engine.toggle_pin(id));
            }
            Command::Remove(id, reply) => {
                let _ = reply.send(engine.remove(id));
            }
            Command::Clear(reply) => {
                engine.clear();
                let _ = reply.send(());
            }
            Command::Shutdown => break,
        }
    }

    engine.stop();
    info!("clipboard monitor shut down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clipboard::testing::{FakeClipboard, ManualClock};
    use crate::shared::settings::EngineSettings;

    const POLL: Duration = Duration::from_millis(500);

    fn spawn_monitor() -> (ClipboardMonitor, JoinHandle<()>, FakeClipboard, ManualClock) {
        let clipboard = FakeClipboard::new();
        let clock = ManualClock::new();
        let engine = ClipboardEngine::new(&EngineSettings::default(), clipboard.clone())
            .with_clock(clock.clone());
        let (monitor, handle) = ClipboardMonitor::spawn(engine, POLL);
        (monitor, handle, clipboard, clock)
    }

    /// Let the paused runtime run a few poll periods; each wake lands just
    /// past a tick deadline so the monitor has handled it first
    async fn polls(clock: &ManualClock, count: u32) {
        for _ in 0..count {
            clock.advance(POLL);
            tokio::time::sleep(POLL + Duration::from_millis(1)).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_external_copies_while_running() {
        let (monitor, handle, clipboard, clock) = spawn_monitor();
        clipboard.set_text("hello");
        monitor.start().await.unwrap();
        assert!(monitor.is_running().await.unwrap());

        polls(&clock, 2).await;
        assert!(monitor.items().await.unwrap().is_empty());

        clipboard.set_text("world");
        polls(&clock, 2).await;
        let items = monitor.items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].preview, "world");

        monitor.shutdown().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_running_restarts_the_timer() {
        let (monitor, handle, clipboard, _clock) = spawn_monitor();
        let mut events = monitor.subscribe();

        // Baseline read plus the timer's immediate first tick
        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(clipboard.reads(), 2);

        monitor.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(clipboard.reads(), 4);

        // The first timer would have fired at 500ms, the new one fires at 750ms
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(clipboard.reads(), 4);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(clipboard.reads(), 5);

        let mut started = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, HistoryEvent::MonitorStateChanged(true)) {
                started += 1;
            }
        }
        assert_eq!(started, 1);

        monitor.shutdown().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let (monitor, handle, clipboard, clock) = spawn_monitor();
        monitor.start().await.unwrap();
        monitor.stop().await.unwrap();
        assert!(!monitor.is_running().await.unwrap());

        clipboard.set_text("ignored");
        polls(&clock, 4).await;
        assert!(monitor.items().await.unwrap().is_empty());

        monitor.shutdown().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_back_is_not_recorded_again() {
        let (monitor, handle, clipboard, clock) = spawn_monitor();
        let mut events = monitor.subscribe();
        monitor.start().await.unwrap();

        clipboard.set_text("a");
        polls(&clock, 1).await;
        clipboard.set_text("b");
        polls(&clock, 1).await;

        let items = monitor.items().await.unwrap();
        assert_eq!(items.len(), 2);
        let a = items.iter().find(|e| e.preview == "a").unwrap().id;

        monitor.copy_to_clipboard(a).await.unwrap();
        polls(&clock, 6).await;

        let items = monitor.items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|e| e.copy_count == 1));

        let mut copied = false;
        while let Ok(event) = events.try_recv() {
            copied |= matches!(event, HistoryEvent::Copied(id) if id == a);
        }
        assert!(copied);

        monitor.shutdown().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_fail_after_shutdown() {
        let (monitor, handle, _clipboard, _clock) = spawn_monitor();
        monitor.shutdown().await.unwrap();
        handle.await.unwrap();

        assert_eq!(monitor.items().await.unwrap_err(), EngineError::MonitorClosed);
        assert_eq!(
            monitor.toggle_pin(Uuid::new_v4()).await,
            Err(EngineError::MonitorClosed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_and_clear_through_handle() {
        let (monitor, handle, clipboard, clock) = spawn_monitor();
        monitor.start().await.unwrap();
        clipboard.set_text("one");
        polls(&clock, 1).await;
        clipboard.set_text("two");
        polls(&clock, 1).await;

        let items = monitor.items().await.unwrap();
        let removed = monitor.remove(items[0].id).await.unwrap();
        assert_eq!(removed.id, items[0].id);
        assert_eq!(monitor.items().await.unwrap().len(), 1);

        monitor.clear().await.unwrap();
        assert!(monitor.items().await.unwrap().is_empty());
        assert_eq!(clipboard.current_text(), None);

        monitor.shutdown().await.unwrap();
        handle.await.unwrap();
    }
}
