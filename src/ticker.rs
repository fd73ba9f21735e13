//! The thread that owns an [`AlarmMonitor`] and ticks it on a fixed cadence.
//!
//! The thread lives exactly as long as its [`MonitorHandle`]: stopping or
//! dropping the handle shuts the thread down and joins it. Commands and
//! ticks are handled on that one thread, so they never overlap.

use std::{
    io,
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use chrono::NaiveDateTime;
use log::{debug, info, warn};

use crate::{
    alarm::Alarm,
    communication::{ClearReason, Command, Notification},
    monitor::AlarmMonitor,
};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// wall clock time in the local timezone
#[must_use]
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// cheap, cloneable way to send commands to a running monitor
/// every method returns false if the monitor thread is already gone
#[derive(Debug, Clone)]
pub struct Remote {
    sender: Sender<Command>,
}

impl Remote {
    pub fn send(&self, command: Command) -> bool {
        self.sender.send(command).is_ok()
    }

    pub fn dismiss(&self) -> bool {
        self.send(Command::Dismiss)
    }

    pub fn snooze(&self) -> bool {
        self.send(Command::Snooze)
    }

    pub fn replace_alarms(&self, alarms: Vec<Alarm>) -> bool {
        self.send(Command::ReplaceAlarms(alarms))
    }

    pub fn shutdown(&self) -> bool {
        self.send(Command::Shutdown)
    }
}

#[derive(Debug)]
pub struct MonitorHandle {
    remote: Remote,
    notifications: Receiver<Notification>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// spawns the monitor thread, the first tick happens immediately
    ///
    /// # Errors
    /// if the os refuses to spawn the thread
    pub fn start<C>(
        monitor: AlarmMonitor,
        alarms: Vec<Alarm>,
        interval: Duration,
        clock: C,
    ) -> io::Result<Self>
    where
        C: Fn() -> NaiveDateTime + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel();
        let (notification_tx, notification_rx) = mpsc::channel();
        let worker = Worker {
            monitor,
            alarms,
            interval: interval.max(Duration::from_millis(1)),
            clock,
            notifications: notification_tx,
        };
        let thread = thread::Builder::new()
            .name("alarm-monitor".to_string())
            .spawn(move || worker.run(&command_rx))?;
        info!("alarm monitor started, ticking every {interval:?}");
        Ok(Self {
            remote: Remote { sender: command_tx },
            notifications: notification_rx,
            thread: Some(thread),
        })
    }

    #[must_use]
    pub fn remote(&self) -> Remote {
        self.remote.clone()
    }

    #[must_use]
    pub const fn notifications(&self) -> &Receiver<Notification> {
        &self.notifications
    }

    /// stops ticking and waits for the thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            // the thread may have exited already if a remote sent shutdown
            self.remote.shutdown();
            if thread.join().is_err() {
                warn!("alarm monitor thread panicked");
            }
            info!("alarm monitor stopped");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker<C> {
    monitor: AlarmMonitor,
    alarms: Vec<Alarm>,
    interval: Duration,
    clock: C,
    notifications: Sender<Notification>,
}

impl<C> Worker<C>
where
    C: Fn() -> NaiveDateTime,
{
    fn run(mut self, commands: &Receiver<Command>) {
        let mut next_tick = Instant::now();
        loop {
            let timeout = next_tick.saturating_duration_since(Instant::now());
            match commands.recv_timeout(timeout) {
                Ok(Command::Dismiss) => {
                    if let Some(alarm) = self.monitor.dismiss() {
                        self.notify(Notification::AlarmCleared {
                            alarm,
                            reason: ClearReason::Dismissed,
                        });
                    }
                }
                Ok(Command::Snooze) => {
                    if let Some(alarm) = self.monitor.snooze() {
                        self.notify(Notification::AlarmCleared {
                            alarm,
                            reason: ClearReason::Snoozed,
                        });
                    }
                }
                Ok(Command::ReplaceAlarms(alarms)) => {
                    debug!("alarm list replaced, {} alarms", alarms.len());
                    self.alarms = alarms;
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    self.tick();
                    next_tick += self.interval;
                    let now = Instant::now();
                    // after a stall resume on the cadence instead of bursting catch up ticks
                    if next_tick <= now {
                        next_tick = now + self.interval;
                    }
                }
            }
        }
    }

    fn tick(&mut self) {
        let now = (self.clock)();
        if let Some(alarm) = self.monitor.tick(&self.alarms, now).cloned() {
            self.notify(Notification::AlarmTriggered(alarm));
        }
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            warn!("nobody is listening for alarm notifications");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::TriggerPolicy;
    use chrono::NaiveDate;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    const FAST: Duration = Duration::from_millis(10);
    const WAIT: Duration = Duration::from_secs(2);

    fn half_past_seven() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap()
    }

    fn wake_up() -> Alarm {
        Alarm::new(1, "07:30", Some("wake up".to_string()))
    }

    #[test]
    fn triggers_then_dismisses() {
        let handle = MonitorHandle::start(
            AlarmMonitor::new(TriggerPolicy::OncePerMinute),
            vec![wake_up()],
            FAST,
            half_past_seven,
        )
        .unwrap();

        let first = handle.notifications().recv_timeout(WAIT).unwrap();
        assert_eq!(first, Notification::AlarmTriggered(wake_up()));

        assert!(handle.remote().dismiss());
        let cleared = handle.notifications().recv_timeout(WAIT).unwrap();
        assert_eq!(
            cleared,
            Notification::AlarmCleared {
                alarm: wake_up(),
                reason: ClearReason::Dismissed,
            }
        );

        // same minute, already fired
        assert!(handle
            .notifications()
            .recv_timeout(Duration::from_millis(100))
            .is_err());
        handle.stop();
    }

    #[test]
    fn snooze_reports_its_reason() {
        let handle = MonitorHandle::start(
            AlarmMonitor::default(),
            vec![wake_up()],
            FAST,
            half_past_seven,
        )
        .unwrap();
        handle.notifications().recv_timeout(WAIT).unwrap();
        handle.remote().snooze();
        match handle.notifications().recv_timeout(WAIT).unwrap() {
            Notification::AlarmCleared { reason, .. } => assert_eq!(reason, ClearReason::Snoozed),
            other => panic!("unexpected notification {other:?}"),
        }
    }

    #[test]
    fn dismiss_without_trigger_is_silent() {
        let handle =
            MonitorHandle::start(AlarmMonitor::default(), vec![], FAST, half_past_seven).unwrap();
        handle.remote().dismiss();
        assert!(handle
            .notifications()
            .recv_timeout(Duration::from_millis(100))
            .is_err());
    }

    #[test]
    fn replaced_alarms_are_seen_on_the_next_tick() {
        let handle =
            MonitorHandle::start(AlarmMonitor::default(), vec![], FAST, half_past_seven).unwrap();
        assert!(handle
            .notifications()
            .recv_timeout(Duration::from_millis(50))
            .is_err());
        handle.remote().replace_alarms(vec![wake_up()]);
        assert_eq!(
            handle.notifications().recv_timeout(WAIT).unwrap(),
            Notification::AlarmTriggered(wake_up())
        );
    }

    #[test]
    fn stopping_cancels_the_timer() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let handle = MonitorHandle::start(AlarmMonitor::default(), vec![], FAST, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            half_past_seven()
        })
        .unwrap();
        thread::sleep(Duration::from_millis(50));
        handle.stop();

        let after_stop = ticks.load(Ordering::SeqCst);
        assert!(after_stop >= 1);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn dropping_the_handle_cancels_the_timer() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        {
            let _handle = MonitorHandle::start(AlarmMonitor::default(), vec![], FAST, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                half_past_seven()
            })
            .unwrap();
            thread::sleep(Duration::from_millis(30));
        }
        let after_drop = ticks.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn remote_shutdown_ends_notifications() {
        let handle =
            MonitorHandle::start(AlarmMonitor::default(), vec![], FAST, half_past_seven).unwrap();
        handle.remote().shutdown();
        // sender side is dropped once the thread exits
        assert_eq!(
            handle.notifications().recv_timeout(WAIT),
            Err(RecvTimeoutError::Disconnected)
        );
    }
}
