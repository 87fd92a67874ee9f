//! Periodic maintenance threads.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};
use tracing::{trace, warn};

use super::{Chord, FingerRefresher, RejoinWatchdog};

#[derive(Debug)]
/// Handles of the running maintenance threads.
///
/// Dropping the shutdown sender disconnects every thread's receiver, which stops it at its
/// next wake up.
pub(crate) struct Maintenance {
    shutdown: Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl Maintenance {
    pub fn start(chord: &Chord) -> Result<Self, std::io::Error> {
        let (shutdown, receiver) = flume::bounded::<()>(1);
        let config = chord.config().clone();
        let port = chord.local().port();

        let mut handles = Vec::with_capacity(5);

        let node = chord.clone();
        handles.push(spawn_loop(
            format!("chord-stabilize-successors-{port}"),
            config.stabilize_interval,
            receiver.clone(),
            move || node.stabilize_successors(),
        )?);

        let node = chord.clone();
        handles.push(spawn_loop(
            format!("chord-stabilize-predecessors-{port}"),
            config.stabilize_interval,
            receiver.clone(),
            move || node.stabilize_predecessors(),
        )?);

        let node = chord.clone();
        let mut refresher = FingerRefresher::new();
        handles.push(spawn_loop(
            format!("chord-fix-fingers-{port}"),
            config.fix_fingers_interval,
            receiver.clone(),
            move || refresher.tick(&node),
        )?);

        let node = chord.clone();
        let mut watchdog = RejoinWatchdog::new();
        handles.push(spawn_loop(
            format!("chord-rejoin-{port}"),
            config.rejoin_interval,
            receiver.clone(),
            move || {
                watchdog.tick(&node);
            },
        )?);

        let node = chord.clone();
        handles.push(spawn_loop(
            format!("chord-replication-{port}"),
            config.replication_interval,
            receiver,
            move || {
                let pushed = node.replicate_storage();
                trace!(pushed, "Replicated storage to successor");
            },
        )?);

        Ok(Maintenance { shutdown, handles })
    }

    /// Stop every thread and wait for the current ticks to finish.
    ///
    /// Must not be called from a maintenance thread.
    pub fn stop(self) {
        drop(self.shutdown);

        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("chord-maintenance").to_string();

            if handle.join().is_err() {
                warn!(thread = %name, "Maintenance thread panicked");
            }
        }
    }
}

fn spawn_loop<F>(
    name: String,
    interval: Duration,
    shutdown: Receiver<()>,
    mut tick: F,
) -> Result<JoinHandle<()>, std::io::Error>
where
    F: FnMut() + Send + 'static,
{
    thread::Builder::new().name(name).spawn(move || loop {
        match shutdown.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => tick(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    })
}
