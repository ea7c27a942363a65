//! Per-connection statement watchdog
//!
//! One background thread per connection sleeps until the armed deadline and
//! then calls `sqlite3_interrupt` on that connection. Arming hands out a
//! [`Ticket`]; disarming with the same ticket reports whether the interrupt
//! fired for it.
//!
//! The interrupt is issued while the state lock is held, and disarm takes the
//! same lock. Once `disarm` returns, no interrupt meant for that ticket can
//! reach the connection, so a late timer never lands on the next statement.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rusqlite::InterruptHandle;
use tracing::{debug, warn};

/// Identifies one armed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy)]
struct Armed {
    ticket: u64,
    deadline: Instant,
}

#[derive(Debug, Default)]
struct State {
    last_ticket: u64,
    armed: Option<Armed>,
    fired: Option<u64>,
    shutdown: bool,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
    handle: InterruptHandle,
}

pub struct Watchdog {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Spawn the watchdog thread for the connection behind `handle`.
    pub fn spawn(label: &str, handle: InterruptHandle) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            wake: Condvar::new(),
            handle,
        });
        let worker = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name(format!("watchdog-{label}"))
            .spawn(move || run(&worker))?;
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Arm the timer for a statement that is about to start.
    pub fn arm(&self, budget: Duration) -> Ticket {
        let mut state = self.shared.state.lock();
        state.last_ticket += 1;
        let ticket = state.last_ticket;
        state.armed = Some(Armed {
            ticket,
            deadline: Instant::now() + budget,
        });
        state.fired = None;
        self.shared.wake.notify_one();
        Ticket(ticket)
    }

    /// Disarm after the statement finished. Returns `true` if the interrupt
    /// fired for this ticket.
    pub fn disarm(&self, ticket: Ticket) -> bool {
        let mut state = self.shared.state.lock();
        if state.armed.is_some_and(|a| a.ticket == ticket.0) {
            state.armed = None;
        }
        let fired = state.fired == Some(ticket.0);
        if fired {
            state.fired = None;
        }
        fired
    }
}

fn run(shared: &Shared) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            return;
        }
        match state.armed {
            None => shared.wake.wait(&mut state),
            Some(armed) if Instant::now() >= armed.deadline => {
                shared.handle.interrupt();
                debug!(ticket = armed.ticket, "Watchdog interrupted statement");
                state.fired = Some(armed.ticket);
                state.armed = None;
            }
            Some(armed) => {
                let _timed_out = shared.wake.wait_until(&mut state, armed.deadline);
            }
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.wake.notify_one();
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Watchdog thread panicked");
            }
        }
    }
}
