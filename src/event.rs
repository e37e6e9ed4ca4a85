use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use futures::StreamExt;
use tokio::sync::{mpsc, watch};

use crate::system::snapshot::Snapshot;

#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Tick,
    /// A collection cycle finished; `seq` is the number it was started with.
    Collected { seq: u64, snapshot: Box<Snapshot> },
    FlashExpired(u64),
}

pub struct EventHandler {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    cadence: watch::Sender<Duration>,
    _input: tokio::task::JoinHandle<()>,
    _ticker: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        let (cadence, cadence_rx) = watch::channel(tick_rate);

        let input = tokio::spawn(read_input(tx.clone()));
        let ticker = tokio::spawn(tick(tx.clone(), cadence_rx));

        Self {
            tx,
            rx,
            cadence,
            _input: input,
            _ticker: ticker,
        }
    }

    /// Handle for tasks that report back into the loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// The new cadence applies from the next tick on.
    pub fn set_tick_rate(&self, tick_rate: Duration) {
        self.cadence.send_replace(tick_rate);
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

async fn read_input(tx: mpsc::UnboundedSender<Event>) {
    let mut reader = event::EventStream::new();
    while let Some(Ok(evt)) = reader.next().await {
        let mapped = match evt {
            CrosstermEvent::Key(key) => Some(Event::Key(key)),
            CrosstermEvent::Resize(_, _) => Some(Event::Resize),
            _ => None,
        };
        if let Some(e) = mapped
            && tx.send(e).is_err()
        {
            break;
        }
    }
}

// The cadence is re-read before every sleep, and a change wakes the sleep
// early so the new interval counts from the moment it was set.
async fn tick(tx: mpsc::UnboundedSender<Event>, mut cadence: watch::Receiver<Duration>) {
    loop {
        let period = *cadence.borrow_and_update();
        tokio::select! {
            _ = tokio::time::sleep(period) => {
                if tx.send(Event::Tick).is_err() {
                    break;
                }
            }
            changed = cadence.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
