//! Post-send cooldown countdown.
//!
//! A one-second ticker publishes the seconds left on a watch channel.
//! Starting a new countdown cancels the running one, and so does dropping it.

use std::{sync::Arc, time::Duration};

use tokio::{sync::watch, task::JoinHandle, time::interval};

#[derive(Debug)]
pub struct Countdown {
    sender: Arc<watch::Sender<u64>>,
    ticker: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Countdown { sender: Arc::new(sender), ticker: None }
    }

    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, secs: u64) {
        self.cancel();
        self.sender.send_replace(secs);
        if secs == 0 {
            return;
        }

        let sender = Arc::clone(&self.sender);
        self.ticker = Some(tokio::spawn(async move {
            let mut ticks = interval(Duration::from_secs(1));
            ticks.tick().await;
            for left in (0..secs).rev() {
                ticks.tick().await;
                sender.send_replace(left);
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.sender.send_replace(0);
    }

    pub fn remaining(&self) -> u64 {
        *self.sender.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.remaining() > 0
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Countdown::new()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
