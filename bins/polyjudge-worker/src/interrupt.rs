// External cancellation of a judging run.
//
// The handle side is held by whoever owns the run (the binary's ctrl-c
// handler, a test). Every child process races the `Interrupt` side; once
// it fires no new work starts and running children are killed.

use tokio::sync::watch;

/// Fires an `Interrupt`; dropping it without firing leaves the run alone
#[derive(Debug)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (InterruptHandle, Interrupt) {
    let (tx, rx) = watch::channel(false);
    (InterruptHandle { tx }, Interrupt { rx })
}

impl Interrupt {
    /// An interrupt nobody can fire
    pub fn never() -> Self {
        channel().1
    }

    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once interrupted; pends forever when the handle is gone
    pub async fn fired(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|set| *set).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fired_after_interrupt() {
        let (handle, interrupt) = channel();
        assert!(!interrupt.is_set());
        let waiter = tokio::spawn({
            let interrupt = interrupt.clone();
            async move { interrupt.fired().await }
        });
        handle.interrupt();
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(interrupt.is_set());
    }

    #[tokio::test]
    async fn test_never_does_not_fire() {
        let interrupt = Interrupt::never();
        let fired = tokio::time::timeout(Duration::from_millis(50), interrupt.fired()).await;
        assert!(fired.is_err());
        assert!(!interrupt.is_set());
    }
}
