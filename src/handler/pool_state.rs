use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use chrono::Utc;
use futures::join;
use tokio::{
    sync::{watch, Notify},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, warn};

use crate::{
    bindings::CurrencyBindings,
    configuration::{AppState, State},
    error::Error,
    model::{Loadable, PerCurrency, PoolRecord, PoolSnapshot, PriceRecord, Ticker},
    provider::{Invoker, LoanManagerClient},
};

/// Roughly one ledger.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(6);

pub async fn fetch_pools<I: Invoker>(bindings: &CurrencyBindings<I>) -> PoolRecord {
    let fetch = |ticker: Ticker| async move {
        let result = bindings.get(ticker).client.get_pool_state().await;
        if let Err(err) = &result {
            error!("Failed to fetch {} pool state: {}", ticker, err);
        }
        Loadable::from(result)
    };

    let (xlm, usdc, eurc) = join!(
        fetch(Ticker::Xlm),
        fetch(Ticker::Usdc),
        fetch(Ticker::Eurc)
    );

    PerCurrency { xlm, usdc, eurc }
}

pub async fn fetch_prices<I: Invoker>(manager: &LoanManagerClient<I>) -> PriceRecord {
    let fetch = |ticker: Ticker| async move {
        let result = manager.get_price(ticker).await;
        if let Err(err) = &result {
            error!("Failed to fetch {} price: {}", ticker, err);
        }
        Loadable::from(result)
    };

    let (xlm, usdc, eurc) = join!(
        fetch(Ticker::Xlm),
        fetch(Ticker::Usdc),
        fetch(Ticker::Eurc)
    );

    PerCurrency { xlm, usdc, eurc }
}

pub async fn fetch_snapshot<I: Invoker>(
    bindings: &CurrencyBindings<I>,
    manager: &LoanManagerClient<I>,
) -> PoolSnapshot {
    let (pools, prices) = join!(fetch_pools(bindings), fetch_prices(manager));

    PoolSnapshot {
        pools,
        prices,
        fetched_at: Some(Utc::now()),
    }
}

/// Latest pool snapshot. `start` keeps it fresh in the background, which
/// only the server does. One-shot commands call `refetch` instead.
#[derive(Debug)]
pub struct PoolWatcher<I> {
    bindings: Arc<CurrencyBindings<I>>,
    manager: Arc<LoanManagerClient<I>>,
    period: Duration,
    sender: Arc<watch::Sender<PoolSnapshot>>,
    notify: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<I: Invoker + 'static> PoolWatcher<I> {
    pub fn new(
        bindings: Arc<CurrencyBindings<I>>,
        manager: Arc<LoanManagerClient<I>>,
        period: Duration,
    ) -> Self {
        let (sender, _) = watch::channel(PoolSnapshot::loading());

        PoolWatcher {
            bindings,
            manager,
            period,
            sender: Arc::new(sender),
            notify: Arc::new(Notify::new()),
            handle: Mutex::new(None),
        }
    }

    /// Fetches right away and then once per period. Calling it again while
    /// the task runs does nothing.
    pub fn start(&self) {
        let mut handle = lock(&self.handle);
        if handle.is_some() {
            return;
        }

        let bindings = self.bindings.clone();
        let manager = self.manager.clone();
        let sender = self.sender.clone();
        let refetched = self.notify.clone();
        let period = self.period;

        *handle = Some(tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let snapshot = fetch_snapshot(&bindings, &manager).await;
                        sender.send_replace(snapshot);
                    },
                    _ = refetched.notified() => ticks.reset(),
                }
            }
        }));
    }

    pub fn is_running(&self) -> bool {
        lock(&self.handle).is_some()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PoolSnapshot> {
        self.sender.subscribe()
    }

    /// Fetches now, publishes the result and restarts the polling period.
    pub async fn refetch(&self) -> PoolSnapshot {
        let snapshot = fetch_snapshot(&self.bindings, &self.manager).await;
        self.sender.send_replace(snapshot.clone());

        if self.is_running() {
            self.notify.notify_one();
        }

        snapshot
    }
}

impl<I> Drop for PoolWatcher<I> {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.handle).take() {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Logs each snapshot the watcher publishes for as long as the server runs.
pub async fn pool_report_task(app_state: AppState<State>) -> Result<(), Error> {
    report_snapshots(app_state.pools.subscribe()).await
}

pub async fn report_snapshots(
    mut receiver: watch::Receiver<PoolSnapshot>,
) -> Result<(), Error> {
    while receiver.changed().await.is_ok() {
        let snapshot = receiver.borrow_and_update().clone();
        let failed = failed_tickers(&snapshot);

        if failed.is_empty() {
            debug!("Pools refreshed at {:?}", snapshot.fetched_at);
        } else {
            warn!("Pool data unavailable for {}", failed.join(", "));
        }
    }

    Ok(())
}

fn failed_tickers(snapshot: &PoolSnapshot) -> Vec<&'static str> {
    Ticker::ALL
        .into_iter()
        .filter(|ticker| {
            matches!(snapshot.pools.get(*ticker), Loadable::Error(_))
                || matches!(snapshot.prices.get(*ticker), Loadable::Error(_))
        })
        .map(|ticker| ticker.as_str())
        .collect()
}
