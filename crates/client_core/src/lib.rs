use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
};

use shared::{
    domain::{Activity, Address, ConnectionState, CounterValue, Status, TxStatus},
    error::{ApiError, SessionError},
    protocol::{SessionEvent, SessionView},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use wallet_integration::{
    ChainReader, CounterContract, TransactionSigner, WalletError, WalletProvider,
};

pub mod config;

pub use config::{ReadAccess, SessionConfig};
pub use wallet_integration::TxReceipt;

/// Destination for the copy-address action.
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> anyhow::Result<()>;
}

fn session_error_from_wallet(err: WalletError) -> SessionError {
    match err {
        WalletError::UserRejected => SessionError::UserRejected,
        WalletError::Unavailable(_) => SessionError::NoWallet,
        other => SessionError::Wallet(other.to_string()),
    }
}

struct SessionState {
    connection: ConnectionState,
    signer: Option<Arc<dyn TransactionSigner>>,
    reader: Option<Arc<dyn ChainReader>>,
    counter: CounterValue,
    status: Status,
    /// Bumped on every status write so a late reset cannot clobber a newer status.
    status_generation: u64,
    reset_task: Option<JoinHandle<()>>,
    /// Bumped on disconnect; a `connect` that started in an older epoch is discarded.
    epoch: u64,
}

/// Clears the write-in-flight flag when an `increment` finishes or is dropped.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Wallet session and counter transaction controller.
///
/// Owns the connection state, the cached signer, the last fetched counter
/// value and the transient status line. All chain access goes through the
/// injected [`WalletProvider`].
pub struct CounterSession {
    config: SessionConfig,
    contract: CounterContract,
    wallet: Option<Arc<dyn WalletProvider>>,
    inner: Mutex<SessionState>,
    write_in_flight: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
    weak_self: Weak<CounterSession>,
}

impl CounterSession {
    /// Session with no wallet provider present; `connect` reports `NoWallet`.
    pub fn new(config: SessionConfig) -> Arc<Self> {
        Self::new_with_wallet(config, None)
    }

    pub fn new_with_wallet(
        config: SessionConfig,
        wallet: Option<Arc<dyn WalletProvider>>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let contract = CounterContract::new(config.contract_address);
        let reader = Self::passive_reader(&config, wallet.as_ref());
        Arc::new_cyclic(|weak_self| Self {
            config,
            contract,
            wallet,
            inner: Mutex::new(SessionState {
                connection: ConnectionState::Disconnected,
                signer: None,
                reader,
                counter: CounterValue::zero(),
                status: Status::Idle,
                status_generation: 0,
                reset_task: None,
                epoch: 0,
            }),
            write_in_flight: AtomicBool::new(false),
            events,
            weak_self: weak_self.clone(),
        })
    }

    fn passive_reader(
        config: &SessionConfig,
        wallet: Option<&Arc<dyn WalletProvider>>,
    ) -> Option<Arc<dyn ChainReader>> {
        match config.read_access {
            ReadAccess::Passive => wallet.map(|wallet| wallet.reader()),
            ReadAccess::Wallet => None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.inner.lock().await.connection
    }

    pub async fn address(&self) -> Option<Address> {
        self.inner.lock().await.connection.address()
    }

    pub async fn counter(&self) -> CounterValue {
        self.inner.lock().await.counter
    }

    pub async fn status(&self) -> Status {
        self.inner.lock().await.status.clone()
    }

    /// Lifecycle of the `increment` write. Stays `Pending` while a transaction
    /// is in flight even if another action has since replaced the status line.
    pub async fn tx_status(&self) -> TxStatus {
        let state = self.inner.lock().await;
        if self.write_in_flight.load(Ordering::Acquire) {
            return TxStatus::Pending;
        }
        TxStatus::from(&state.status)
    }

    pub async fn can_read(&self) -> bool {
        self.inner.lock().await.reader.is_some()
    }

    pub async fn can_write(&self) -> bool {
        let state = self.inner.lock().await;
        state.connection.is_connected() && state.signer.is_some()
    }

    pub async fn view(&self) -> SessionView {
        let state = self.inner.lock().await;
        SessionView {
            connection: state.connection,
            counter: state.counter,
            status: state.status.clone(),
            can_read: state.reader.is_some(),
            can_write: state.connection.is_connected() && state.signer.is_some(),
        }
    }

    /// Requests account access and caches a signer.
    pub async fn connect(&self) -> Result<Address, SessionError> {
        let Some(wallet) = self.wallet.clone() else {
            return Err(self.report(Activity::Connect, SessionError::NoWallet).await);
        };

        let epoch = {
            let mut state = self.inner.lock().await;
            match state.connection {
                ConnectionState::Connected(address) => return Ok(address),
                ConnectionState::Connecting => {
                    return Err(self.reject_overlap(Activity::Connect));
                }
                ConnectionState::Disconnected => {}
            }
            self.set_connection(&mut state, ConnectionState::Connecting);
            self.apply_status(
                &mut state,
                Status::Pending {
                    activity: Activity::Connect,
                },
            );
            state.epoch
        };

        let authorized = async {
            let accounts = wallet.request_accounts().await?;
            debug!(accounts = accounts.len(), "session: accounts granted");
            let signer = wallet.signer().await?;
            let address = signer.address().await?;
            Ok::<_, WalletError>((signer, address))
        }
        .await;

        let mut state = self.inner.lock().await;
        if state.epoch != epoch {
            info!("session: connect finished after disconnect; discarding");
            return Err(SessionError::NotConnected);
        }

        match authorized {
            Ok((signer, address)) => {
                state.signer = Some(signer);
                if state.reader.is_none() {
                    state.reader = Some(wallet.reader());
                }
                self.set_connection(&mut state, ConnectionState::Connected(address));
                self.apply_status(
                    &mut state,
                    Status::Succeeded {
                        activity: Activity::Connect,
                    },
                );
                info!(%address, "session: wallet connected");
                Ok(address)
            }
            Err(err) => {
                self.set_connection(&mut state, ConnectionState::Disconnected);
                let err = session_error_from_wallet(err);
                self.fail_locked(&mut state, Activity::Connect, &err);
                Err(err)
            }
        }
    }

    /// Local logout. Wallet-side permissions are left untouched.
    pub async fn disconnect(&self) {
        let mut state = self.inner.lock().await;
        state.epoch += 1;
        state.signer = None;
        state.reader = Self::passive_reader(&self.config, self.wallet.as_ref());
        self.set_connection(&mut state, ConnectionState::Disconnected);
        self.apply_status(&mut state, Status::Idle);
        info!("session: disconnected");
    }

    /// Reads `number()` and stores it. The previous value survives a failure.
    pub async fn get_number(&self) -> Result<CounterValue, SessionError> {
        let reader = self.inner.lock().await.reader.clone();
        let Some(reader) = reader else {
            return Err(self
                .report(Activity::FetchCounter, SessionError::NotReadable)
                .await);
        };

        self.set_status(Status::Pending {
            activity: Activity::FetchCounter,
        })
        .await;

        let value = self.fetch_counter(reader.as_ref()).await?;
        self.set_status(Status::Succeeded {
            activity: Activity::FetchCounter,
        })
        .await;
        Ok(value)
    }

    async fn fetch_counter(&self, reader: &dyn ChainReader) -> Result<CounterValue, SessionError> {
        match self.contract.number(reader).await {
            Ok(value) => {
                let mut state = self.inner.lock().await;
                state.counter = value;
                let _ = self.events.send(SessionEvent::CounterUpdated(value));
                debug!(%value, "session: counter refreshed");
                Ok(value)
            }
            Err(err) => Err(self
                .report(Activity::FetchCounter, SessionError::Fetch(err.to_string()))
                .await),
        }
    }

    /// Submits `increment()`, waits for confirmation, then refreshes the
    /// counter once. A second call while one is in flight is rejected.
    pub async fn increment(&self) -> Result<TxReceipt, SessionError> {
        let (signer, reader, epoch) = {
            let state = self.inner.lock().await;
            let signer = if state.connection.is_connected() {
                state.signer.clone()
            } else {
                None
            };
            (signer, state.reader.clone(), state.epoch)
        };
        let Some(signer) = signer else {
            return Err(self
                .report(Activity::Increment, SessionError::NotConnected)
                .await);
        };
        let Some(reader) = reader else {
            return Err(self
                .report(Activity::Increment, SessionError::NotReadable)
                .await);
        };

        if self.write_in_flight.swap(true, Ordering::AcqRel) {
            return Err(self.reject_overlap(Activity::Increment));
        }
        let _in_flight = InFlightGuard(&self.write_in_flight);

        self.set_status(Status::Pending {
            activity: Activity::Increment,
        })
        .await;

        let tx_hash = match self.contract.increment(signer.as_ref()).await {
            Ok(tx_hash) => tx_hash,
            Err(err) => {
                return Err(self
                    .report(Activity::Increment, session_tx_error(err))
                    .await)
            }
        };
        info!(%tx_hash, "session: increment submitted");
        let _ = self
            .events
            .send(SessionEvent::TransactionSubmitted { tx_hash });

        let receipt = match reader
            .wait_for_transaction(tx_hash, self.config.confirmations)
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                return Err(self
                    .report(Activity::Increment, session_tx_error(err))
                    .await)
            }
        };
        info!(
            %tx_hash,
            block = receipt.block_number,
            confirmations = self.config.confirmations,
            "session: increment confirmed"
        );
        let _ = self.events.send(SessionEvent::TransactionConfirmed {
            tx_hash,
            block_number: receipt.block_number,
        });
        if self.inner.lock().await.epoch != epoch {
            info!(%tx_hash, "session: increment confirmed after disconnect; skipping refresh");
            return Ok(receipt);
        }
        self.set_status(Status::Succeeded {
            activity: Activity::Increment,
        })
        .await;

        // A failed refresh is reported on its own; the transaction still stands.
        let _ = self.fetch_counter(reader.as_ref()).await;
        Ok(receipt)
    }

    pub async fn copy_address(&self, clipboard: &dyn Clipboard) -> Result<Address, SessionError> {
        let address = self.inner.lock().await.connection.address();
        let Some(address) = address else {
            return Err(self
                .report(Activity::CopyAddress, SessionError::NotConnected)
                .await);
        };

        if let Err(err) = clipboard.set_text(&address.to_string()) {
            return Err(self
                .report(Activity::CopyAddress, SessionError::Clipboard(err.to_string()))
                .await);
        }

        self.set_status(Status::Succeeded {
            activity: Activity::CopyAddress,
        })
        .await;
        Ok(address)
    }

    fn set_connection(&self, state: &mut SessionState, connection: ConnectionState) {
        state.connection = connection;
        let _ = self.events.send(SessionEvent::ConnectionChanged(connection));
    }

    async fn set_status(&self, status: Status) {
        let mut state = self.inner.lock().await;
        self.apply_status(&mut state, status);
    }

    fn apply_status(&self, state: &mut SessionState, status: Status) {
        state.status_generation += 1;
        if let Some(task) = state.reset_task.take() {
            task.abort();
        }
        if status.is_terminal() {
            if let Some(delay) = self.config.status_reset {
                state.reset_task = Some(self.schedule_reset(delay, state.status_generation));
            }
        }
        state.status = status.clone();
        let _ = self.events.send(SessionEvent::StatusChanged(status));
    }

    fn schedule_reset(&self, delay: std::time::Duration, generation: u64) -> JoinHandle<()> {
        let weak_self = self.weak_self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(session) = weak_self.upgrade() else {
                return;
            };
            let mut state = session.inner.lock().await;
            if state.status_generation != generation {
                return;
            }
            // This task's own handle; dropping it only detaches.
            state.reset_task = None;
            session.apply_status(&mut state, Status::Idle);
        })
    }

    async fn report(&self, activity: Activity, err: SessionError) -> SessionError {
        let mut state = self.inner.lock().await;
        self.fail_locked(&mut state, activity, &err);
        err
    }

    fn fail_locked(&self, state: &mut SessionState, activity: Activity, err: &SessionError) {
        warn!(?activity, code = ?err.code(), error = %err, "session: operation failed");
        self.apply_status(
            state,
            Status::Failed {
                activity,
                reason: err.to_string(),
            },
        );
        let _ = self.events.send(SessionEvent::Error(ApiError::from(err)));
    }

    /// Overlapping calls leave the in-flight status on screen.
    fn reject_overlap(&self, activity: Activity) -> SessionError {
        let err = SessionError::OperationInFlight;
        warn!(?activity, "session: rejected overlapping request");
        let _ = self.events.send(SessionEvent::Error(ApiError::from(&err)));
        err
    }
}

fn session_tx_error(err: WalletError) -> SessionError {
    match err {
        WalletError::UserRejected => SessionError::UserRejected,
        other => SessionError::Tx(other.to_string()),
    }
}

impl Drop for CounterSession {
    fn drop(&mut self) {
        if let Some(task) = self.inner.get_mut().reset_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
