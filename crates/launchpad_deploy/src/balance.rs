use std::sync::Arc;
use std::time::Duration;

use launchpad_chain::{BalanceSource, NativeToken, derive_address, format_units, is_private_key};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Resolved wallet for the current `(private key, RPC URL)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalletProbe {
    pub address: Option<String>,
    /// Smallest unit of the native token.
    pub balance_raw: Option<u128>,
    pub balance_formatted: Option<String>,
    pub symbol: Option<&'static str>,
    pub error: Option<String>,
}

struct OracleState {
    /// Bumped on every new input and on cancel. A probe may only write back
    /// if the generation it was started with is still current.
    generation: u64,
    pending: Option<JoinHandle<()>>,
    input: Option<(String, String)>,
    probe: Option<WalletProbe>,
    loading: bool,
    native_token: NativeToken,
}

struct OracleInner {
    source: Arc<dyn BalanceSource>,
    debounce: Duration,
    state: Mutex<OracleState>,
}

/// Debounced wallet address and balance lookups.
///
/// Each `update` supersedes the previous one: the pending lookup is aborted and
/// any result that still arrives for an older input is discarded. Failures end
/// up in [`WalletProbe::error`] and never propagate.
pub struct BalanceOracle {
    inner: Arc<OracleInner>,
}

impl BalanceOracle {
    pub fn new(source: Arc<dyn BalanceSource>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(OracleInner {
                source,
                debounce,
                state: Mutex::new(OracleState {
                    generation: 0,
                    pending: None,
                    input: None,
                    probe: None,
                    loading: false,
                    native_token: NativeToken::Eth,
                }),
            }),
        }
    }

    /// Feed the current wizard input. Must be called from within a Tokio
    /// runtime for the lookup to be scheduled.
    pub fn update(&self, private_key: &str, rpc_url: Option<&str>, native_token: NativeToken) {
        let private_key = private_key.trim();
        let rpc_url = rpc_url.map(str::trim).filter(|u| !u.is_empty());

        let mut state = self.inner.state.lock();
        state.native_token = native_token;

        let Some(rpc_url) = rpc_url.filter(|_| is_private_key(private_key)) else {
            Self::reset_locked(&mut state);
            return;
        };

        let input = (private_key.to_string(), rpc_url.to_string());
        if state.input.as_ref() == Some(&input) && (state.pending.is_some() || state.probe.is_some()) {
            return;
        }

        if let Some(handle) = state.pending.take() {
            handle.abort();
        }
        state.generation += 1;
        state.input = Some(input.clone());
        state.probe = None;

        let Ok(runtime) = Handle::try_current() else {
            warn!("wallet probe requested outside of a Tokio runtime");
            state.loading = false;
            state.probe = Some(WalletProbe {
                error: Some("Balance lookup is unavailable".into()),
                ..WalletProbe::default()
            });
            return;
        };

        state.loading = true;
        let generation = state.generation;
        let inner = Arc::clone(&self.inner);
        debug!(generation, "scheduling wallet probe");
        state.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            let (key, url) = input;
            let probe = run_probe(inner.source.as_ref(), &key, &url, native_token).await;

            let mut state = inner.state.lock();
            if state.generation != generation {
                debug!(generation, current = state.generation, "discarding stale wallet probe");
                return;
            }
            state.probe = Some(probe);
            state.loading = false;
            state.pending = None;
        }));
    }

    /// Abort any pending lookup. The last applied probe stays visible.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        if let Some(handle) = state.pending.take() {
            handle.abort();
        }
        state.generation += 1;
        state.input = None;
        state.loading = false;
    }

    /// Abort any pending lookup and forget the last probe.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        Self::reset_locked(&mut state);
    }

    fn reset_locked(state: &mut OracleState) {
        if let Some(handle) = state.pending.take() {
            handle.abort();
        }
        state.generation += 1;
        state.input = None;
        state.probe = None;
        state.loading = false;
    }

    pub fn probe(&self) -> Option<WalletProbe> {
        self.inner.state.lock().probe.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().loading
    }

    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    /// True when a resolved balance is below the recommended minimum for the
    /// active network's native token. Advisory only.
    pub fn insufficient_balance(&self) -> bool {
        let state = self.inner.state.lock();
        let minimum = state.native_token.min_recommended_balance();
        state
            .probe
            .as_ref()
            .and_then(|p| p.balance_raw)
            .is_some_and(|balance| balance < minimum)
    }
}

impl Drop for BalanceOracle {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_probe(
    source: &dyn BalanceSource,
    private_key: &str,
    rpc_url: &str,
    native_token: NativeToken,
) -> WalletProbe {
    let address = match derive_address(private_key) {
        Ok(address) => address,
        Err(e) => {
            warn!(error = %e, "wallet probe: could not derive address");
            return WalletProbe {
                error: Some(e.to_string()),
                ..WalletProbe::default()
            };
        }
    };

    match source.balance_of(rpc_url, &address).await {
        Ok(raw) => WalletProbe {
            address: Some(address),
            balance_raw: Some(raw),
            balance_formatted: Some(format_units(raw, native_token.decimals())),
            symbol: Some(native_token.symbol()),
            error: None,
        },
        Err(e) => {
            warn!(error = %e, %address, "wallet probe: balance lookup failed");
            WalletProbe {
                address: Some(address),
                error: Some(e.to_string()),
                ..WalletProbe::default()
            }
        }
    }
}
