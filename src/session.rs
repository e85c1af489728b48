use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};
use tracing::{
    debug,
    info,
    warn,
};

pub const SESSION_ROOT: &str = ".session";
const CONNECTION_FILE: &str = "connection.json";

/// The wallet provider seam. Passed into the session explicitly rather than
/// reached through process-wide state, so tests can substitute a fake.
#[allow(async_fn_in_trait)]
pub trait WalletGateway {
    /// Marker value written to the connection store on successful connect.
    fn name(&self) -> &str;

    /// Requests wallet access; resolves to the active account address.
    async fn enable(&mut self) -> Result<String>;

    async fn deactivate(&mut self) -> Result<()>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected(String),
}

/// Mediates between the stored connection preference and the live gateway
/// connection state, keeping both in agreement.
pub struct WalletSession<G> {
    gateway: G,
    store: ConnectionStore,
    state: SessionState,
}

impl<G: WalletGateway> WalletSession<G> {
    pub fn new(gateway: G, store: ConnectionStore) -> Self {
        Self {
            gateway,
            store,
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    /// Present only while connected.
    pub fn address(&self) -> Option<&str> {
        match &self.state {
            SessionState::Connected(address) => Some(address),
            _ => None,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Reconnects at startup when a previous session left the marker behind.
    /// Idempotent: short-circuits unless currently disconnected, so it is
    /// safe to invoke on every pass through the loop.
    pub async fn restore_if_requested(&mut self) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Ok(());
        }
        if self.store.marker()?.is_none() {
            return Ok(());
        }
        debug!("connection marker present; restoring session");
        self.connect().await
    }

    /// Issues a wallet-enable request and persists the marker on success.
    /// A no-op while a connect is already in flight or the session is
    /// enabled, so overlapping enable requests are never issued. Provider
    /// rejection is logged and reverts to `Disconnected`.
    pub async fn connect(&mut self) -> Result<()> {
        match self.state {
            SessionState::Connecting | SessionState::Connected(_) => return Ok(()),
            SessionState::Disconnected => {}
        }
        self.state = SessionState::Connecting;
        match self.gateway.enable().await {
            Ok(address) => {
                if let Err(err) = self.store.set(self.gateway.name()) {
                    warn!(%err, "failed to persist connection marker");
                }
                info!(%address, "wallet enabled");
                self.state = SessionState::Connected(address);
            }
            Err(err) => {
                warn!(%err, "wallet enable rejected");
                self.state = SessionState::Disconnected;
            }
        }
        Ok(())
    }

    /// Consumes one inbound account-changed message from the provider.
    ///
    /// A null account clears the marker and deactivates, regardless of the
    /// prior state. A new address while connected swaps the identity and
    /// leaves the marker untouched. A repeat of the current address is a
    /// no-op and does not trigger a refresh.
    pub async fn handle_account_changed(&mut self, account: Option<String>) -> Result<()> {
        match account {
            None => {
                if let Err(err) = self.store.clear() {
                    warn!(%err, "failed to clear connection marker");
                }
                if let Err(err) = self.gateway.deactivate().await {
                    warn!(%err, "wallet deactivate failed");
                }
                self.state = SessionState::Disconnected;
                info!("null account reported; session disconnected");
            }
            Some(address) => match &self.state {
                SessionState::Connected(current) if *current == address => {
                    debug!(%address, "repeat account notification ignored");
                }
                SessionState::Connected(_) => {
                    info!(%address, "account changed; session stays enabled");
                    self.state = SessionState::Connected(address);
                }
                _ => {
                    debug!(%address, "account change while not connected ignored");
                }
            },
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ConnectionRecord {
    #[serde(default)]
    connected: Option<String>,
    #[serde(default)]
    connected_at: Option<String>,
}

/// File-backed home of the `"connected"` marker. Survives restarts; written
/// on successful connect, removed when the provider reports a null account.
#[derive(Debug)]
pub struct ConnectionStore {
    path: PathBuf,
}

impl ConnectionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            path: root.into().join(CONNECTION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn marker(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(self.read()?.connected)
    }

    pub fn set(&self, marker: &str) -> Result<()> {
        self.write(&ConnectionRecord {
            connected: Some(marker.to_string()),
            connected_at: Some(Utc::now().to_rfc3339()),
        })
    }

    pub fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.write(&ConnectionRecord::default())
    }

    fn read(&self) -> Result<ConnectionRecord> {
        let data = fs::read(&self.path).wrap_err_with(|| {
            format!("Failed to read connection record: {}", self.path.display())
        })?;
        if data.is_empty() {
            return Ok(ConnectionRecord::default());
        }
        serde_json::from_slice(&data).wrap_err("Failed to parse connection record JSON")
    }

    fn write(&self, record: &ConnectionRecord) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).wrap_err_with(|| {
                format!("Failed to create session directory: {}", dir.display())
            })?;
        }
        let json = serde_json::to_vec_pretty(record)
            .wrap_err("Failed to serialize connection record")?;
        fs::write(&self.path, json).wrap_err_with(|| {
            format!("Failed to write connection record: {}", self.path.display())
        })
    }
}
