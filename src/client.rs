use crate::ui;
use color_eyre::eyre::{
    Result,
    eyre,
};
use fuels::{
    prelude::{
        AssetConfig,
        AssetId,
        CallParameters,
        Contract,
        ContractId,
        Execution,
        LoadConfiguration,
        TxPolicies,
        WalletUnlocked,
        WalletsConfig,
        launch_custom_provider_and_get_wallets,
    },
    types::{
        Bits256,
        U256,
    },
};
use futures::FutureExt;
use raffle_client::{
    addresses::AddressBook,
    notify::{
        Notification,
        Notifier,
    },
    raffle_types,
    session::{
        ConnectionStore,
        SessionState,
        WalletGateway,
        WalletSession,
    },
    sync::{
        PendingEntry,
        RaffleContract,
        RaffleSnapshot,
        Synchronizer,
        synchronizer_for_network,
    },
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    str::FromStr,
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time::{
        self,
        MissedTickBehavior,
    },
};
use tracing::{
    debug,
    error,
    info,
    warn,
};

/// Chain id the locally launched node is registered under.
pub const LOCAL_CHAIN_ID: u64 = 0;

/// Default location of the compiled contract, matching the contract
/// project's release output; `--contract` overrides it.
const RAFFLE_BIN: &str = "raffle/out/release/raffle.bin";
const CALL_GAS_FORWARDED: u64 = 1_000_000;
const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

pub struct RunOptions {
    pub chain_id: Option<u64>,
    pub addresses_path: Option<PathBuf>,
    pub contract_bin: Option<PathBuf>,
    pub session_root: PathBuf,
}

/// Wallet provider backed by the local node's unlocked wallets. `enable` is
/// always granted here; the session machinery on top behaves exactly as it
/// would against a browser wallet that can reject.
pub struct LocalWalletGateway {
    wallets: Vec<WalletUnlocked>,
    active: usize,
}

impl LocalWalletGateway {
    pub fn new(wallets: Vec<WalletUnlocked>) -> Self {
        Self { wallets, active: 0 }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_address(&self) -> String {
        self.wallets[self.active].address().to_string()
    }

    /// Rotates to the next wallet and reports its address, feeding the
    /// account-changed channel the same way an extension would.
    pub fn switch_next(&mut self) -> String {
        self.active = (self.active + 1) % self.wallets.len();
        self.active_address()
    }
}

impl WalletGateway for LocalWalletGateway {
    fn name(&self) -> &str {
        "local-node"
    }

    async fn enable(&mut self) -> Result<String> {
        Ok(self.active_address())
    }

    async fn deactivate(&mut self) -> Result<()> {
        Ok(())
    }
}

/// The deployed raffle seen through one contract instance per wallet, so an
/// account change re-binds the signer without touching the synchronizer.
pub struct FuelRaffle {
    instances: Vec<raffle_types::Raffle<WalletUnlocked>>,
    active: usize,
}

impl FuelRaffle {
    pub fn bound_to(address: &str, wallets: &[WalletUnlocked]) -> Result<Self> {
        let contract_id = ContractId::from_str(address.trim_start_matches("0x"))
            .map_err(|err| eyre!("invalid raffle address {address}: {err:?}"))?;
        let instances = wallets
            .iter()
            .map(|wallet| raffle_types::Raffle::new(contract_id, wallet.clone()))
            .collect();
        Ok(Self {
            instances,
            active: 0,
        })
    }

    pub fn set_active(&mut self, index: usize) {
        if index < self.instances.len() {
            self.active = index;
        }
    }

    fn me(&self) -> &raffle_types::Raffle<WalletUnlocked> {
        &self.instances[self.active]
    }
}

fn hex_b256(value: &Bits256) -> String {
    format!("0x{}", hex::encode(value.0))
}

impl RaffleContract for FuelRaffle {
    async fn entrance_fee(&self) -> Result<U256> {
        let fee = self
            .me()
            .methods()
            .get_entrance_fee()
            .simulate(Execution::StateReadOnly)
            .await?
            .value;
        Ok(U256::from(fee))
    }

    async fn player_count(&self) -> Result<u64> {
        let count = self
            .me()
            .methods()
            .get_number_of_players()
            .simulate(Execution::StateReadOnly)
            .await?
            .value;
        Ok(count)
    }

    async fn recent_winner(&self) -> Result<String> {
        let winner = self
            .me()
            .methods()
            .get_recent_winner()
            .simulate(Execution::StateReadOnly)
            .await?
            .value;
        Ok(hex_b256(&winner))
    }

    async fn player(&self, index: u64) -> Result<String> {
        let player = self
            .me()
            .methods()
            .get_player(index)
            .simulate(Execution::StateReadOnly)
            .await?
            .value;
        Ok(hex_b256(&player))
    }

    async fn enter(&self, amount_wei: U256) -> Result<PendingEntry> {
        if amount_wei > U256::from(u64::MAX) {
            return Err(eyre!(
                "entrance fee {amount_wei} exceeds the transferable asset range"
            ));
        }
        let amount = amount_wei.low_u64();
        let params = CallParameters::new(amount, AssetId::zeroed(), CALL_GAS_FORWARDED);
        let submitted = self
            .me()
            .methods()
            .enter_raffle()
            .call_params(params)?
            .submit()
            .await?;
        let tx_id = submitted.tx_id().to_string();
        let wait = async move {
            submitted.response().await?;
            Ok(())
        }
        .boxed();
        Ok(PendingEntry::new(tx_id, wait))
    }
}

pub struct LocalNode {
    pub wallets: Vec<WalletUnlocked>,
    pub contract_id: Option<ContractId>,
}

/// A contract binary is only deployable when it exists as a regular file.
fn deployable_artifact(path: &Path) -> Option<&Path> {
    path.is_file().then_some(path)
}

/// Launches an in-process node with two funded wallets and, when a compiled
/// artifact is present, deploys the raffle. A missing artifact is not fatal;
/// the client comes up in the no-deployment state instead.
pub async fn init_local(contract_bin: &Path) -> Result<LocalNode> {
    let base_asset = AssetConfig {
        id: AssetId::zeroed(),
        num_coins: 1,
        coin_amount: 1_000_000_000,
    };
    let wallets = launch_custom_provider_and_get_wallets(
        WalletsConfig::new_multiple_assets(2, vec![base_asset]),
        None,
        None,
    )
    .await?;

    let contract_id = match deployable_artifact(contract_bin) {
        Some(bin) => {
            let deployer = wallets
                .first()
                .ok_or_else(|| eyre!("missing deployer wallet"))?;
            let raffle_id = Contract::load_from(bin, LoadConfiguration::default())?
                .deploy(deployer, TxPolicies::default())
                .await?;
            let contract_id: ContractId = raffle_id.into();
            info!(%contract_id, "raffle deployed on local node");
            Some(contract_id)
        }
        None => {
            warn!(
                path = %contract_bin.display(),
                "raffle artifact not found; starting without a deployment"
            );
            None
        }
    };

    Ok(LocalNode {
        wallets,
        contract_id,
    })
}

/// Everything the UI needs for one frame.
pub struct AppSnapshot {
    pub session: SessionState,
    pub chain_id: u64,
    pub raffle_address: Option<String>,
    pub raffle: Option<RaffleSnapshot>,
    pub submitting: bool,
    pub notifications: Vec<Notification>,
}

pub struct AppController {
    pub session: WalletSession<LocalWalletGateway>,
    pub raffle: Option<Synchronizer<FuelRaffle>>,
    pub notifier: Notifier,
    pub chain_id: u64,
    pub raffle_address: Option<String>,
}

impl AppController {
    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            session: self.session.state().clone(),
            chain_id: self.chain_id,
            raffle_address: self.raffle_address.clone(),
            raffle: self.raffle.as_ref().map(|sync| sync.snapshot().clone()),
            submitting: self
                .raffle
                .as_ref()
                .is_some_and(Synchronizer::is_submitting),
            notifications: self.notifier.recent(4),
        }
    }

    pub async fn connect(&mut self) -> Result<()> {
        self.session.connect().await?;
        if self.session.is_enabled() {
            self.refresh().await;
        }
        Ok(())
    }

    /// One synchronization pass; read failures stay a log line, the stale
    /// snapshot remains on screen.
    pub async fn refresh(&mut self) {
        if !self.session.is_enabled() {
            debug!("refresh skipped; wallet session disabled");
            return;
        }
        let Some(sync) = &mut self.raffle else {
            return;
        };
        if let Err(err) = sync.synchronize().await {
            error!(%err, "synchronization pass failed");
        }
    }

    pub async fn enter_raffle(&mut self) -> Result<()> {
        if !self.session.is_enabled() {
            debug!("entry ignored; wallet session disabled");
            return Ok(());
        }
        let Some(sync) = &mut self.raffle else {
            return Ok(());
        };
        let fee = sync.snapshot().entrance_fee_wei;
        sync.submit_entry(fee, &mut self.notifier).await
    }

    pub async fn on_account_changed(&mut self, account: Option<String>) -> Result<()> {
        self.session.handle_account_changed(account).await?;
        let active = self.session.gateway().active_index();
        if let Some(sync) = &mut self.raffle {
            sync.contract_mut().set_active(active);
        }
        Ok(())
    }

    /// Rotates the active local wallet; the caller feeds the returned
    /// address back through the account-changed channel.
    pub fn switch_account(&mut self) -> Option<String> {
        if !self.session.is_enabled() {
            return None;
        }
        Some(self.session.gateway_mut().switch_next())
    }

    /// True when the next refresh will actually run a pass.
    pub fn will_refresh(&self) -> bool {
        self.session.is_enabled() && self.raffle.is_some()
    }

    /// True when an entry request will reach the contract.
    pub fn will_accept_entry(&self) -> bool {
        self.session.is_enabled()
            && self
                .raffle
                .as_ref()
                .is_some_and(|sync| !sync.is_submitting())
    }
}

/// Paints one frame with the in-flight marker applied before an await that
/// blocks the loop, so the busy state is on screen while it runs.
fn draw_in_flight(
    ui_state: &mut ui::UiState,
    controller: &AppController,
    mark: impl FnOnce(&mut AppSnapshot),
) -> Result<()> {
    let mut snap = controller.snapshot();
    mark(&mut snap);
    ui::draw(ui_state, &snap)
}

fn mark_players_loading(snap: &mut AppSnapshot) {
    if let Some(raffle) = snap.raffle.as_mut() {
        raffle.players_loading = true;
    }
}

pub async fn run_app(opts: RunOptions) -> Result<()> {
    let contract_bin = opts
        .contract_bin
        .clone()
        .unwrap_or_else(|| PathBuf::from(RAFFLE_BIN));
    let node = init_local(&contract_bin).await?;

    let mut book = match &opts.addresses_path {
        Some(path) => AddressBook::load(path)?,
        None => AddressBook::new(),
    };
    if let Some(contract_id) = node.contract_id {
        book.register(LOCAL_CHAIN_ID, format!("0x{}", hex::encode(contract_id)));
    }

    let chain_id = opts.chain_id.unwrap_or(LOCAL_CHAIN_ID);
    let (raffle_address, raffle) = match synchronizer_for_network(&book, chain_id, |address| {
        FuelRaffle::bound_to(address, &node.wallets)
    })? {
        Some((address, sync)) => (Some(address), Some(sync)),
        None => (None, None),
    };

    let gateway = LocalWalletGateway::new(node.wallets);
    let store = ConnectionStore::new(opts.session_root);
    let mut controller = AppController {
        session: WalletSession::new(gateway, store),
        raffle,
        notifier: Notifier::new(),
        chain_id,
        raffle_address,
    };

    controller.session.restore_if_requested().await?;
    if controller.session.is_enabled() {
        controller.refresh().await;
    }

    let (account_tx, account_rx) = mpsc::unbounded_channel();
    let input_rx = ui::spawn_input_pump();
    let mut ui_state = ui::UiState::default();
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state, account_tx, account_rx, input_rx).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop(
    controller: &mut AppController,
    ui_state: &mut ui::UiState,
    account_tx: mpsc::UnboundedSender<Option<String>>,
    mut account_rx: mpsc::UnboundedReceiver<Option<String>>,
    mut input_rx: mpsc::UnboundedReceiver<ui::UserEvent>,
) -> Result<()> {
    let mut ticker = time::interval(REFRESH_INTERVAL);
    // A tick that lands while a pass is still running coalesces into the
    // next one instead of piling up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    ui::draw(ui_state, &controller.snapshot())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                if controller.will_refresh() {
                    draw_in_flight(ui_state, controller, mark_players_loading)?;
                }
                controller.refresh().await;
            }
            Some(account) = account_rx.recv() => {
                controller.on_account_changed(account).await?;
                controller.refresh().await;
            }
            Some(ev) = input_rx.recv() => {
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Connect => controller.connect().await?,
                    ui::UserEvent::DisconnectSignal => {
                        let _ = account_tx.send(None);
                    }
                    ui::UserEvent::SwitchAccount => {
                        if let Some(address) = controller.switch_account() {
                            let _ = account_tx.send(Some(address));
                        }
                    }
                    ui::UserEvent::EnterRaffle => {
                        if controller.will_accept_entry() {
                            draw_in_flight(ui_state, controller, |snap| snap.submitting = true)?;
                        }
                        controller.enter_raffle().await?;
                    }
                    ui::UserEvent::Refresh => {
                        if controller.will_refresh() {
                            draw_in_flight(ui_state, controller, mark_players_loading)?;
                        }
                        controller.refresh().await;
                    }
                }
            }
        }
        ui::draw(ui_state, &controller.snapshot())?;
    }
    Ok(())
}
