use crate::{
    addresses::AddressBook,
    notify::Notifier,
};
use color_eyre::eyre::{
    Report,
    Result,
};
use futures::{
    StreamExt,
    TryStreamExt,
    future::BoxFuture,
    stream,
};
use fuels::types::U256;
use tracing::{
    debug,
    error,
    info,
    warn,
};

/// Upper bound on in-flight per-index player reads within one pass.
pub const PLAYER_READ_CONCURRENCY: usize = 8;

/// Read/write surface of the deployed raffle. The contract itself is opaque;
/// this is the whole ABI the client consumes.
#[allow(async_fn_in_trait)]
pub trait RaffleContract {
    async fn entrance_fee(&self) -> Result<U256>;

    async fn player_count(&self) -> Result<u64>;

    async fn recent_winner(&self) -> Result<String>;

    async fn player(&self, index: u64) -> Result<String>;

    /// Broadcasts an entry carrying `amount_wei` as the attached value.
    /// Resolving the returned handle waits for confirmation.
    async fn enter(&self, amount_wei: U256) -> Result<PendingEntry>;
}

/// Broadcast-accepted transaction awaiting confirmation.
pub struct PendingEntry {
    tx_id: String,
    wait: BoxFuture<'static, Result<()>>,
}

impl PendingEntry {
    pub fn new(tx_id: impl Into<String>, wait: BoxFuture<'static, Result<()>>) -> Self {
        Self {
            tx_id: tx_id.into(),
            wait,
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    pub async fn confirmed(self) -> Result<()> {
        self.wait.await
    }
}

/// Typed view record for one entrant row; the UI renders these, it never
/// receives pre-rendered markup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerRow {
    pub index: u64,
    pub address: String,
}

/// On-screen mirror of the contract state. Fully replaced by each successful
/// synchronization pass, never patched incrementally; while a pass is
/// running, `players_loading` is the only field that changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RaffleSnapshot {
    pub entrance_fee_wei: U256,
    pub player_count: u64,
    pub recent_winner: String,
    pub players: Vec<PlayerRow>,
    pub players_loading: bool,
}

/// Keeps a [`RaffleSnapshot`] consistent with on-chain truth and drives the
/// entry-transaction flow. Exclusive ownership serializes passes: two
/// `synchronize` calls can never race to publish.
pub struct Synchronizer<C> {
    contract: C,
    snapshot: RaffleSnapshot,
    submitting: bool,
}

impl<C: RaffleContract> Synchronizer<C> {
    pub fn new(contract: C) -> Self {
        Self {
            contract,
            snapshot: RaffleSnapshot::default(),
            submitting: false,
        }
    }

    pub fn snapshot(&self) -> &RaffleSnapshot {
        &self.snapshot
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }

    pub fn contract_mut(&mut self) -> &mut C {
        &mut self.contract
    }

    /// One full read pass. Fee, count and winner reads run concurrently; the
    /// per-index player loop starts only once the count is known. All
    /// results are applied as one atomic replacement after every read
    /// succeeds. Any failure aborts the pass and retains the previous
    /// snapshot; the caller surfaces the error as a log line only.
    pub async fn synchronize(&mut self) -> Result<()> {
        let (entrance_fee_wei, player_count, recent_winner) = tokio::try_join!(
            self.contract.entrance_fee(),
            self.contract.player_count(),
            self.contract.recent_winner(),
        )?;

        self.snapshot.players_loading = true;
        let players = self.collect_players(player_count).await;
        self.snapshot.players_loading = false;
        let players = players?;

        self.snapshot = RaffleSnapshot {
            entrance_fee_wei,
            player_count,
            recent_winner,
            players,
            players_loading: false,
        };
        debug!(player_count, "raffle state synchronized");
        Ok(())
    }

    /// Bounded fan-out over `[0, count)`; `buffered` collects results in
    /// ascending index order regardless of completion order.
    async fn collect_players(&self, count: u64) -> Result<Vec<PlayerRow>> {
        stream::iter((0..count).map(|index| async move {
            let address = self.contract.player(index).await?;
            debug!(index, %address, "fetched player");
            Ok::<_, Report>(PlayerRow { index, address })
        }))
        .buffered(PLAYER_READ_CONCURRENCY)
        .try_collect()
        .await
    }

    /// Submits an entry carrying `amount_wei`. Refused while a previous
    /// submission is still outstanding. Confirmation emits one success
    /// notification and one fresh pass; broadcast- or confirmation-time
    /// failure emits one error notification carrying the provider message.
    /// Never retried automatically.
    pub async fn submit_entry(
        &mut self,
        amount_wei: U256,
        notifier: &mut Notifier,
    ) -> Result<()> {
        if self.submitting {
            debug!("entry submission already outstanding; ignored");
            return Ok(());
        }
        self.submitting = true;
        let outcome = self.drive_entry(amount_wei).await;
        self.submitting = false;
        match outcome {
            Ok(tx_id) => {
                notifier.success(format!("Transaction success: {tx_id}"));
                if let Err(err) = self.synchronize().await {
                    error!(%err, "synchronization after confirmed entry failed");
                }
            }
            Err(err) => {
                notifier.error(err.to_string());
            }
        }
        Ok(())
    }

    async fn drive_entry(&self, amount_wei: U256) -> Result<String> {
        let pending = self.contract.enter(amount_wei).await?;
        let tx_id = pending.tx_id().to_string();
        info!(%tx_id, "entry broadcast; awaiting confirmation");
        pending.confirmed().await?;
        Ok(tx_id)
    }
}

/// Binds a synchronizer to the raffle deployed for `chain_id`, returning the
/// resolved address alongside it. A network without a deployment yields
/// `None` and `bind` is never invoked, so no contract read can be issued.
pub fn synchronizer_for_network<C, F>(
    book: &AddressBook,
    chain_id: u64,
    bind: F,
) -> Result<Option<(String, Synchronizer<C>)>>
where
    C: RaffleContract,
    F: FnOnce(&str) -> Result<C>,
{
    match book.resolve(chain_id) {
        Some(address) => {
            let contract = bind(address)?;
            Ok(Some((address.to_string(), Synchronizer::new(contract))))
        }
        None => {
            warn!(chain_id, "no raffle deployment configured for this network");
            Ok(None)
        }
    }
}
