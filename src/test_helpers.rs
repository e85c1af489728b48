use crate::{
    session::WalletGateway,
    sync::{
        PendingEntry,
        RaffleContract,
    },
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use futures::FutureExt;
use fuels::types::U256;
use std::{
    path::PathBuf,
    sync::{
        Arc,
        Mutex,
        atomic::{
            AtomicU64,
            AtomicUsize,
            Ordering,
        },
    },
    time::Duration,
};

/// Unique scratch directory for connection-store tests.
pub fn temp_store_root(tag: &str) -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "raffle-client-{tag}-{}-{seq}",
        std::process::id()
    ))
}

/// Scripted wallet provider: counts enable/deactivate requests and can be
/// told to reject the enable call.
pub struct FakeGateway {
    pub account: String,
    pub fail_enable: bool,
    pub enable_calls: Arc<AtomicUsize>,
    pub deactivate_calls: Arc<AtomicUsize>,
}

impl FakeGateway {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            fail_enable: false,
            enable_calls: Arc::new(AtomicUsize::new(0)),
            deactivate_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn rejecting(account: impl Into<String>) -> Self {
        let mut gateway = Self::new(account);
        gateway.fail_enable = true;
        gateway
    }
}

impl WalletGateway for FakeGateway {
    fn name(&self) -> &str {
        "fake-wallet"
    }

    async fn enable(&mut self) -> Result<String> {
        self.enable_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_enable {
            return Err(eyre!("user rejected the request"));
        }
        Ok(self.account.clone())
    }

    async fn deactivate(&mut self) -> Result<()> {
        self.deactivate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Which read, in the order the synchronizer issued them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadCall {
    EntranceFee,
    PlayerCount,
    RecentWinner,
    Player(u64),
}

/// Scripted raffle contract. Records every issued read, can fail individual
/// reads, stagger player completions so later indices resolve first, and
/// fail the entry at broadcast or confirmation time.
#[derive(Clone)]
pub struct ScriptedRaffle {
    pub fee_wei: U256,
    pub winner: String,
    pub players: Vec<String>,
    pub fail_count_read: bool,
    pub fail_player_at: Option<u64>,
    pub stagger_players: bool,
    pub fail_enter_broadcast: bool,
    pub fail_enter_confirmation: bool,
    pub reads: Arc<Mutex<Vec<ReadCall>>>,
    pub player_completions: Arc<Mutex<Vec<u64>>>,
    pub entered_amounts: Arc<Mutex<Vec<U256>>>,
}

impl ScriptedRaffle {
    pub fn new(fee_wei: U256, winner: impl Into<String>, players: Vec<String>) -> Self {
        Self {
            fee_wei,
            winner: winner.into(),
            players,
            fail_count_read: false,
            fail_player_at: None,
            stagger_players: false,
            fail_enter_broadcast: false,
            fail_enter_confirmation: false,
            reads: Arc::new(Mutex::new(Vec::new())),
            player_completions: Arc::new(Mutex::new(Vec::new())),
            entered_amounts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, call: ReadCall) {
        self.reads.lock().unwrap().push(call);
    }

    pub fn read_count(&self) -> usize {
        self.reads.lock().unwrap().len()
    }

    pub fn clear_reads(&self) {
        self.reads.lock().unwrap().clear();
        self.player_completions.lock().unwrap().clear();
    }

    pub fn full_pass_count(&self) -> usize {
        self.reads
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == ReadCall::EntranceFee)
            .count()
    }
}

impl RaffleContract for ScriptedRaffle {
    async fn entrance_fee(&self) -> Result<U256> {
        self.record(ReadCall::EntranceFee);
        Ok(self.fee_wei)
    }

    async fn player_count(&self) -> Result<u64> {
        self.record(ReadCall::PlayerCount);
        if self.fail_count_read {
            return Err(eyre!("player count read failed"));
        }
        Ok(self.players.len() as u64)
    }

    async fn recent_winner(&self) -> Result<String> {
        self.record(ReadCall::RecentWinner);
        Ok(self.winner.clone())
    }

    async fn player(&self, index: u64) -> Result<String> {
        self.record(ReadCall::Player(index));
        if self.stagger_players {
            // Later indices finish first; publish order must still ascend.
            let remaining = self.players.len() as u64 - index;
            tokio::time::sleep(Duration::from_millis(10 * remaining)).await;
        }
        if self.fail_player_at == Some(index) {
            return Err(eyre!("player read {index} failed"));
        }
        self.player_completions.lock().unwrap().push(index);
        self.players
            .get(index as usize)
            .cloned()
            .ok_or_else(|| eyre!("no player at index {index}"))
    }

    async fn enter(&self, amount_wei: U256) -> Result<PendingEntry> {
        if self.fail_enter_broadcast {
            return Err(eyre!("insufficient funds for entrance fee"));
        }
        self.entered_amounts.lock().unwrap().push(amount_wei);
        let fail_confirmation = self.fail_enter_confirmation;
        let wait = async move {
            if fail_confirmation {
                Err(eyre!("transaction reverted: Raffle__NotOpen"))
            } else {
                Ok(())
            }
        }
        .boxed();
        Ok(PendingEntry::new("0xfadedtx", wait))
    }
}
