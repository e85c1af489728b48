use color_eyre::eyre::{
    Result,
    WrapErr,
};
use std::{
    collections::HashMap,
    fs,
    path::Path,
};

/// Per-network table of deployed raffle addresses.
///
/// The table is consulted read-only; `resolve` returns the first configured
/// address for a chain, or `None` when the chain has no deployment. Unknown
/// chains are not an error.
#[derive(Clone, Debug, Default)]
pub struct AddressBook {
    entries: HashMap<u64, Vec<String>>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the `{"<chain id>": ["<address>", ...]}` JSON layout used by
    /// the deployment tooling.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let raw: HashMap<String, Vec<String>> =
            serde_json::from_str(data).wrap_err("Failed to parse address table JSON")?;
        let mut entries = HashMap::with_capacity(raw.len());
        for (chain, addresses) in raw {
            let chain_id: u64 = chain
                .parse()
                .wrap_err_with(|| format!("Invalid chain id key: {chain}"))?;
            entries.insert(chain_id, addresses);
        }
        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).wrap_err_with(|| {
            format!("Failed to read address table: {}", path.display())
        })?;
        Self::from_json_str(&data)
    }

    pub fn register(&mut self, chain_id: u64, address: impl Into<String>) {
        self.entries.entry(chain_id).or_default().push(address.into());
    }

    /// First configured address for the chain, if any. Pure lookup.
    pub fn resolve(&self, chain_id: u64) -> Option<&str> {
        self.entries
            .get(&chain_id)
            .and_then(|addresses| addresses.first())
            .map(String::as_str)
    }
}
