pub mod addresses;

pub mod notify;

pub mod session;

pub mod sync;

pub mod test_helpers;

pub mod units;

pub mod raffle_types {
    use fuels::macros::abigen;

    abigen!(Contract(name = "Raffle", abi = "abi/raffle-abi.json"));
}

/// Shortened address form used by the header, e.g. `0x5FbD…0aa3`.
pub fn short_address(address: &str) -> String {
    const HEAD: usize = 6;
    const TAIL: usize = 4;
    if address.chars().count() <= HEAD + TAIL {
        return address.to_string();
    }
    let head: String = address.chars().take(HEAD).collect();
    let tail_rev: Vec<char> = address.chars().rev().take(TAIL).collect();
    let tail: String = tail_rev.into_iter().rev().collect();
    format!("{head}…{tail}")
}
