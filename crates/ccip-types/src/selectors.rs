//! Native chain id to CCIP chain selector mapping.

/// (chain id, chain selector, name)
const CHAIN_SELECTORS: &[(u64, u64, &str)] = &[
    (1, 5009297550715157269, "ethereum-mainnet"),
    (10, 3734403246176062136, "ethereum-mainnet-optimism-1"),
    (56, 11344663589394136015, "binance_smart_chain-mainnet"),
    (97, 13264668187771770619, "binance_smart_chain-testnet"),
    (137, 4051577828743386545, "polygon-mainnet"),
    (1337, 3379446385462418246, "geth-testnet"),
    (8453, 15971525489660198786, "ethereum-mainnet-base-1"),
    (31337, 7759470850252068959, "anvil-devnet"),
    (42161, 4949039107694359620, "ethereum-mainnet-arbitrum-1"),
    (43113, 14767482510784806043, "avalanche-testnet-fuji"),
    (43114, 6433500567565415381, "avalanche-mainnet"),
    (80001, 12532609583862916517, "polygon-testnet-mumbai"),
    (84532, 10344971235874465080, "ethereum-testnet-sepolia-base-1"),
    (421614, 3478487238524512106, "ethereum-testnet-sepolia-arbitrum-1"),
    (11155111, 16015286601757825753, "ethereum-testnet-sepolia"),
    (11155420, 5224473277236331295, "ethereum-testnet-sepolia-optimism-1"),
];

/// Returns the selector for a native chain id, if the chain is known.
pub fn chain_selector(chain_id: u64) -> Option<u64> {
    CHAIN_SELECTORS
        .iter()
        .find(|(id, _, _)| *id == chain_id)
        .map(|(_, selector, _)| *selector)
}

pub fn chain_name(chain_id: u64) -> Option<&'static str> {
    CHAIN_SELECTORS
        .iter()
        .find(|(id, _, _)| *id == chain_id)
        .map(|(_, _, name)| *name)
}
