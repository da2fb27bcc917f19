use contract_types::deployment::Coin;
use cosmwasm_std::{Decimal, Uint128};
use log::{info, warn};
use packages::chain::ChainClient;

use crate::deployment::{BalanceCheck, Deployment};

const BALANCE_PHASE: &str = "balance";

impl Deployment<'_> {
    /// queries the deployer balance in the fee denom. never fails the
    /// deployment, an unreachable node only produces a warning
    pub(crate) async fn check_balance(&self, client: &dyn ChainClient, address: &str) -> BalanceCheck {
        let network = &self.cfg.network;

        let balance = match client.get_balance(address, &network.fee_denom).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(target: BALANCE_PHASE, "could not check balance of {address}: {e}");
                return BalanceCheck::Unavailable(e.to_string());
            }
        };

        let display = display_amount(&balance, network.coin_decimals);
        if balance.amount < Uint128::from(network.low_balance_threshold) {
            warn!(
                target: BALANCE_PHASE,
                "low balance: {display} {}, the deployment may run out of funds",
                network.coin_denom
            );
            return BalanceCheck::Low(balance);
        }

        info!(target: BALANCE_PHASE, "balance: {display} {}", network.coin_denom);
        BalanceCheck::Confirmed(balance)
    }
}

/// amount in display units, falls back to the base denom if it does not fit
fn display_amount(coin: &Coin, decimals: u8) -> String {
    Decimal::from_atomics(coin.amount, decimals.into())
        .map(|d| d.to_string())
        .unwrap_or_else(|_| coin.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_display_amount() {
        let coin = Coin {
            denom: "untrn".to_string(),
            amount: Uint128::new(2_500_000),
        };
        assert_eq!(display_amount(&coin, 6), "2.5");

        let coin = Coin {
            denom: "untrn".to_string(),
            amount: Uint128::new(1),
        };
        assert_eq!(display_amount(&coin, 6), "0.000001");
    }
}
