use std::{fmt, str::FromStr};

use anyhow::{anyhow, ensure};
use cosmwasm_std::{Decimal, Uint128};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// cosmjs multiplier applied to simulated gas for `auto` fees
pub const DEFAULT_GAS_ADJUSTMENT: f64 = 1.4;
pub const DEFAULT_BROADCAST_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_BROADCAST_POLL_INTERVAL_MS: u64 = 500;
/// 1 NTRN expressed in untrn
pub const DEFAULT_LOW_BALANCE_THRESHOLD: u64 = 1_000_000;
/// slip-44 coin type shared by cosmos-sdk chains
pub const COSMOS_COIN_TYPE: u32 = 118;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// network name, used to key the persisted deployment record
    pub name: String,
    /// tendermint rpc node url
    pub rpc_url: String,
    /// rest (lcd) node url, only advertised to signer extensions
    #[serde(default)]
    pub rest_url: Option<String>,
    /// chain id, e.g. pion-1
    pub chain_id: String,
    /// human readable chain name
    #[serde(default)]
    pub chain_name: Option<String>,
    /// bech32 account prefix, e.g. neutron
    pub bech32_prefix: String,

    /// minimal fee denom, e.g. untrn
    pub fee_denom: String,
    /// display denom of the fee currency, e.g. NTRN
    #[serde(default = "default_coin_denom")]
    pub coin_denom: String,
    #[serde(default = "default_coin_decimals")]
    pub coin_decimals: u8,
    /// price per gas unit, `"0.025untrn"` or `{ amount = "0.025", denom = "untrn" }`
    pub gas_price: GasPrice,
    #[serde(default = "default_gas_adjustment")]
    pub gas_adjustment: f64,

    /// how long to wait for a broadcasted tx to be included
    #[serde(default = "default_broadcast_timeout_ms")]
    pub broadcast_timeout_ms: u64,
    /// interval between tx inclusion queries
    #[serde(default = "default_broadcast_poll_interval_ms")]
    pub broadcast_poll_interval_ms: u64,
    /// balances (in fee denom) below this amount trigger a warning
    #[serde(default = "default_low_balance_threshold")]
    pub low_balance_threshold: u64,
}

fn default_coin_denom() -> String {
    "NTRN".to_string()
}

fn default_coin_decimals() -> u8 {
    6
}

fn default_gas_adjustment() -> f64 {
    DEFAULT_GAS_ADJUSTMENT
}

fn default_broadcast_timeout_ms() -> u64 {
    DEFAULT_BROADCAST_TIMEOUT_MS
}

fn default_broadcast_poll_interval_ms() -> u64 {
    DEFAULT_BROADCAST_POLL_INTERVAL_MS
}

fn default_low_balance_threshold() -> u64 {
    DEFAULT_LOW_BALANCE_THRESHOLD
}

impl NetworkConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.name.trim().is_empty(), "network name must not be empty");
        ensure!(!self.rpc_url.trim().is_empty(), "rpc url must not be empty");
        ensure!(!self.chain_id.trim().is_empty(), "chain id must not be empty");
        ensure!(
            !self.bech32_prefix.trim().is_empty(),
            "bech32 prefix must not be empty"
        );
        ensure!(
            self.gas_price.denom == self.fee_denom,
            "gas price denom `{}` does not match fee denom `{}`",
            self.gas_price.denom,
            self.fee_denom
        );
        ensure!(
            self.gas_adjustment.is_finite() && self.gas_adjustment >= 1.0,
            "gas adjustment must be at least 1.0, got {}",
            self.gas_adjustment
        );
        ensure!(
            self.broadcast_poll_interval_ms > 0,
            "broadcast poll interval must be positive"
        );

        Ok(())
    }

    pub fn display_name(&self) -> &str {
        self.chain_name.as_deref().unwrap_or(&self.name)
    }

    /// chain description handed to signer extensions before enabling them
    pub fn chain_info(&self) -> ChainInfo {
        let currency = Currency {
            coin_denom: self.coin_denom.clone(),
            coin_minimal_denom: self.fee_denom.clone(),
            coin_decimals: self.coin_decimals,
        };

        ChainInfo {
            chain_id: self.chain_id.clone(),
            chain_name: self.display_name().to_string(),
            rpc: self.rpc_url.clone(),
            rest: self.rest_url.clone(),
            bip44: Bip44 {
                coin_type: COSMOS_COIN_TYPE,
            },
            bech32_config: Bech32Config::from_account_prefix(&self.bech32_prefix),
            currencies: vec![currency.clone()],
            fee_currencies: vec![FeeCurrency {
                currency: currency.clone(),
                gas_price_step: GasPriceStep::around(self.gas_price.amount),
            }],
            stake_currency: currency,
            features: ["stargate", "ibc-transfer", "cosmwasm"]
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

/// price of a single gas unit in a given denom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPrice {
    pub amount: Decimal,
    pub denom: String,
}

impl GasPrice {
    /// fee owed for `gas_limit` units, rounded up to the next whole unit of denom
    pub fn fee_amount(&self, gas_limit: u64) -> Uint128 {
        Uint128::from(gas_limit).mul_ceil(self.amount)
    }
}

impl FromStr for GasPrice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| anyhow!("gas price `{s}` is missing a denom"))?;
        let (amount, denom) = s.split_at(split);

        ensure!(!amount.is_empty(), "gas price `{s}` is missing an amount");
        ensure!(
            denom.starts_with(|c: char| c.is_ascii_alphabetic())
                && denom
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c)),
            "gas price `{s}` has an invalid denom `{denom}`"
        );

        let amount = Decimal::from_str(amount)
            .map_err(|e| anyhow!("invalid gas price amount `{amount}`: {e}"))?;

        Ok(Self {
            amount,
            denom: denom.to_string(),
        })
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GasPriceRepr {
    Literal(String),
    Structured { amount: Decimal, denom: String },
}

impl<'de> Deserialize<'de> for GasPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match GasPriceRepr::deserialize(deserializer)? {
            GasPriceRepr::Literal(s) => s.parse().map_err(serde::de::Error::custom),
            GasPriceRepr::Structured { amount, denom } => Ok(GasPrice { amount, denom }),
        }
    }
}

impl Serialize for GasPrice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// how the fee of a transaction is determined
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FeeMode {
    /// simulate the tx and scale the gas used by the network gas adjustment
    #[default]
    Auto,
    /// use an explicit gas limit
    Fixed { gas_limit: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest: Option<String>,
    pub bip44: Bip44,
    pub bech32_config: Bech32Config,
    pub currencies: Vec<Currency>,
    pub fee_currencies: Vec<FeeCurrency>,
    pub stake_currency: Currency,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bip44 {
    pub coin_type: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bech32Config {
    pub bech32_prefix_acc_addr: String,
    pub bech32_prefix_acc_pub: String,
    pub bech32_prefix_val_addr: String,
    pub bech32_prefix_val_pub: String,
    pub bech32_prefix_cons_addr: String,
    pub bech32_prefix_cons_pub: String,
}

impl Bech32Config {
    pub fn from_account_prefix(prefix: &str) -> Self {
        Self {
            bech32_prefix_acc_addr: prefix.to_string(),
            bech32_prefix_acc_pub: format!("{prefix}pub"),
            bech32_prefix_val_addr: format!("{prefix}valoper"),
            bech32_prefix_val_pub: format!("{prefix}valoperpub"),
            bech32_prefix_cons_addr: format!("{prefix}valcons"),
            bech32_prefix_cons_pub: format!("{prefix}valconspub"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub coin_denom: String,
    pub coin_minimal_denom: String,
    pub coin_decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCurrency {
    #[serde(flatten)]
    pub currency: Currency,
    pub gas_price_step: GasPriceStep,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GasPriceStep {
    pub low: Decimal,
    pub average: Decimal,
    pub high: Decimal,
}

impl GasPriceStep {
    /// low/high steps at 40% and 200% of the configured price
    pub fn around(average: Decimal) -> Self {
        Self {
            low: average * Decimal::percent(40),
            average,
            high: average * Decimal::percent(200),
        }
    }
}
