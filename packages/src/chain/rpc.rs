use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use contract_types::{
    deployment::{Coin, ContractArtifact, InstantiateOptions, InstantiateResult, UploadResult},
    neutron_config::{FeeMode, NetworkConfig},
};
use cosmrs::{
    cosmwasm::{MsgInstantiateContract, MsgStoreCode},
    crypto::PublicKey,
    proto::{
        cosmos::{
            auth::v1beta1::{BaseAccount, QueryAccountRequest, QueryAccountResponse},
            bank::v1beta1::{QueryBalanceRequest, QueryBalanceResponse},
            base::abci::v1beta1::TxMsgData,
            tx::v1beta1::{SimulateRequest, SimulateResponse, TxRaw},
        },
        cosmwasm::wasm::v1::{MsgInstantiateContractResponse, MsgStoreCodeResponse},
        traits::Message,
    },
    rpc::{Client, HttpClient},
    tendermint::{chain, Hash},
    tx::{Body, Fee, Msg, SignDoc, SignerInfo},
    AccountId, Any,
};
use cosmwasm_std::Uint128;
use log::{debug, info};
use tokio::time::{sleep, Instant};

use super::{ChainClient, ChainConnector, CHAIN};
use crate::{error::ChainError, wallet::OfflineSigner};

const ACCOUNT_QUERY: &str = "/cosmos.auth.v1beta1.Query/Account";
const BALANCE_QUERY: &str = "/cosmos.bank.v1beta1.Query/Balance";
const SIMULATE_QUERY: &str = "/cosmos.tx.v1beta1.Service/Simulate";

fn transport(e: impl std::fmt::Display) -> ChainError {
    ChainError::Transport(e.to_string())
}

fn encode(e: impl std::fmt::Display) -> ChainError {
    ChainError::Encode(e.to_string())
}

fn decode(e: impl std::fmt::Display) -> ChainError {
    ChainError::Decode(e.to_string())
}

/// connects [`RpcChainClient`]s to tendermint rpc endpoints
pub struct RpcConnector;

#[async_trait]
impl ChainConnector for RpcConnector {
    async fn connect(
        &self,
        network: &NetworkConfig,
        signer: Arc<dyn OfflineSigner>,
    ) -> Result<Box<dyn ChainClient>, ChainError> {
        let client = RpcChainClient::connect(network.clone(), signer).await?;
        Ok(Box::new(client))
    }
}

/// transaction that made it into a block
struct IncludedTx {
    hash: String,
    data: Vec<u8>,
}

pub struct RpcChainClient {
    rpc: HttpClient,
    network: NetworkConfig,
    signer: Arc<dyn OfflineSigner>,
}

impl RpcChainClient {
    pub async fn connect(
        network: NetworkConfig,
        signer: Arc<dyn OfflineSigner>,
    ) -> Result<Self, ChainError> {
        let rpc = HttpClient::new(network.rpc_url.as_str()).map_err(transport)?;

        let status = rpc.status().await.map_err(transport)?;
        let node_chain_id = status.node_info.network.to_string();
        if node_chain_id != network.chain_id {
            return Err(ChainError::UnexpectedResponse(format!(
                "node at {} serves chain {node_chain_id}, expected {}",
                network.rpc_url, network.chain_id
            )));
        }

        info!(
            target: CHAIN,
            "connected to {} via {} at height {}",
            network.chain_id,
            network.rpc_url,
            status.sync_info.latest_block_height
        );

        Ok(Self {
            rpc,
            network,
            signer,
        })
    }

    async fn query<Req, Res>(&self, path: &str, request: Req) -> Result<Res, ChainError>
    where
        Req: Message,
        Res: Message + Default,
    {
        let response = self
            .rpc
            .abci_query(Some(path.to_string()), request.encode_to_vec(), None, false)
            .await
            .map_err(transport)?;

        if response.code.is_err() {
            return Err(ChainError::Query {
                path: path.to_string(),
                code: response.code.value(),
                log: response.log,
            });
        }

        Res::decode(response.value.as_slice()).map_err(decode)
    }

    async fn account(&self, address: &str) -> Result<BaseAccount, ChainError> {
        let response: QueryAccountResponse = self
            .query(
                ACCOUNT_QUERY,
                QueryAccountRequest {
                    address: address.to_string(),
                },
            )
            .await?;

        let account = response.account.ok_or_else(|| {
            ChainError::UnexpectedResponse(format!("account {address} does not exist on chain"))
        })?;

        BaseAccount::decode(account.value.as_slice()).map_err(decode)
    }

    async fn signer_public_key(&self, sender: &str) -> Result<PublicKey, ChainError> {
        self.signer
            .accounts()
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?
            .into_iter()
            .find(|account| account.address == sender)
            .map(|account| account.public_key)
            .ok_or_else(|| ChainError::Signing(format!("signer does not hold account {sender}")))
    }

    /// gas used by `body` when executed by the given signer, signature checks skipped
    async fn simulate(
        &self,
        body: &Body,
        public_key: PublicKey,
        sequence: u64,
    ) -> Result<u64, ChainError> {
        let fee = Fee::from_amount_and_gas(
            cosmrs::Coin::new(0, &self.network.fee_denom).map_err(encode)?,
            0u64,
        );
        let auth_info = SignerInfo::single_direct(Some(public_key), sequence).auth_info(fee);

        let tx = TxRaw {
            body_bytes: body.clone().into_bytes().map_err(encode)?,
            auth_info_bytes: auth_info.into_bytes().map_err(encode)?,
            signatures: vec![vec![]],
        };

        #[allow(deprecated)]
        let request = SimulateRequest {
            tx: None,
            tx_bytes: tx.encode_to_vec(),
        };

        let response: SimulateResponse = self.query(SIMULATE_QUERY, request).await?;
        let gas_info = response.gas_info.ok_or_else(|| {
            ChainError::UnexpectedResponse("simulation returned no gas info".to_string())
        })?;

        debug!(target: CHAIN, "simulated gas used: {}", gas_info.gas_used);

        Ok(gas_info.gas_used)
    }

    async fn gas_limit(
        &self,
        fee: FeeMode,
        body: &Body,
        public_key: PublicKey,
        sequence: u64,
    ) -> Result<u64, ChainError> {
        match fee {
            FeeMode::Fixed { gas_limit } => Ok(gas_limit),
            FeeMode::Auto => {
                let gas_used = self.simulate(body, public_key, sequence).await?;
                Ok(adjusted_gas(gas_used, self.network.gas_adjustment))
            }
        }
    }

    /// signs, broadcasts and waits for a single-message transaction
    async fn send(
        &self,
        sender: &str,
        msg: Any,
        memo: &str,
        fee: FeeMode,
    ) -> Result<IncludedTx, ChainError> {
        let account = self.account(sender).await?;
        let public_key = self.signer_public_key(sender).await?;

        let body = Body::new(vec![msg], memo, 0u32);
        let gas_limit = self
            .gas_limit(fee, &body, public_key, account.sequence)
            .await?;
        let amount = self.network.gas_price.fee_amount(gas_limit);

        debug!(
            target: CHAIN,
            "fee: {amount}{} for {gas_limit} gas", self.network.gas_price.denom
        );

        let fee = Fee::from_amount_and_gas(
            cosmrs::Coin::new(amount.u128(), &self.network.gas_price.denom).map_err(encode)?,
            gas_limit,
        );
        let auth_info = SignerInfo::single_direct(Some(public_key), account.sequence).auth_info(fee);

        let chain_id: chain::Id = self.network.chain_id.parse().map_err(encode)?;
        let sign_doc =
            SignDoc::new(&body, &auth_info, &chain_id, account.account_number).map_err(encode)?;

        let raw = self
            .signer
            .sign_direct(sender, sign_doc)
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?;

        self.broadcast(raw.to_bytes().map_err(encode)?).await
    }

    async fn broadcast(&self, tx_bytes: Vec<u8>) -> Result<IncludedTx, ChainError> {
        let response = self.rpc.broadcast_tx_sync(tx_bytes).await.map_err(transport)?;

        if response.code.is_err() {
            return Err(ChainError::Rejected {
                code: response.code.value(),
                log: response.log,
            });
        }

        debug!(target: CHAIN, "tx hash: {}", response.hash);

        self.poll_for_tx(response.hash).await
    }

    async fn poll_for_tx(&self, hash: Hash) -> Result<IncludedTx, ChainError> {
        let timeout = Duration::from_millis(self.network.broadcast_timeout_ms);
        let interval = Duration::from_millis(self.network.broadcast_poll_interval_ms);
        let started = Instant::now();

        loop {
            match self.rpc.tx(hash, false).await {
                Ok(response) => {
                    let result = response.tx_result;
                    if result.code.is_err() {
                        return Err(ChainError::TxFailed {
                            hash: hash.to_string(),
                            code: result.code.value(),
                            log: result.log,
                        });
                    }

                    info!(
                        target: CHAIN,
                        "tx {hash} included at height {} (gas used {})",
                        response.height,
                        result.gas_used
                    );

                    return Ok(IncludedTx {
                        hash: hash.to_string(),
                        data: result.data.to_vec(),
                    });
                }
                Err(e) => debug!(target: CHAIN, "tx {hash} not found yet: {e}"),
            }

            if started.elapsed() >= timeout {
                return Err(ChainError::Timeout {
                    hash: hash.to_string(),
                    timeout_ms: self.network.broadcast_timeout_ms,
                });
            }

            sleep(interval).await;
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn get_balance(&self, address: &str, denom: &str) -> Result<Coin, ChainError> {
        let response: QueryBalanceResponse = self
            .query(
                BALANCE_QUERY,
                QueryBalanceRequest {
                    address: address.to_string(),
                    denom: denom.to_string(),
                },
            )
            .await?;

        let amount = match response.balance {
            Some(coin) => coin
                .amount
                .parse::<u128>()
                .map_err(|e| ChainError::Decode(format!("invalid balance `{}`: {e}", coin.amount)))?,
            None => 0,
        };

        Ok(Coin {
            denom: denom.to_string(),
            amount: Uint128::new(amount),
        })
    }

    async fn upload(
        &self,
        sender: &str,
        artifact: &ContractArtifact,
        fee: FeeMode,
        memo: Option<&str>,
    ) -> Result<UploadResult, ChainError> {
        let msg = MsgStoreCode {
            sender: parse_account(sender)?,
            wasm_byte_code: artifact.bytes().to_vec(),
            instantiate_permission: None,
        }
        .to_any()
        .map_err(encode)?;

        let tx = self.send(sender, msg, memo.unwrap_or_default(), fee).await?;

        store_code_result(tx.hash, &tx.data)
    }

    async fn instantiate(
        &self,
        sender: &str,
        code_id: u64,
        init_msg: &serde_json::Value,
        label: &str,
        fee: FeeMode,
        options: &InstantiateOptions,
    ) -> Result<InstantiateResult, ChainError> {
        let admin = options.admin.as_deref().map(parse_account).transpose()?;

        let msg = MsgInstantiateContract {
            sender: parse_account(sender)?,
            admin,
            code_id,
            label: Some(label.to_string()),
            msg: serde_json::to_vec(init_msg).map_err(encode)?,
            funds: vec![],
        }
        .to_any()
        .map_err(encode)?;

        let tx = self
            .send(sender, msg, options.memo.as_deref().unwrap_or_default(), fee)
            .await?;

        instantiate_result(tx.hash, &tx.data)
    }
}

fn parse_account(address: &str) -> Result<AccountId, ChainError> {
    address
        .parse()
        .map_err(|e| ChainError::Encode(format!("invalid address {address}: {e}")))
}

/// simulated gas scaled by `adjustment`, rounded up
fn adjusted_gas(gas_used: u64, adjustment: f64) -> u64 {
    (gas_used as f64 * adjustment).ceil() as u64
}

/// response bytes of the first message in a delivered tx
fn first_msg_response(data: &[u8]) -> Result<Vec<u8>, ChainError> {
    let msg_data = TxMsgData::decode(data).map_err(decode)?;

    if let Some(response) = msg_data.msg_responses.into_iter().next() {
        return Ok(response.value);
    }

    // chains before sdk 0.46 only fill the legacy field
    #[allow(deprecated)]
    let legacy = msg_data.data.into_iter().next().map(|d| d.data);

    legacy.ok_or_else(|| {
        ChainError::UnexpectedResponse("transaction returned no message responses".to_string())
    })
}

fn store_code_result(hash: String, data: &[u8]) -> Result<UploadResult, ChainError> {
    let response = MsgStoreCodeResponse::decode(first_msg_response(data)?.as_slice())
        .map_err(decode)?;

    if response.code_id == 0 {
        return Err(ChainError::UnexpectedResponse(format!(
            "tx {hash} did not assign a code id"
        )));
    }

    Ok(UploadResult {
        code_id: response.code_id,
        transaction_hash: hash,
        checksum: hex::encode(response.checksum),
    })
}

fn instantiate_result(hash: String, data: &[u8]) -> Result<InstantiateResult, ChainError> {
    let response = MsgInstantiateContractResponse::decode(first_msg_response(data)?.as_slice())
        .map_err(decode)?;

    Ok(InstantiateResult {
        contract_address: response.address,
        transaction_hash: hash,
    })
}
