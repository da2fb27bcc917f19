use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use contract_deploy::{BalanceCheck, DeployState, Deployment, Persistence};
use contract_types::{
    deploy_config::{DeployConfig, TomlConfig, WalletRecord},
    deployment::{
        Coin, ContractArtifact, DeploymentRecord, InstantiateOptions, InstantiateResult,
        UploadResult,
    },
    neutron_config::{FeeMode, NetworkConfig},
};
use cosmwasm_std::Uint128;
use packages::{
    artifact::{ArtifactLoader, ArtifactSource},
    chain::{ChainClient, ChainConnector},
    error::{ChainError, DeployError},
    sink::{RecordSink, ResultSink},
    wallet::{MnemonicSigner, MnemonicWallet, OfflineSigner},
};
use serde_json::{json, Value};

const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const CONFIGURED_ADDRESS: &str = "neutron1syk9g8dc5vyjv82xcxtwt00aek6lv8sw0xywvt";

const CONFIG: &str = r#"
    [network]
    name = "neutron-testnet"
    rpc_url = "http://127.0.0.1:26657"
    chain_id = "pion-1"
    bech32_prefix = "neutron"
    fee_denom = "untrn"
    gas_price = "0.025untrn"

    [wallet]
    kind = "mnemonic"
    name = "account_0"
    address = "neutron1syk9g8dc5vyjv82xcxtwt00aek6lv8sw0xywvt"

    [artifact]
    kind = "path"
    path = "artifacts/contract.wasm"

    [output]
    kind = "file"
"#;

#[derive(Default)]
struct Calls {
    balance: AtomicUsize,
    upload: AtomicUsize,
    instantiate: AtomicUsize,
}

struct MockChain {
    calls: Arc<Calls>,
    balance: Option<u128>,
    upload: UploadResult,
    instantiate: InstantiateResult,
    seen_init_msg: Arc<Mutex<Option<Value>>>,
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_balance(&self, _address: &str, denom: &str) -> Result<Coin, ChainError> {
        self.calls.balance.fetch_add(1, Ordering::SeqCst);
        match self.balance {
            Some(amount) => Ok(Coin {
                denom: denom.to_string(),
                amount: Uint128::new(amount),
            }),
            None => Err(ChainError::Transport("request timed out".to_string())),
        }
    }

    async fn upload(
        &self,
        _sender: &str,
        artifact: &ContractArtifact,
        _fee: FeeMode,
        _memo: Option<&str>,
    ) -> Result<UploadResult, ChainError> {
        self.calls.upload.fetch_add(1, Ordering::SeqCst);
        assert!(!artifact.is_empty());
        Ok(self.upload.clone())
    }

    async fn instantiate(
        &self,
        _sender: &str,
        code_id: u64,
        init_msg: &Value,
        _label: &str,
        _fee: FeeMode,
        _options: &InstantiateOptions,
    ) -> Result<InstantiateResult, ChainError> {
        self.calls.instantiate.fetch_add(1, Ordering::SeqCst);
        assert_eq!(code_id, self.upload.code_id);
        *self.seen_init_msg.lock().unwrap() = Some(init_msg.clone());
        Ok(self.instantiate.clone())
    }
}

struct MockConnector {
    calls: Arc<Calls>,
    balance: Option<u128>,
    contract_address: String,
    seen_init_msg: Arc<Mutex<Option<Value>>>,
}

impl MockConnector {
    fn new() -> Self {
        Self {
            calls: Arc::new(Calls::default()),
            balance: Some(5_000_000),
            contract_address: "neutron1xyz...".to_string(),
            seen_init_msg: Arc::new(Mutex::new(None)),
        }
    }

    fn uploads(&self) -> usize {
        self.calls.upload.load(Ordering::SeqCst)
    }

    fn instantiations(&self) -> usize {
        self.calls.instantiate.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainConnector for MockConnector {
    async fn connect(
        &self,
        _network: &NetworkConfig,
        _signer: Arc<dyn OfflineSigner>,
    ) -> Result<Box<dyn ChainClient>, ChainError> {
        Ok(Box::new(MockChain {
            calls: self.calls.clone(),
            balance: self.balance,
            upload: UploadResult {
                code_id: 42,
                transaction_hash: "ABCD".to_string(),
                checksum: "abcd".to_string(),
            },
            instantiate: InstantiateResult {
                contract_address: self.contract_address.clone(),
                transaction_hash: "EFGH".to_string(),
            },
            seen_init_msg: self.seen_init_msg.clone(),
        }))
    }
}

struct FailingSink;

#[async_trait]
impl ResultSink for FailingSink {
    async fn save(&self, _record: &DeploymentRecord) -> Result<String, DeployError> {
        Err(DeployError::PersistenceFailed {
            target: "deployment-neutron-testnet.json".to_string(),
            source: "read-only file system".into(),
        })
    }
}

fn config() -> DeployConfig {
    DeployConfig::from_toml_str(CONFIG).unwrap()
}

fn wallet() -> MnemonicWallet {
    MnemonicWallet::new(
        WalletRecord {
            name: "account_0".to_string(),
            address: Some(CONFIGURED_ADDRESS.to_string()),
            ..Default::default()
        },
        Some(TEST_MNEMONIC.to_string()),
    )
}

fn derived_address() -> String {
    MnemonicSigner::derive(TEST_MNEMONIC, "neutron")
        .unwrap()
        .address()
        .to_string()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("deployment-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn artifact_in(dir: &Path, len: usize) -> ArtifactSource {
    let path = dir.join("contract.wasm");
    fs::write(&path, vec![7u8; len]).unwrap();
    ArtifactSource::Path(path)
}

#[tokio::test]
async fn deploys_and_writes_file_record() {
    let dir = scratch_dir("e2e");
    let cfg = config();
    let wallet = wallet();
    let artifacts = artifact_in(&dir, 120);
    let connector = MockConnector::new();
    let sink = RecordSink::File {
        dir: dir.clone(),
        track_timestamp: false,
    };

    let mut deployment = Deployment::new(&cfg, &wallet, &artifacts, &connector, &sink);
    let outcome = deployment.run().await.unwrap();

    assert_eq!(deployment.state(), &DeployState::Done);
    assert_eq!(outcome.record.code_id(), 42);
    assert_eq!(outcome.record.contract_address(), "neutron1xyz...");
    assert!(matches!(outcome.balance, BalanceCheck::Confirmed(_)));
    assert!(outcome.persistence.is_saved());
    assert_eq!(connector.uploads(), 1);
    assert_eq!(connector.instantiations(), 1);
    assert_eq!(
        connector.seen_init_msg.lock().unwrap().clone(),
        Some(json!({}))
    );

    let written: Value = serde_json::from_str(
        &fs::read_to_string(dir.join("deployment-neutron-testnet.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(
        written,
        json!({
            "network": "neutron-testnet",
            "codeId": 42,
            "contractAddress": "neutron1xyz...",
            "deployer": derived_address(),
            "transactionHash": "EFGH",
        })
    );

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn store_record_splits_transaction_hashes() {
    let dir = scratch_dir("store");
    let cfg = config();
    let wallet = wallet();
    let artifacts = artifact_in(&dir, 120);
    let connector = MockConnector::new();
    let store = dir.join("storage.json");
    let sink = RecordSink::Store {
        path: store.clone(),
        key: "neutron-deployment".to_string(),
    };

    Deployment::new(&cfg, &wallet, &artifacts, &connector, &sink)
        .run()
        .await
        .unwrap();

    let stored: Value = serde_json::from_str(&fs::read_to_string(store).unwrap()).unwrap();
    let entry = &stored["neutron-deployment"];
    assert_eq!(entry["codeId"], 42);
    assert_eq!(entry["uploadTxHash"], "ABCD");
    assert_eq!(entry["instantiateTxHash"], "EFGH");
    assert_eq!(entry["deployer"], derived_address());
    assert!(entry["deployedAt"].as_str().unwrap().ends_with('Z'));

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn missing_artifact_never_reaches_the_chain() {
    let cfg = config();
    let wallet = wallet();
    let artifacts = ArtifactSource::Path(PathBuf::from("does/not/exist/contract.wasm"));
    let connector = MockConnector::new();

    let mut deployment = Deployment::new(&cfg, &wallet, &artifacts, &connector, &FailingSink);
    let err = deployment.run().await.unwrap_err();

    assert!(matches!(err, DeployError::ArtifactNotFound { .. }));
    assert!(err.is_fatal());
    assert!(matches!(deployment.state(), DeployState::Failed(_)));
    assert_eq!(connector.uploads(), 0);
    assert_eq!(connector.instantiations(), 0);
}

#[tokio::test]
async fn empty_artifact_is_rejected_before_upload() {
    let dir = scratch_dir("empty");
    let cfg = config();
    let wallet = wallet();
    let artifacts = artifact_in(&dir, 0);
    let connector = MockConnector::new();

    let err = Deployment::new(&cfg, &wallet, &artifacts, &connector, &FailingSink)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::EmptyArtifact));
    assert_eq!(connector.uploads(), 0);

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn empty_contract_address_is_fatal_and_not_persisted() {
    let dir = scratch_dir("no-address");
    let cfg = config();
    let wallet = wallet();
    let artifacts = artifact_in(&dir, 120);
    let mut connector = MockConnector::new();
    connector.contract_address = String::new();
    let sink = RecordSink::File {
        dir: dir.clone(),
        track_timestamp: false,
    };

    let err = Deployment::new(&cfg, &wallet, &artifacts, &connector, &sink)
        .run()
        .await
        .unwrap_err();

    match err {
        DeployError::MissingContractAddress { transaction_hash } => {
            assert_eq!(transaction_hash, "EFGH")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!dir.join("deployment-neutron-testnet.json").exists());

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn sink_failure_still_reports_success() {
    let dir = scratch_dir("sink");
    let cfg = config();
    let wallet = wallet();
    let artifacts = artifact_in(&dir, 120);
    let connector = MockConnector::new();

    let mut deployment = Deployment::new(&cfg, &wallet, &artifacts, &connector, &FailingSink);
    let outcome = deployment.run().await.unwrap();

    assert_eq!(deployment.state(), &DeployState::Done);
    assert_eq!(outcome.record.code_id(), 42);
    match outcome.persistence {
        Persistence::Failed(e) => assert!(!e.is_fatal()),
        Persistence::Saved(target) => panic!("unexpected save to {target}"),
    }

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn balance_failure_does_not_stop_deployment() {
    let dir = scratch_dir("balance");
    let cfg = config();
    let wallet = wallet();
    let artifacts = artifact_in(&dir, 120);
    let mut connector = MockConnector::new();
    connector.balance = None;

    let outcome = Deployment::new(&cfg, &wallet, &artifacts, &connector, &FailingSink)
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome.balance, BalanceCheck::Unavailable(_)));
    assert_eq!(connector.calls.balance.load(Ordering::SeqCst), 1);
    assert_eq!(connector.uploads(), 1);
    assert_eq!(connector.instantiations(), 1);

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn low_balance_is_only_a_warning() {
    let dir = scratch_dir("low-balance");
    let cfg = config();
    let wallet = wallet();
    let artifacts = artifact_in(&dir, 120);
    let mut connector = MockConnector::new();
    connector.balance = Some(10);

    let outcome = Deployment::new(&cfg, &wallet, &artifacts, &connector, &FailingSink)
        .run()
        .await
        .unwrap();

    assert!(matches!(outcome.balance, BalanceCheck::Low(coin) if coin.amount == Uint128::new(10)));
    assert_eq!(connector.uploads(), 1);

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn deployer_is_the_derived_address() {
    let dir = scratch_dir("mismatch");
    let cfg = config();
    let wallet = wallet();
    let artifacts = artifact_in(&dir, 120);
    let connector = MockConnector::new();

    let outcome = Deployment::new(&cfg, &wallet, &artifacts, &connector, &FailingSink)
        .run()
        .await
        .unwrap();

    assert_ne!(outcome.record.deployer(), CONFIGURED_ADDRESS);
    assert_eq!(outcome.record.deployer(), derived_address());

    fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn missing_mnemonic_fails_before_anything_else() {
    let cfg = config();
    let wallet = MnemonicWallet::new(
        WalletRecord {
            name: "account_0".to_string(),
            ..Default::default()
        },
        None,
    );
    let artifacts = ArtifactSource::Path(PathBuf::from("unused.wasm"));
    let connector = MockConnector::new();

    let err = Deployment::new(&cfg, &wallet, &artifacts, &connector, &FailingSink)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::WalletUnavailable(_)));
    assert_eq!(connector.calls.balance.load(Ordering::SeqCst), 0);
    assert_eq!(connector.uploads(), 0);
}

#[tokio::test]
async fn artifact_loader_is_called_once() {
    struct CountingLoader(AtomicUsize);

    #[async_trait]
    impl ArtifactLoader for CountingLoader {
        async fn load(&self) -> Result<ContractArtifact, DeployError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ContractArtifact::new(vec![1u8; 120]).unwrap())
        }
    }

    let cfg = config();
    let wallet = wallet();
    let artifacts = CountingLoader(AtomicUsize::new(0));
    let connector = MockConnector::new();

    Deployment::new(&cfg, &wallet, &artifacts, &connector, &FailingSink)
        .run()
        .await
        .unwrap();

    assert_eq!(artifacts.0.load(Ordering::SeqCst), 1);
}
