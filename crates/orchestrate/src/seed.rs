//! Seeding of application data through contract calls.
//!
//! Calls are submitted strictly sequentially: on-chain state depends on call
//! order, and concurrent submissions from a single sender risk nonce and
//! ordering conflicts. Do not parallelize the seeding loop.

use std::future::Future;

use alloy_core::primitives::{Address, U256};
use alloy_core::sol_types::SolCall;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::OrchestrateError;
use crate::rpc;

alloy_core::sol! {
    /// Registers the actor that owns seeded records.
    function registerFarmer(address account);
    /// Creates one produce record.
    function addProduce(string name, string origin, uint256 priceWei);
}

/// One produce record to seed into the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProduceRecord {
    pub name: String,
    pub origin: String,
    /// Listed price in wei.
    pub price_wei: u64,
}

/// The fixed data seeded into a fresh environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPlan {
    /// The actor registered before any record is created. Defaults to the
    /// node's first unlocked account when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Address>,
    /// Records created in order, one call each.
    pub records: Vec<ProduceRecord>,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            actor: None,
            records: vec![
                ProduceRecord {
                    name: "Mango".to_string(),
                    origin: "Ratnagiri".to_string(),
                    price_wei: 11_000_000_000_000_000,
                },
                ProduceRecord {
                    name: "Rice".to_string(),
                    origin: "Thanjavur".to_string(),
                    price_wei: 5_000_000_000_000_000,
                },
                ProduceRecord {
                    name: "Wheat".to_string(),
                    origin: "Ludhiana".to_string(),
                    price_wei: 3_000_000_000_000_000,
                },
            ],
        }
    }
}

impl SeedPlan {
    /// The ordered call sequence: one registration, then one call per
    /// record in input order.
    pub fn calls(&self, fallback_actor: Address) -> Vec<SeedCall> {
        let mut calls = Vec::with_capacity(self.records.len() + 1);
        calls.push(SeedCall::RegisterActor {
            account: self.actor.unwrap_or(fallback_actor),
        });
        calls.extend(
            self.records
                .iter()
                .cloned()
                .map(|record| SeedCall::CreateRecord { record }),
        );
        calls
    }
}

/// One state-mutating call the seeder issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedCall {
    RegisterActor { account: Address },
    CreateRecord { record: ProduceRecord },
}

impl SeedCall {
    /// Human-readable description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Self::RegisterActor { account } => format!("registerFarmer({account})"),
            Self::CreateRecord { record } => format!(
                "addProduce({}, {}, {})",
                record.name, record.origin, record.price_wei
            ),
        }
    }

    /// ABI-encoded calldata, 0x-prefixed.
    pub fn calldata(&self) -> String {
        let encoded = match self {
            Self::RegisterActor { account } => {
                registerFarmerCall { account: *account }.abi_encode()
            }
            Self::CreateRecord { record } => addProduceCall {
                name: record.name.clone(),
                origin: record.origin.clone(),
                priceWei: U256::from(record.price_wei),
            }
            .abi_encode(),
        };
        format!("0x{}", hex::encode(encoded))
    }
}

/// Client bound to a deployed contract on the running network.
///
/// A trait seam so the seeding discipline can be exercised against a
/// recording fake instead of a live chain.
pub trait ContractClient {
    /// Submit one call and wait for its acknowledgment.
    fn call(&self, call: &SeedCall) -> impl Future<Output = Result<(), OrchestrateError>>;
}

/// JSON-RPC client submitting calls from the node's first unlocked account.
pub struct RpcContractClient {
    client: reqwest::Client,
    url: String,
    from: Address,
    contract: Address,
}

impl RpcContractClient {
    /// Connect to the node and bind to the deployed contract.
    pub async fn connect(url: &Url, contract: Address) -> Result<Self, OrchestrateError> {
        let client = rpc::create_client()?;
        let accounts = rpc::eth_accounts(&client, url.as_str()).await?;
        let from = accounts
            .first()
            .ok_or_else(|| anyhow::anyhow!("Node reports no unlocked accounts"))?
            .parse::<Address>()
            .map_err(|e| anyhow::anyhow!("Node returned an invalid account address: {e}"))?;

        tracing::debug!(%from, %contract, "Contract client connected");
        Ok(Self {
            client,
            url: url.to_string(),
            from,
            contract,
        })
    }

    /// The unlocked account all seeding calls are sent from.
    pub fn sender(&self) -> Address {
        self.from
    }
}

impl ContractClient for RpcContractClient {
    async fn call(&self, call: &SeedCall) -> Result<(), OrchestrateError> {
        let rejected = |reason: String| OrchestrateError::CallRejected {
            call: call.describe(),
            reason,
        };

        let tx_hash = rpc::send_transaction(
            &self.client,
            &self.url,
            &self.from.to_string(),
            &self.contract.to_string(),
            &call.calldata(),
        )
        .await
        .map_err(|e| rejected(e.to_string()))?;

        // Acknowledged only once mined with success status; a revert after
        // mining is still a rejection.
        rpc::wait_for_receipt(&self.client, &self.url, &tx_hash)
            .await
            .map_err(|e| rejected(e.to_string()))?;

        tracing::debug!(call = %call.describe(), %tx_hash, "Seed call acknowledged");
        Ok(())
    }
}

/// Issue the full seeding sequence against `client`.
///
/// Awaits each call's acknowledgment before submitting the next. The first
/// rejection aborts the sequence; remaining records are never submitted.
/// Returns the number of calls submitted on success.
pub async fn run_seed<C: ContractClient>(
    client: &C,
    plan: &SeedPlan,
    fallback_actor: Address,
) -> Result<usize, OrchestrateError> {
    let calls = plan.calls(fallback_actor);
    let total = calls.len();

    for (i, call) in calls.iter().enumerate() {
        tracing::info!(call = %call.describe(), "Submitting seed call ({}/{total})", i + 1);
        client.call(call).await?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call; rejects from `fail_at` (1-based) onwards.
    struct RecordingClient {
        calls: Mutex<Vec<String>>,
        fail_at: Option<usize>,
    }

    impl RecordingClient {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_at,
            }
        }
    }

    impl ContractClient for RecordingClient {
        async fn call(&self, call: &SeedCall) -> Result<(), OrchestrateError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call.describe());
            if self.fail_at == Some(calls.len()) {
                return Err(OrchestrateError::CallRejected {
                    call: call.describe(),
                    reason: "revert".to_string(),
                });
            }
            Ok(())
        }
    }

    fn actor() -> Address {
        Address::repeat_byte(0x42)
    }

    #[tokio::test]
    async fn test_seeding_order() {
        let client = RecordingClient::new(None);
        let submitted = run_seed(&client, &SeedPlan::default(), actor())
            .await
            .unwrap();

        // 1 registration + 3 records, in input order.
        assert_eq!(submitted, 4);
        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert!(calls[0].starts_with("registerFarmer("));
        assert!(calls[1].starts_with("addProduce(Mango"));
        assert!(calls[2].starts_with("addProduce(Rice"));
        assert!(calls[3].starts_with("addProduce(Wheat"));
    }

    #[tokio::test]
    async fn test_aborts_on_first_rejection() {
        let client = RecordingClient::new(Some(2));
        let err = run_seed(&client, &SeedPlan::default(), actor())
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestrateError::CallRejected { .. }));
        // Rice and Wheat were never submitted.
        assert_eq!(client.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_explicit_actor_overrides_fallback() {
        let plan = SeedPlan {
            actor: Some(Address::repeat_byte(0x11)),
            records: Vec::new(),
        };
        let calls = plan.calls(actor());
        assert_eq!(
            calls,
            vec![SeedCall::RegisterActor {
                account: Address::repeat_byte(0x11)
            }]
        );
    }

    #[test]
    fn test_register_calldata() {
        let call = SeedCall::RegisterActor { account: actor() };
        let data = call.calldata();

        let selector = hex::encode(registerFarmerCall::SELECTOR);
        assert!(data.starts_with(&format!("0x{selector}")));
        // Selector + one address word.
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.ends_with(&"42".repeat(20)));
    }

    #[test]
    fn test_create_record_calldata() {
        let record = ProduceRecord {
            name: "Mango".to_string(),
            origin: "Ratnagiri".to_string(),
            price_wei: 1_000,
        };
        let data = SeedCall::CreateRecord { record }.calldata();

        let selector = hex::encode(addProduceCall::SELECTOR);
        assert!(data.starts_with(&format!("0x{selector}")));
        // Dynamic strings are hex-encoded in the tail.
        assert!(data.contains(&hex::encode("Mango")));
        assert!(data.contains(&hex::encode("Ratnagiri")));
    }
}
