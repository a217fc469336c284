//! JSON-RPC utilities for talking to the dev chain.

use std::time::Duration;

use anyhow::{Context, Result};
use backon::{ExponentialBuilder, Retryable};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How many receipt polls before giving up on a transaction.
const RECEIPT_POLL_ATTEMPTS: usize = 15;

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// An `error` member in the response body is surfaced as an error with the
/// node's message, which for contract calls carries the revert reason.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {method} request"))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {method} response"))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!(
            "RPC error: {}",
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = result
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {method} result"))
}

/// Fetch the node's unlocked accounts.
pub async fn eth_accounts(client: &reqwest::Client, url: &str) -> Result<Vec<String>> {
    json_rpc_call(client, url, "eth_accounts", vec![]).await
}

/// Submit a transaction from an unlocked account, returning the tx hash.
pub async fn send_transaction(
    client: &reqwest::Client,
    url: &str,
    from: &str,
    to: &str,
    data: &str,
) -> Result<String> {
    json_rpc_call(
        client,
        url,
        "eth_sendTransaction",
        vec![serde_json::json!({
            "from": from,
            "to": to,
            "data": data,
            "gas": "0x2dc6c0"
        })],
    )
    .await
}

/// Poll for a transaction's receipt and require success status.
///
/// The dev chain auto-mines, so this normally resolves on the first poll;
/// the backoff only covers nodes configured with a block interval.
pub async fn wait_for_receipt(
    client: &reqwest::Client,
    url: &str,
    tx_hash: &str,
) -> Result<Value> {
    let fetch = || async {
        let receipt: Option<Value> = json_rpc_call(
            client,
            url,
            "eth_getTransactionReceipt",
            vec![serde_json::json!(tx_hash)],
        )
        .await?;
        receipt.ok_or_else(|| anyhow::anyhow!("Receipt for {tx_hash} not yet available"))
    };

    let receipt = fetch
        .retry(
            ExponentialBuilder::default()
                .with_max_delay(Duration::from_secs(2))
                .with_max_times(RECEIPT_POLL_ATTEMPTS),
        )
        .await
        .with_context(|| format!("Transaction {tx_hash} was not mined"))?;

    // Older nodes omit `status`; absence is treated as success.
    if receipt.get("status").and_then(Value::as_str) == Some("0x0") {
        anyhow::bail!("Transaction {tx_hash} reverted");
    }

    Ok(receipt)
}
