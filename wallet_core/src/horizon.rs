//! HTTP client for the ledger's REST API.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use custody_transactions::{Asset, SignedEnvelope};
use custody_types::{Amount, TxHash, WalletAddress};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::LedgerConfig;
use crate::gateway::{
    Account, AccountGateway, Balance, ClaimableBalance, GatewayError, OperationRecord,
    SubmissionOutcome, SubmitError, Submitter,
};

/// Talks to one ledger API endpoint. Cheap to clone; clones share the
/// connection pool.
#[derive(Clone)]
pub struct HorizonClient {
    http: reqwest::Client,
    base_url: String,
}

impl HorizonClient {
    pub fn new(config: &LedgerConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.horizon_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        subject: &str,
    ) -> Result<T, GatewayError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| GatewayError::Network(describe_transport_error(&e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(GatewayError::NotFound(subject.to_string())),
            status if !status.is_success() => {
                return Err(GatewayError::Network(format!("ledger returned HTTP {status}")))
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("{path}: {e}")))
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        format!("request failed: {e}")
    }
}

#[derive(Deserialize)]
struct AccountResponse {
    account_id: String,
    sequence: String,
    #[serde(default)]
    balances: Vec<BalanceResponse>,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: String,
    asset_type: String,
    #[serde(default)]
    asset_code: Option<String>,
    #[serde(default)]
    asset_issuer: Option<String>,
}

impl BalanceResponse {
    /// `None` for entries that are not plain assets (pool shares).
    fn into_balance(self) -> Option<Result<Balance, GatewayError>> {
        let asset = match (self.asset_type.as_str(), self.asset_code, self.asset_issuer) {
            ("native", _, _) => Ok(Asset::Native),
            ("credit_alphanum4" | "credit_alphanum12", Some(code), Some(issuer)) => {
                Asset::credit(&code, &issuer).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
            }
            _ => return None,
        };
        Some(asset.and_then(|asset| {
            let balance = Amount::parse(&self.balance)
                .map_err(|e| GatewayError::InvalidResponse(format!("balance: {e}")))?;
            Ok(Balance { asset, balance })
        }))
    }
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    hash: String,
    #[serde(default = "default_true")]
    successful: bool,
    result_xdr: String,
}

fn default_true() -> bool {
    true
}

/// Problem document returned with 4xx/5xx statuses.
#[derive(Deserialize, Default)]
struct Problem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Deserialize, Default)]
struct ProblemExtras {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    result_xdr: Option<String>,
}

fn decode_result_xdr(encoded: &str) -> Result<Vec<u8>, SubmitError> {
    BASE64
        .decode(encoded)
        .map_err(|e| SubmitError::InvalidResponse(format!("result_xdr is not base64: {e}")))
}

fn reported_hash(reported: Option<&str>, expected: TxHash) -> TxHash {
    match reported.map(TxHash::from_hex) {
        Some(Some(hash)) if hash == expected => hash,
        Some(Some(hash)) => {
            warn!(%hash, %expected, "ledger reported a different transaction hash");
            hash
        }
        _ => expected,
    }
}

#[async_trait]
impl AccountGateway for HorizonClient {
    async fn fetch_account(&self, address: &WalletAddress) -> Result<Account, GatewayError> {
        let path = format!("/accounts/{address}");
        let raw: AccountResponse = self.get_json(&path, &[], address.as_str()).await?;

        let sequence = raw
            .sequence
            .parse::<i64>()
            .map_err(|e| GatewayError::InvalidResponse(format!("sequence {:?}: {e}", raw.sequence)))?;
        let balances = raw
            .balances
            .into_iter()
            .filter_map(BalanceResponse::into_balance)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(account = %raw.account_id, sequence, "fetched account");
        Ok(Account {
            address: WalletAddress::new(raw.account_id),
            sequence,
            balances,
        })
    }

    async fn fetch_claimable_balances(
        &self,
        claimant: &WalletAddress,
        limit: u32,
    ) -> Result<Vec<ClaimableBalance>, GatewayError> {
        let query = [
            ("claimant", claimant.to_string()),
            ("limit", limit.to_string()),
        ];
        let page: Page<ClaimableBalance> = self
            .get_json("/claimable_balances", &query, claimant.as_str())
            .await?;
        Ok(page.embedded.records)
    }

    async fn fetch_operation_history(
        &self,
        address: &WalletAddress,
        limit: u32,
    ) -> Result<Vec<OperationRecord>, GatewayError> {
        let path = format!("/accounts/{address}/operations");
        let query = [("limit", limit.to_string()), ("order", "desc".to_string())];
        let page: Page<OperationRecord> = self.get_json(&path, &query, address.as_str()).await?;
        Ok(page.embedded.records)
    }
}

#[async_trait]
impl Submitter for HorizonClient {
    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmissionOutcome, SubmitError> {
        let url = format!("{}/transactions", self.base_url);
        let response = self
            .http
            .post(&url)
            .form(&[("tx", envelope.to_base64())])
            .send()
            .await
            .map_err(|e| SubmitError::Network(describe_transport_error(&e)))?;

        let status = response.status();
        if status.is_success() {
            let body: SubmitResponse = response
                .json()
                .await
                .map_err(|e| SubmitError::InvalidResponse(e.to_string()))?;
            return Ok(SubmissionOutcome {
                hash: reported_hash(Some(body.hash.as_str()), envelope.hash()),
                successful: body.successful,
                result_xdr: decode_result_xdr(&body.result_xdr)?,
            });
        }

        if status.is_server_error() {
            // Includes 504: the ledger may still apply the transaction.
            return Err(SubmitError::Network(format!("ledger returned HTTP {status}")));
        }

        let problem: Problem = response.json().await.unwrap_or_default();
        let extras = problem.extras.unwrap_or_default();
        match extras.result_xdr {
            Some(encoded) if status == StatusCode::BAD_REQUEST => {
                Err(SubmitError::Rejected(SubmissionOutcome {
                    hash: reported_hash(extras.hash.as_deref(), envelope.hash()),
                    successful: false,
                    result_xdr: decode_result_xdr(&encoded)?,
                }))
            }
            _ => Err(SubmitError::Refused {
                status: status.as_u16(),
                detail: if problem.detail.is_empty() {
                    problem.title
                } else {
                    problem.detail
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::{get, post};
    use axum::Router;
    use custody_crypto::{derive_address, keypair_from_seed};
    use custody_transactions::{
        build, sign, Operation, OperationResult, PaymentResultCode, SourceAccount, ToXdr,
        TransactionParams, TransactionResult, TransactionResultCode,
    };
    use custody_types::NetworkId;
    use serde_json::json;

    use crate::balance::BASE_FEE;

    // -- mock ledger ---------------------------------------------------------

    const ME: &str = "GCFIRY65OQE7DFP5KLNS2PF2LVZMUZYJX4OZIEQ36N2IQANUB5XVYOJR";

    fn config_for(base_url: String) -> LedgerConfig {
        let mut config = LedgerConfig::new(NetworkId::Testnet, base_url, "Pi Testnet");
        config.request_timeout_secs = 1;
        config.connect_timeout_secs = 1;
        config
    }

    /// Serve `router` on an ephemeral local port and point a client at it.
    async fn client_for(router: Router) -> HorizonClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        HorizonClient::new(&config_for(format!("http://{addr}"))).unwrap()
    }

    /// A ledger whose submit endpoint always answers `status` with `body`.
    async fn submit_answering(status: StatusCode, body: String) -> HorizonClient {
        client_for(Router::new().route("/transactions", post(move || async move { (status, body) })))
            .await
    }

    fn envelope() -> SignedEnvelope {
        let key = keypair_from_seed(&[1u8; 32]);
        let source = SourceAccount {
            address: derive_address(&key.public),
            sequence: 41,
        };
        let destination = derive_address(&keypair_from_seed(&[2u8; 32]).public);
        let params = TransactionParams::new(
            source,
            vec![Operation::payment(destination.to_string(), Amount::new(10_000_000))],
            BASE_FEE,
        );
        sign(build(params).unwrap(), &key, "Pi Testnet").unwrap()
    }

    fn bad_seq_xdr() -> Vec<u8> {
        TransactionResult::failed(100, TransactionResultCode::BadSeq).to_xdr()
    }

    // -- submit status mapping -----------------------------------------------

    #[tokio::test]
    async fn accepted_submission_returns_outcome() {
        let env = envelope();
        let raw = TransactionResult::success(
            1_000_000,
            vec![OperationResult::payment(PaymentResultCode::Success)],
        )
        .to_xdr();
        let body = json!({
            "hash": env.hash().to_hex(),
            "successful": true,
            "result_xdr": BASE64.encode(&raw),
        });
        let client = submit_answering(StatusCode::OK, body.to_string()).await;

        let outcome = client.submit(&env).await.unwrap();
        assert_eq!(outcome.hash, env.hash());
        assert!(outcome.successful);
        assert_eq!(outcome.result_xdr, raw);
    }

    #[tokio::test]
    async fn bad_request_with_result_payload_is_a_rejection() {
        let env = envelope();
        let body = json!({
            "title": "Transaction Failed",
            "status": 400,
            "extras": {
                "result_codes": {"transaction": "tx_bad_seq"},
                "result_xdr": BASE64.encode(bad_seq_xdr()),
            }
        });
        let client = submit_answering(StatusCode::BAD_REQUEST, body.to_string()).await;

        match client.submit(&env).await {
            Err(SubmitError::Rejected(outcome)) => {
                assert_eq!(outcome.hash, env.hash());
                assert!(!outcome.successful);
                assert_eq!(outcome.result_xdr, bad_seq_xdr());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_request_without_result_payload_is_a_refusal() {
        let body = json!({
            "title": "Transaction Malformed",
            "status": 400,
            "detail": "envelope could not be decoded",
        });
        let client = submit_answering(StatusCode::BAD_REQUEST, body.to_string()).await;

        assert_eq!(
            client.submit(&envelope()).await,
            Err(SubmitError::Refused {
                status: 400,
                detail: "envelope could not be decoded".into(),
            })
        );
    }

    #[tokio::test]
    async fn rate_limit_is_a_refusal_even_with_a_result_payload() {
        let body = json!({
            "title": "Rate Limit Exceeded",
            "status": 429,
            "extras": {"result_xdr": BASE64.encode(bad_seq_xdr())},
        });
        let client = submit_answering(StatusCode::TOO_MANY_REQUESTS, body.to_string()).await;

        assert_eq!(
            client.submit(&envelope()).await,
            Err(SubmitError::Refused {
                status: 429,
                detail: "Rate Limit Exceeded".into(),
            })
        );
    }

    #[tokio::test]
    async fn server_errors_leave_the_outcome_unknown() {
        for status in [StatusCode::GATEWAY_TIMEOUT, StatusCode::INTERNAL_SERVER_ERROR] {
            // Even a rejection-shaped body must not turn a 5xx into a rejection.
            let body = json!({"extras": {"result_xdr": BASE64.encode(bad_seq_xdr())}});
            let client = submit_answering(status, body.to_string()).await;
            assert!(
                matches!(client.submit(&envelope()).await, Err(SubmitError::Network(_))),
                "{status}"
            );
        }
    }

    #[tokio::test]
    async fn slow_ledger_times_out_with_unknown_outcome() {
        let router = Router::new().route(
            "/transactions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let client = client_for(router).await;

        match client.submit(&envelope()).await {
            Err(SubmitError::Network(detail)) => assert!(detail.contains("timed out"), "{detail}"),
            other => panic!("expected unknown outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_ledger_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = HorizonClient::new(&config_for(format!("http://{addr}"))).unwrap();

        assert!(matches!(
            client.submit(&envelope()).await,
            Err(SubmitError::Network(_))
        ));
        assert!(matches!(
            client.fetch_account(&WalletAddress::new(ME)).await,
            Err(GatewayError::Network(_))
        ));
    }

    #[tokio::test]
    async fn malformed_success_body_is_an_invalid_response() {
        let client = submit_answering(StatusCode::OK, "{\"hash\": 7}".into()).await;
        assert!(matches!(
            client.submit(&envelope()).await,
            Err(SubmitError::InvalidResponse(_))
        ));
    }

    // -- read status mapping -------------------------------------------------

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let client = client_for(Router::new().route(
            "/accounts/:address",
            get(|| async { (StatusCode::NOT_FOUND, "{\"status\": 404}") }),
        ))
        .await;

        assert_eq!(
            client.fetch_account(&WalletAddress::new(ME)).await,
            Err(GatewayError::NotFound(ME.into()))
        );
    }

    #[tokio::test]
    async fn read_server_error_is_a_network_error() {
        let client = client_for(Router::new().route(
            "/accounts/:address",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;

        assert!(matches!(
            client.fetch_account(&WalletAddress::new(ME)).await,
            Err(GatewayError::Network(_))
        ));
    }

    #[tokio::test]
    async fn account_is_fetched_and_parsed() {
        let body = json!({
            "account_id": ME,
            "sequence": "4294967296",
            "balances": [{"balance": "12.5000000", "asset_type": "native"}],
        });
        let client = client_for(Router::new().route(
            "/accounts/:address",
            get(move || async move { (StatusCode::OK, body.to_string()) }),
        ))
        .await;

        let account = client.fetch_account(&WalletAddress::new(ME)).await.unwrap();
        assert_eq!(account.sequence, 4_294_967_296);
        assert_eq!(account.native_balance(), Some(Amount::new(125_000_000)));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let config = LedgerConfig::new(NetworkId::Testnet, "https://api.testnet.minepi.com/", "Pi Testnet");
        let client = HorizonClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://api.testnet.minepi.com");
    }

    #[test]
    fn account_balances_skip_pool_shares() {
        let raw: AccountResponse = serde_json::from_str(
            r#"{
                "id": "GCFIRY65OQE7DFP5KLNS2PF2LVZMUZYJX4OZIEQ36N2IQANUB5XVYOJR",
                "account_id": "GCFIRY65OQE7DFP5KLNS2PF2LVZMUZYJX4OZIEQ36N2IQANUB5XVYOJR",
                "sequence": "4294967296",
                "balances": [
                    {"balance": "3.5000000", "asset_type": "liquidity_pool_shares", "liquidity_pool_id": "ab"},
                    {"balance": "100.0000000", "asset_type": "native"}
                ]
            }"#,
        )
        .unwrap();
        let balances: Vec<Balance> = raw
            .balances
            .into_iter()
            .filter_map(BalanceResponse::into_balance)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].balance, Amount::new(1_000_000_000));
    }

    #[test]
    fn malformed_balance_is_an_invalid_response() {
        let entry = BalanceResponse {
            balance: "lots".into(),
            asset_type: "native".into(),
            asset_code: None,
            asset_issuer: None,
        };
        assert!(matches!(
            entry.into_balance(),
            Some(Err(GatewayError::InvalidResponse(_)))
        ));
    }

    #[test]
    fn rejection_problem_document_parses() {
        let problem: Problem = serde_json::from_str(
            r#"{
                "type": "https://stellar.org/horizon-errors/transaction_failed",
                "title": "Transaction Failed",
                "status": 400,
                "extras": {
                    "envelope_xdr": "AAAA",
                    "result_codes": {"transaction": "tx_bad_seq"},
                    "result_xdr": "AAAAAAAAAAD////7AAAAAA=="
                }
            }"#,
        )
        .unwrap();
        let extras = problem.extras.unwrap();
        let raw = decode_result_xdr(extras.result_xdr.as_deref().unwrap()).unwrap();
        assert_eq!(raw.len(), 16);
        assert_eq!(problem.title, "Transaction Failed");
    }

    #[test]
    fn reported_hash_falls_back_to_local_hash() {
        let local = TxHash::new([1u8; 32]);
        assert_eq!(reported_hash(None, local), local);
        assert_eq!(reported_hash(Some("zz"), local), local);
        assert_eq!(reported_hash(Some(&local.to_hex()), local), local);
    }
}
