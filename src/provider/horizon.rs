use std::{future::Future, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header::CONTENT_TYPE, Client, Response};
use tracing::{error, info};
use url::{form_urlencoded, Url};

use crate::{
    error::Error,
    types::{
        Account_Type, Balance_Line_Type, Horizon_Problem_Type,
        Submit_Transaction_Type,
    },
};

/// Submits signed classic transactions.
pub trait TransactionSubmitter: Send + Sync {
    fn submit_transaction(
        &self,
        xdr: &str,
    ) -> impl Future<Output = Result<Submit_Transaction_Type, Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct Horizon {
    pub url: Url,
    pub http: Client,
}

impl Horizon {
    pub fn new(horizon_url: &str, timeout: u64) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(Horizon {
            url: base_url(horizon_url)?,
            http,
        })
    }

    pub fn account_url(&self, address: &str) -> Result<Url, Error> {
        Ok(self.url.join(&format!("accounts/{}", address))?)
    }

    pub fn transactions_url(&self) -> Result<Url, Error> {
        Ok(self.url.join("transactions")?)
    }

    pub async fn load_account(&self, address: &str) -> Result<Account_Type, Error> {
        let url = self.account_url(address)?;
        info!("{}", &url);

        let response = self.http.get(url).send().await?;
        let response = Self::check(response).await?;

        Ok(response.json::<Account_Type>().await?)
    }

    pub async fn get_balances(
        &self,
        address: &str,
    ) -> Result<Vec<Balance_Line_Type>, Error> {
        let Account_Type { balances, .. } = self.load_account(address).await?;
        Ok(balances)
    }

    async fn check(response: Response) -> Result<Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await?;
        let message = problem_message(&text)
            .unwrap_or_else(|| format!("{}: {}", status, text));

        error!("Horizon request failed: {}", &message);

        Err(Error::Horizon(message))
    }
}

impl TransactionSubmitter for Horizon {
    async fn submit_transaction(
        &self,
        xdr: &str,
    ) -> Result<Submit_Transaction_Type, Error> {
        check_envelope(xdr)?;

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("tx", xdr)
            .finish();

        let response = self
            .http
            .post(self.transactions_url()?)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let result = response.json::<Submit_Transaction_Type>().await?;

        info!("transaction {} submitted", &result.hash);

        Ok(result)
    }
}

/// Signed envelopes are base64 encoded XDR.
pub fn check_envelope(xdr: &str) -> Result<(), Error> {
    let bytes = STANDARD.decode(xdr.trim())?;
    if bytes.is_empty() {
        return Err(Error::Horizon(String::from("empty transaction envelope")));
    }
    Ok(())
}

/// `Url::join` drops the last path segment unless it ends with a slash.
fn base_url(value: &str) -> Result<Url, Error> {
    if value.ends_with('/') {
        return Ok(Url::parse(value)?);
    }

    Ok(Url::parse(&format!("{}/", value))?)
}

/// Readable summary of a Horizon problem document, including the
/// transaction result codes when present.
pub fn problem_message(body: &str) -> Option<String> {
    let problem = serde_json::from_str::<Horizon_Problem_Type>(body).ok()?;

    let codes = problem
        .extras
        .as_ref()
        .and_then(|extras| extras.get("result_codes"))
        .map(|codes| codes.to_string());

    let message = match (problem.detail, codes) {
        (_, Some(codes)) => format!("{} ({}) {}", problem.title, problem.status, codes),
        (Some(detail), None) => format!("{} ({}) {}", problem.title, problem.status, detail),
        (None, None) => format!("{} ({})", problem.title, problem.status),
    };

    Some(message)
}
