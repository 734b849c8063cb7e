use actix_web::{get, web, Responder};
use serde::Serialize;

use crate::{
    configuration::{AppState, State},
    error::Error,
    model::PerCurrency,
};

/// Build and deployment the server talks to.
#[get("/version")]
async fn index(
    state: web::Data<AppState<State>>,
) -> Result<impl Responder, Error> {
    Ok(web::Json(Response {
        version: env!("CARGO_PKG_VERSION"),
        network: state.config.network.as_str(),
        loan_manager: state.manager.contract_id().to_owned(),
        pools: PerCurrency::from_fn(|ticker| {
            state.bindings.get(ticker).contract_id.to_owned()
        }),
    }))
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub version: &'static str,
    pub network: &'static str,
    pub loan_manager: String,
    pub pools: PerCurrency<String>,
}
