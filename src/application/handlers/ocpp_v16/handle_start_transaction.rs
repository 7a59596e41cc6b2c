//! StartTransaction handler

use serde_json::Value;
use tracing::info;

use crate::application::handlers::OcppHandler;
use crate::domain::ocpp::messages::{
    accepted_id_tag, to_payload, FromPayload, Payload, StartTransactionRequest,
    StartTransactionResponse,
};
use crate::support::errors::HandlerError;

/// Registers the transaction before the response is built, so the entry is
/// visible to any later message on any connection.
pub fn handle_start_transaction(
    handler: &OcppHandler,
    payload: &Payload,
) -> Result<Value, HandlerError> {
    let req = StartTransactionRequest::from_payload(payload)?;

    let transaction_id = handler
        .registry
        .start(
            &handler.charge_point_id,
            req.connector_id,
            &req.id_tag,
            req.meter_start,
        )
        .ok_or(HandlerError::TransactionIdsExhausted)?;
    metrics::gauge!("ocpp_active_transactions").set(handler.registry.len() as f64);

    info!(
        charge_point_id = handler.charge_point_id.as_str(),
        transaction_id,
        connector_id = req.connector_id,
        id_tag = req.id_tag.as_str(),
        meter_start = req.meter_start,
        "StartTransaction"
    );

    let response = StartTransactionResponse {
        transaction_id,
        id_tag_info: accepted_id_tag(),
    };
    Ok(Value::Object(to_payload(&response)))
}
