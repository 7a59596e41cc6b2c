//! StopTransaction handler

use serde_json::Value;
use tracing::info;

use crate::application::handlers::OcppHandler;
use crate::domain::ocpp::messages::{
    accepted_id_tag, to_payload, FromPayload, Payload, StopTransactionRequest,
    StopTransactionResponse,
};
use crate::support::errors::HandlerError;

/// Stopping an unknown transaction is still accepted.
pub fn handle_stop_transaction(
    handler: &OcppHandler,
    payload: &Payload,
) -> Result<Value, HandlerError> {
    let req = StopTransactionRequest::from_payload(payload)?;

    let closed = handler.registry.stop(req.transaction_id);
    metrics::gauge!("ocpp_active_transactions").set(handler.registry.len() as f64);

    info!(
        charge_point_id = handler.charge_point_id.as_str(),
        transaction_id = req.transaction_id,
        meter_stop = req.meter_stop,
        energy_wh = closed.as_ref().map(|tx| tx.energy_consumed(req.meter_stop)),
        reason = req.reason.as_deref().unwrap_or("-"),
        "StopTransaction"
    );

    let response = StopTransactionResponse {
        id_tag_info: Some(accepted_id_tag()),
    };
    Ok(Value::Object(to_payload(&response)))
}
