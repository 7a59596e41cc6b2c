pub mod errors;
pub mod id;
pub mod ocpp_frame;
pub mod shutdown;
pub mod time;
pub mod validations;
