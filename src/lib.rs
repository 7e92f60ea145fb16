//! Trackzer core: IMEI validation and place resolution for lost and stolen
//! phone reports in Cameroon.

pub mod imei;
pub mod location;
pub mod logging;
pub mod server;
pub mod validation;
