pub(crate) mod appointment_controller;
pub(crate) mod health_check_controller;
pub(crate) mod info_controller;
pub(crate) mod sse_controller;
