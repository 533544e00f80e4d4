pub mod backup;
pub mod gate;
pub mod logging;
pub mod notification;
