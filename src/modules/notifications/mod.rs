//! Inbound gateway notifications: signature validation and the HTTP receiver.

pub mod controllers;
pub mod services;

pub use controllers::{configure, LoggingNotificationHandler, NotificationController, NotificationHandler};
pub use services::NotificationValidator;
