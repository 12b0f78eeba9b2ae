pub mod notify_controller;

pub use notify_controller::{
    alipay_notify, configure, wxpay_notify, LoggingNotificationHandler, NotificationController,
    NotificationHandler,
};
