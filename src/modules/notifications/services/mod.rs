pub mod validator;

pub use validator::NotificationValidator;
