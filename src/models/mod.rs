pub mod booking;
pub mod dashboard;
pub mod event;
pub mod image;
pub mod notice;
pub mod session;
pub mod user;
