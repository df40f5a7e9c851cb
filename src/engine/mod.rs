pub mod autoplay;
pub mod error;
pub mod models;
pub mod profiles;
pub mod simulation;
