pub mod profiles;
pub mod score;
