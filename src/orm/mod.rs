pub mod choices;
pub mod questions;
pub mod users;
pub mod votes;
