pub mod amount;
pub mod api;
pub mod comment;
pub mod identity;
pub mod leaderboard;
pub mod ledger;
pub mod notification;
pub mod post;
pub mod tip;
pub mod user;
pub mod wallet;
