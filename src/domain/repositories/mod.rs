pub mod addon_credits;
pub mod payment_transactions;
pub mod subscriptions;
pub mod wallet_transactions;
