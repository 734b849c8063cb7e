pub mod loans;
pub mod pool_state;
pub mod wallet_state;
