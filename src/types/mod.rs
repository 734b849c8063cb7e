pub use self::{
    amount_type::{Amount_Pair_Type, Amount_Type},
    horizon_type::{
        Account_Type, Balance_Line_Type, Horizon_Problem_Type,
        Submit_Transaction_Type,
    },
    loan_type::Loan_Type,
    pool_state_type::Pool_State_Type,
    positions_type::Positions_Type,
};

pub mod big_int;

mod amount_type;
mod horizon_type;
mod loan_type;
mod pool_state_type;
mod positions_type;
