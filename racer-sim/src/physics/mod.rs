pub mod assist;
pub mod body;
pub mod powertrain;
pub mod suspension;
pub mod tire;
pub mod vehicle;
