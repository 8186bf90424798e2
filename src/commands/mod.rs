pub mod ask;
pub mod brain;
pub mod deploy;
pub mod schema;
pub mod serve;
pub mod train;
