pub mod confirmation;
pub mod response;
