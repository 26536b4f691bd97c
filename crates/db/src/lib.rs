pub mod connection;
pub mod migrations;
pub mod procedures;
pub mod repositories;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use procedures::SqlLocationProcedure;
pub use repositories::{
    InMemoryConfirmationRepository, InMemoryPickRepository, RepositoryError,
    SqlMoConfirmationRepository, SqlPickConfirmationRepository, SqlRmaConfirmationRepository,
    SqlTransactionLog,
};
