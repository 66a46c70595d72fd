//! In-memory adapters.
//!
//! Back the workflow without a database, for tests and the console driver's
//! `--memory` mode. Tickets and sessions share one session store so that
//! conversion stays atomic.

mod category_catalog;
mod session_repository;
mod ticket_repository;
mod user_directory;

pub use category_catalog::InMemoryCategoryCatalog;
pub use session_repository::InMemorySessionRepository;
pub use ticket_repository::InMemoryTicketRepository;
pub use user_directory::InMemoryUserDirectory;
