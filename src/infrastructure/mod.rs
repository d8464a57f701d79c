//! Infrastructure layer: storage implementations and DI container
//!
//! This layer implements the I/O boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod error_ext;
pub mod memory;
pub mod store;
pub mod traits;

pub use di::ServiceContainer;
pub use error::{IdentityField, InfraError, InfraResult, RepositoryError, RepositoryResult};
pub use error_ext::IoResultExt;
pub use memory::InMemoryMemberRepository;
pub use store::JsonMemberStore;
pub use traits::{FileSystem, MemberRepository, RealFileSystem};
