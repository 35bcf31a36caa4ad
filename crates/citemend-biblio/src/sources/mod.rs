//! Registry clients. Every source here is a read-only, unauthenticated HTTP
//! collaborator; callers in `enrichment::verify` absorb all failures.

pub mod crossref;
pub mod doi_org;
pub mod openlibrary;

pub use crossref::CrossRefSource;
pub use doi_org::DoiOrgResolver;
pub use openlibrary::OpenLibrarySource;
