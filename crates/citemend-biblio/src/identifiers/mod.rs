pub mod doi;
pub mod extract;
pub mod isbn;

pub use doi::Doi;
pub use extract::{ExtractedIdentifiers, extract_identifiers};
pub use isbn::Isbn;
