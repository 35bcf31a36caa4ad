pub mod llm;
pub mod section;

pub use llm::{GroqExtractor, ReferenceExtraction, parse_llm_references};
pub use section::find_bibliography_section;
