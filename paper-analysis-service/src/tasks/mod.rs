pub mod identifiers;
pub mod judge;
pub mod references;
pub mod resolver;
pub mod sections;
pub mod summarize;
pub mod utils;

pub use identifiers::normalize_identifier;
pub use judge::evaluate;
pub use references::{parse_citation_list, parse_references};
pub use resolver::resolve;
pub use sections::{SectionOutcome, extract_abstract, extract_references};
pub use summarize::{assess_novelty, summarize};
