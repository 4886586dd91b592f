pub mod extract;
pub mod keywords;
pub mod legacy_doc;
pub mod normalize;
pub mod persist;
pub mod types;
pub mod vocab;

pub use types::{DocumentRef, TermDictionary};
pub use vocab::{CorpusInverseVocabulary, CorpusVocabulary};
