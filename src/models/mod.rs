pub mod analysis;
pub mod document;
pub mod loaders;

pub use analysis::{
    AnalysisResponse, AnalysisResult, CritiqueFragment, Field, FieldExtraction, QuestionSet,
};
pub use document::{Document, Segment};
pub use loaders::{load_all_text_documents, load_text_document, TextSource};
