/// casetwin — visual case matching with clinical-context re-ranking
///
/// Retrieves the nearest indexed radiology cases for a query image
/// embedding, re-ranks the candidate pool with a weighted fusion of visual
/// similarity and structured clinical overlap, and maps the winners to the
/// external match schema.

pub mod config;
pub mod errors;
pub mod extraction;
pub mod logging;
pub mod profile;
pub mod search;
pub mod store;
