mod query_result;
mod source_excerpt;
mod upload_result;

pub use query_result::QueryResult;
pub use source_excerpt::{SourceExcerpt, SourceExcerptBuilder};
pub use upload_result::UploadResult;
