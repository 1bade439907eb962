pub mod discovery;
pub mod errors;
pub mod normalize;
pub mod response;
pub mod sources;
pub mod types;

pub use discovery::{find_random_cover_item, Discovery, RetryPolicy};
pub use errors::SourceError;
pub use response::{CoverResponse, ErrorResponse};
pub use sources::{ComicVineClient, CoverSource, JikanClient};
pub use types::{RawRecord, SourceKind};
