mod body_getter;
mod page;

pub use body_getter::{BodyGetter, FetchError};
pub use page::{Fetcher, HtmlFetcher, ParsedPage};
