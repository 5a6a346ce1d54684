//! Web search and crawling.
//!
//! The two external collaborators of the research loop: a search backend
//! that returns ranked results per query, and a crawler that turns result
//! URLs into readable page text. Both are trait seams so the loop can be
//! driven in tests without network access.

pub mod crawl;
pub mod search;

pub use crawl::{CrawlBatch, CrawlOutcome, CrawlProvider, HttpCrawler};
pub use search::{SearchProvider, SearchResponse, SearchResult, SerperSearch};
