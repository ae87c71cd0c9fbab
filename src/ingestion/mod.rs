pub mod feed_listener;
pub mod normalizer;
pub mod pipeline;

pub use feed_listener::{run_feed_listener, FeedItem};
pub use pipeline::{process_transaction, run_pipeline, PipelineContext};
