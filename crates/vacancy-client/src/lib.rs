pub mod extractors;
pub mod fetcher;
pub mod registry;
pub mod sink;

pub use fetcher::ReqwestFetcher;
pub use registry::{
    ExtractorKind, SourceSpec, build_sources, default_sources, load_sources, parse_sources,
};
pub use sink::{FsSink, StdoutSink};
