//! Concurrent url checks used by the source adapters: reachability
//! (TCP + HTTP) and short page descriptions.

pub mod liveness;
pub mod metadata;

pub use liveness::{
    HttpStatusCheck, LivenessProber, LivenessResult, ProbeSettings, ReachabilityCheck,
    StatusCheck, TcpReachability,
};
pub use metadata::{
    extract_description, HttpPageFetcher, MetaResult, MetadataEnricher, PageFetcher,
};
