// Content-authenticity detection — trait-based abstraction for swappable backends.
//
// The DetectionBackend trait defines the interface. The gateway picks one
// backend per modality from config and runs every result through the
// normalizer, so callers always see a well-formed DetectionVerdict.

pub mod gateway;
pub mod hive;
pub mod llm_judge;
pub mod normalize;
pub mod stub;
pub mod traits;
