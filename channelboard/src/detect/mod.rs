//! Connection inference
//!
//! Role/pad classification, the connection detector itself and net
//! resolution over connection graphs.

pub mod classifier;
pub mod detector;
pub mod nets;

pub use classifier::{classify_role, label_pad, label_pads, ComponentRole, PadLabel};
pub use detector::{clear_auto_detected, ConnectionDetector, DetectionResult, DetectionStats};
pub use nets::NetMap;
