pub mod captures;
pub mod rules;
pub mod vision;

pub use captures::DirCaptureSource;
pub use rules::load_rules;
pub use vision::CommandVisionBridge;
