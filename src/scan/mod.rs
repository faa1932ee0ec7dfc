pub mod archive;
pub mod buffer;
pub mod controller;
pub mod live_view;
pub mod record;

pub use archive::Archive;
pub use buffer::{RawSample, ScanBuffer};
pub use controller::{commanded_positions, ScanController, ScanPhase, FAST_SAMPLE_PERIOD};
pub use live_view::{CollectingView, LiveView, LogView, NullView};
pub use record::{assemble, ScanRecord};
