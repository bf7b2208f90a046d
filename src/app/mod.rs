pub mod outreach_use_case;
pub mod ports;
pub mod stream_use_case;

pub use outreach_use_case::OutreachWriter;
pub use stream_use_case::{stream_outreach, ProgressEvent};
