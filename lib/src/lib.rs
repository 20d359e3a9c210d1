mod batch;
mod codec;
mod downsampler;
mod error;
pub mod lttb;
mod sample;
pub mod stride;
mod threshold;

pub use batch::*;
pub use codec::*;
pub use downsampler::*;
pub use error::*;
pub use sample::*;
pub use threshold::*;
