mod bits;
mod build;
mod decode;
mod registers;
pub mod registry;
mod request;
mod response;
mod validate;

pub use build::build_request;
pub use decode::decode_response;
pub use registry::{DataFlavor, FunctionMetadata};
pub use request::Request;
pub use response::{ResponseData, ResponseEnvelope};
