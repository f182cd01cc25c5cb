//! `opcodec` Core -- codecs, media types, operation descriptors, responses and errors.
//!
//! Everything in this crate is synchronous and free of I/O. The client and
//! server crates share these types so that whatever one side encodes, the other
//! side decodes with the same codec instance.

pub mod codec;
pub mod error;
pub mod media;
pub mod operation;
pub mod params;
pub mod response;

pub use codec::{Chain, Codec};
pub use error::{error_kinds, CodecError, HttpError, PathError, ValidationField};
pub use media::{media_codec, parse_media_type, Body, MediaCodec, MediaContainer, MediaType};
pub use operation::{HttpMethod, Operation, PathTemplate, RequestBodySpec};
pub use params::{
    encode_component, encode_params, encode_query, stringify_params, substitute_path, ParamValue,
    ToParam,
};
pub use response::{ApiResponse, ResponseContent};
