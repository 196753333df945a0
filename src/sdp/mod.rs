//! Session descriptions (RFC 4566) as returned by `DESCRIBE`.
pub mod addr_type;
pub mod attribute;
pub mod bandwidth;
pub mod connection;
pub mod media;
pub mod origin;
pub mod sdp_error;
pub mod session;
pub mod time_desc;

pub use addr_type::AddrType;
pub use attribute::Attribute;
pub use bandwidth::Bandwidth;
pub use connection::Connection;
pub use media::{Media, MediaKind, RtpMap};
pub use origin::Origin;
pub use sdp_error::SdpError;
pub use session::{NptRange, Sdp};
pub use time_desc::TimeDesc;
