/// Generic header extension; its contents are profile specific and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpHeaderExtension {
    pub profile: u16,
    /// Extension body without its 4-byte header.
    pub data: Vec<u8>,
}
