/// A `t=` block with the `r=` and `z=` lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeDesc {
    pub start: u64,
    pub stop: u64,
    pub repeats: Vec<String>,
    pub zone: Option<String>,
}

impl TimeDesc {
    #[must_use]
    pub const fn new(start: u64, stop: u64) -> Self {
        Self {
            start,
            stop,
            repeats: Vec::new(),
            zone: None,
        }
    }

    /// `t=0 0` means the session is unbounded.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.start == 0 && self.stop == 0
    }
}
