use std::time::Duration;

/// Time bounds of the password-recovery flow.
///
/// A new recovery key may be issued only once `reissue_after` has elapsed
/// since the previous issuance, and an issued key is redeemable for
/// `redeem_within` after issuance. Both are measured on the store clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryWindow {
    reissue_after: Duration,
    redeem_within: Duration,
}

impl RecoveryWindow {
    pub const DEFAULT_REISSUE_AFTER: Duration = Duration::from_secs(60 * 60);
    pub const DEFAULT_REDEEM_WITHIN: Duration = Duration::from_secs(24 * 60 * 60);
    /// Longest interval accepted for either bound. Anything reaching further
    /// back falls outside the store clock's date range.
    pub const MAX: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

    /// Build a window, clamping each bound to [`Self::MAX`].
    #[must_use]
    pub const fn new(reissue_after: Duration, redeem_within: Duration) -> Self {
        Self {
            reissue_after: clamp(reissue_after),
            redeem_within: clamp(redeem_within),
        }
    }

    /// True when `value` would be shortened by [`Self::new`].
    #[must_use]
    pub const fn exceeds_max(value: Duration) -> bool {
        value.as_secs() > Self::MAX.as_secs()
    }

    #[must_use]
    pub const fn reissue_after(&self) -> Duration {
        self.reissue_after
    }

    #[must_use]
    pub const fn redeem_within(&self) -> Duration {
        self.redeem_within
    }
}

const fn clamp(value: Duration) -> Duration {
    if RecoveryWindow::exceeds_max(value) {
        RecoveryWindow::MAX
    } else {
        value
    }
}

impl Default for RecoveryWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_REISSUE_AFTER, Self::DEFAULT_REDEEM_WITHIN)
    }
}
