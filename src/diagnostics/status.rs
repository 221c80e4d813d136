//! Snapshot of queue depths for the periodic status report.

use std::fmt;

/// Queue depths and weight of one proxy at a point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Local end of the link.
    pub from: String,
    /// Remote end of the link.
    pub to: String,
    /// Frames waiting for the transport to pick them up.
    pub transport_out: usize,
    /// Frames the transport has handed over but the in-pump has not moved.
    pub transport_in: usize,
    /// Frames waiting for the out-pump.
    pub app_out: usize,
    /// Frames waiting for `receive`.
    pub app_in: usize,
    /// Completed messages not yet handed out.
    pub delivered: usize,
    /// Advisory connection count.
    pub weight: usize,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Periodic Status Report ({} -> {})", self.from, self.to)?;
        writeln!(f, "      TransportOutQueue      {}", self.transport_out)?;
        writeln!(f, "      TransportInQueue       {}", self.transport_in)?;
        writeln!(f, "      AppOutQueue            {}", self.app_out)?;
        writeln!(f, "      AppInQueue             {}", self.app_in)?;
        writeln!(f, "      Delivered              {}", self.delivered)?;
        write!(f, "      Weight                 {}", self.weight)
    }
}
