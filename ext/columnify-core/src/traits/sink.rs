use crate::record::TransportValue;
use crate::Result;

/// Destination for converted records
///
/// A conversion session owns exactly one sink and finalizes it at most once.
pub trait RecordSink {
    /// Append one record
    fn write(&mut self, value: &TransportValue) -> Result<()>;

    /// Running byte count of everything accepted so far
    ///
    /// Never decreases; the session measures each input as the difference
    /// before and after writing it.
    fn size(&self) -> u64;

    /// Flush buffered rows, write trailing metadata and release the output
    fn finalize(self) -> Result<()>
    where
        Self: Sized;
}
