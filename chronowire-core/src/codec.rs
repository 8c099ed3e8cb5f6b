//! Temporal codec seam.

use chrono::{DateTime, Utc};

use crate::{CodecResult, PgType, TemporalKind, WireParam, Zone};

/// Converts between in-memory instants and wire text, given a resolved zone.
///
/// Implementations are stateless: the same inputs always produce the same
/// output. Choosing the zone is the caller's job.
pub trait TemporalCodec: Send + Sync {
    /// Encode `instant` as a `kind` parameter, using `zone` for the wall clock.
    fn encode(&self, kind: TemporalKind, instant: &DateTime<Utc>, zone: &Zone)
        -> CodecResult<WireParam>;

    /// Decode a `column_type` value as `kind`, reading wall clocks in `zone`.
    fn decode(
        &self,
        kind: TemporalKind,
        column_type: PgType,
        bytes: &[u8],
        zone: &Zone,
    ) -> CodecResult<DateTime<Utc>>;
}
