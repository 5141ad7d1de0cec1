//! Cross-validation of LIDW estimates
//!
//! - Point level: each cluster is withheld in turn and predicted from the
//!   raw (unclipped) tessellation of the others.
//! - Zone level: all clusters of a settlement are withheld and the
//!   settlement's pixels re-estimated.
//! - Summary metrics over the resulting records.

mod loocv;
mod metrics;
mod zone_loocv;

pub use loocv::{
    leave_one_out_network, validate_leave_one_out, LeaveOneOutInput, LeaveOneOutNetwork,
    LeaveOneOutValidator, RecordStatus, ValidationParams, ValidationRecord,
};
pub use metrics::{rmsd, DifferenceSummary, ErrorSummary};
pub use zone_loocv::{validate_leave_zone_out, ZoneValidation};

use covmap_core::{Error, Result, SampleLocation};

/// Reject indicators that cannot produce a meaningful estimate.
///
/// Fails when no sample has a finite value or when every finite value is
/// the same.
pub fn check_indicator(code: &str, samples: &[SampleLocation]) -> Result<()> {
    let mut values = samples.iter().map(|s| s.value).filter(|v| v.is_finite());
    let Some(first) = values.next() else {
        return Err(Error::DegenerateIndicator {
            indicator: code.to_string(),
            reason: "no valid samples".into(),
        });
    };
    if values.all(|v| v == first) {
        return Err(Error::DegenerateIndicator {
            indicator: code.to_string(),
            reason: format!("single unique value {}", first),
        });
    }
    Ok(())
}
