use lcr_core::annual::AnnualSeries;
use serde::Serialize;

/// A river segment between two reservoirs, the unit of loss allocation.
///
/// `loss` is the reach's allocated evaporation plus corridor loss in
/// acre-feet per year, constant across the modeled period. The headwater
/// placeholder reach has no upper lake and zero loss; it participates in
/// active-user aggregation but is excluded from assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct Reach {
    pub name: String,
    pub upper: Option<String>,
    pub lower: String,
    pub loss: f64,
}

impl Reach {
    pub fn new(name: &str, upper: Option<&str>, lower: &str, loss: f64) -> Self {
        Reach {
            name: name.to_string(),
            upper: upper.map(|s| s.to_string()),
            lower: lower.to_string(),
            loss,
        }
    }

    pub fn is_headwater(&self) -> bool {
        self.upper.is_none()
    }
}

/// Diagnostic water balance for one reach over a model window: the upper
/// lake's release against the lower lake's inflow. The difference is the
/// observed gain or loss across the reach, to be compared against the
/// assessed `loss` constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachBalance {
    pub reach: String,
    pub upper_release: AnnualSeries,
    pub lower_inflow: AnnualSeries,
    pub difference: AnnualSeries,
}
