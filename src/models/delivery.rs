use serde::{Deserialize, Serialize};

/// Next delivery dates for one postal code, as returned by PostNord.
///
/// `delivery` and `upcoming` are Swedish date labels such as "14 oktober, 2025".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryEstimate {
    pub postal_code: String,
    pub city: String,
    pub delivery: String,
    pub upcoming: String,
}
