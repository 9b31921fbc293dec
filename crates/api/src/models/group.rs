//! Figure line (group) domain type.

use serde::Serialize;

use curio_core::GroupId;

/// A figure line or franchise grouping products, e.g. a blind-box series.
///
/// Deleting a group does not delete its products; they just become ungrouped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub logo_image_url: Option<String>,
}
