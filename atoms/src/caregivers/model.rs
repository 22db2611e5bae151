use serde::{Deserialize, Serialize};

/// Roster entry as the upstream on-call service returns it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct OnCallCaregiver {
    #[serde(rename = "EmployeeID")]
    pub employee_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: String,
}

impl OnCallCaregiver {
    /// Display name, as recorded on shifts
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Map a roster pick (an EmployeeID) to the name shifts carry.
/// None when the selection isn't an id on this roster.
pub fn resolve_caregiver_name(selection: &str, roster: &[OnCallCaregiver]) -> Option<String> {
    let employee_id: i64 = selection.trim().parse().ok()?;
    roster
        .iter()
        .find(|c| c.employee_id == employee_id)
        .map(OnCallCaregiver::full_name)
}
