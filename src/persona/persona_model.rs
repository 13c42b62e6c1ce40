use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub label: String,
    pub value: String,
}

/// The user's saved profile, sent to the model as suggestion context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonaData {
    pub name: String,
    pub email: String,
    pub dob: String,
    pub gender: String,
    pub role: String,
    pub company: String,
    pub address: String,
    pub phone: String,
    pub bio: String,
    pub custom_fields: Vec<CustomField>,
}

impl PersonaData {
    pub fn is_empty(&self) -> bool {
        *self == PersonaData::default()
    }

    /// Non-empty entries as `(label, value)`, custom fields last.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let fixed = [
            ("Name", self.name.as_str()),
            ("Email", self.email.as_str()),
            ("Date of birth", self.dob.as_str()),
            ("Gender", self.gender.as_str()),
            ("Role", self.role.as_str()),
            ("Company", self.company.as_str()),
            ("Address", self.address.as_str()),
            ("Phone", self.phone.as_str()),
            ("Bio", self.bio.as_str()),
        ];
        fixed
            .into_iter()
            .chain(
                self.custom_fields
                    .iter()
                    .map(|c| (c.label.as_str(), c.value.as_str())),
            )
            .filter(|(_, v)| !v.trim().is_empty())
            .collect()
    }
}
