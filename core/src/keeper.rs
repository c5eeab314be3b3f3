use chrono::DateTime;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::error::KeeperError;

pub type KeeperId = String;

/// A person's stewardship of a direction, active or historical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Keeper {
    pub id: KeeperId,
    pub uuid: String,
    pub direction: String,
    pub is_active: bool,
    /// Actor that granted the record, or revoked it once inactive.
    pub from_uuid: String,
    pub created_at: DateTime<Utc>,
}

impl Keeper {
    pub fn new_active(request: &KeeperRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            uuid: request.uuid.clone(),
            direction: request.direction.clone(),
            is_active: true,
            from_uuid: request.from_uuid.clone(),
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeeperRequest {
    pub from_uuid: String,
    pub uuid: String,
    pub direction: String,
}

impl KeeperRequest {
    /// Trims every field and rejects the request if one of them is blank.
    pub fn normalized(&self) -> Result<Self, KeeperError> {
        Ok(Self {
            from_uuid: require_field("fromUuid", &self.from_uuid)?,
            uuid: require_field("uuid", &self.uuid)?,
            direction: require_field("direction", &self.direction)?,
        })
    }
}

pub(crate) fn require_field(field: &'static str, value: &str) -> Result<String, KeeperError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(KeeperError::Validation { field });
    }
    Ok(trimmed.to_string())
}

pub fn keeper_schema() -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(schemars::schema_for!(Keeper))
}

pub fn keeper_request_schema() -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(schemars::schema_for!(KeeperRequest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn request(from_uuid: &str, uuid: &str, direction: &str) -> KeeperRequest {
        KeeperRequest {
            from_uuid: from_uuid.to_string(),
            uuid: uuid.to_string(),
            direction: direction.to_string(),
        }
    }

    #[test]
    fn normalized_trims_fields() {
        let normalized = request(" max ", "asdqwe\t", "  teems")
            .normalized()
            .expect("request should be valid");
        assert_eq!(normalized, request("max", "asdqwe", "teems"));
    }

    #[test]
    fn normalized_reports_first_blank_field() {
        assert_matches!(
            request("", "", "teems").normalized(),
            Err(KeeperError::Validation { field: "fromUuid" })
        );
        assert_matches!(
            request("max", "asdqwe", "   ").normalized(),
            Err(KeeperError::Validation { field: "direction" })
        );
    }

    #[test]
    fn keeper_serializes_with_camel_case_fields() {
        let keeper = Keeper::new_active(&request("max", "asdqwe", "teems"), Utc::now());
        let value = serde_json::to_value(&keeper).expect("keeper should serialize");
        assert_eq!(value["isActive"], serde_json::Value::Bool(true));
        assert_eq!(value["fromUuid"], "max");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn schema_includes_record_fields() {
        let schema = keeper_schema().expect("schema should serialize");
        let properties = schema
            .get("properties")
            .and_then(serde_json::Value::as_object)
            .expect("schema should include properties");
        assert!(properties.contains_key("isActive"));
        assert!(properties.contains_key("direction"));
    }
}
