use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditActionType {
    Grant,
    Revoke,
}

/// One line of `audit.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditAction {
    pub timestamp: i64,
    pub actor: String,
    pub action_type: AuditActionType,
    pub direction: String,
    pub target: String,
    pub keeper_id: String,
}
