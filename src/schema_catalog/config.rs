//! Declarative schema description loaded from YAML.
//!
//! The configuration maps graph vocabulary onto workspace tables:
//!
//! ```yaml
//! graph:
//!   nodes:
//!     - label: User
//!       table: IdentityInfo
//!       node_id: AccountObjectId
//!       time_column: TimeGenerated
//!       base_rows: 50000
//!       properties:
//!         name: { column: AccountDisplayName, type: string }
//!         age: { column: AccountAgeDays, type: integer }
//!   relationships:
//!     - type: KNOWS
//!       from: User
//!       to: User
//!       table: UserPeerEvents
//!       source_column: SourceAccountId
//!       target_column: TargetAccountId
//!       strength: strong
//!   tables:
//!     - name: IdentityInfo
//!       columns:
//!         - { name: AccountObjectId, type: guid, required: true }
//!         - { name: AccountDisplayName, type: string }
//! ```
//!
//! This is only the serde surface; [`super::SchemaCatalog`] compiles it
//! into indexed, immutable form.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::CatalogError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub graph: GraphDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDefinition {
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,

    #[serde(default)]
    pub relationships: Vec<RelationshipDefinition>,

    #[serde(default)]
    pub tables: Vec<TableDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Node label in the graph
    pub label: String,

    /// Source workspace table
    pub table: String,

    /// Column holding the node identity
    pub node_id: String,

    /// Optional designated timestamp column. The optimizer's time-range
    /// rule only fires for labels that declare one.
    #[serde(default)]
    pub time_column: Option<String>,

    /// Table-size hint used by the cost model
    #[serde(default)]
    pub base_rows: Option<u64>,

    /// Graph property name → backing column
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub column: String,

    #[serde(rename = "type")]
    pub property_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    /// Relationship type in the graph
    #[serde(rename = "type")]
    pub rel_type: String,

    /// Label of the source node
    pub from: String,

    /// Label of the target node
    pub to: String,

    /// Source workspace table holding the edges
    pub table: String,

    /// Column joining to the source node id
    pub source_column: String,

    /// Column joining to the target node id
    pub target_column: String,

    /// Optional join predicate template; `$from` / `$to` expand to the
    /// node tables' id columns.
    #[serde(default)]
    pub join_template: Option<String>,

    /// strong | weak
    #[serde(default)]
    pub strength: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,

    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,

    #[serde(rename = "type")]
    pub column_type: String,

    #[serde(default)]
    pub required: bool,
}

impl CatalogConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        serde_yaml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CatalogError::Io(e.to_string()))?;
        Self::from_yaml_str(&content)
    }
}

/// Built-in security-graph schema used when no schema file is configured.
/// Mirrors the common Sentinel identity/device tables.
pub const DEFAULT_SCHEMA_YAML: &str = r#"
graph:
  nodes:
    - label: User
      table: IdentityInfo
      node_id: AccountObjectId
      time_column: TimeGenerated
      base_rows: 50000
      properties:
        name: { column: AccountDisplayName, type: string }
        email: { column: AccountUPN, type: string }
        age: { column: AccountAgeDays, type: integer }
        role: { column: AssignedRoles, type: string }
        status: { column: UserState, type: string }
        department: { column: Department, type: string }
        last_seen: { column: TimeGenerated, type: datetime }
    - label: Device
      table: DeviceInfo
      node_id: DeviceId
      time_column: Timestamp
      base_rows: 20000
      properties:
        name: { column: DeviceName, type: string }
        os: { column: OSPlatform, type: string }
        risk_score: { column: RiskScore, type: float }
    - label: IpAddress
      table: DeviceNetworkInfo
      node_id: IPAddress
      base_rows: 80000
      properties:
        address: { column: IPAddress, type: string }
        subnet: { column: SubnetPrefix, type: string }
  relationships:
    - type: KNOWS
      from: User
      to: User
      table: UserPeerEvents
      source_column: SourceAccountId
      target_column: TargetAccountId
      strength: strong
    - type: OWNS
      from: User
      to: Device
      table: DeviceOwnership
      source_column: AccountObjectId
      target_column: DeviceId
      strength: strong
    - type: FOLLOWS
      from: User
      to: User
      table: UserPeerEvents
      source_column: SourceAccountId
      target_column: TargetAccountId
      strength: weak
    - type: LOGGED_INTO
      from: User
      to: Device
      table: SigninLogs
      source_column: UserId
      target_column: DeviceId
      strength: weak
    - type: CONNECTED_TO
      from: Device
      to: IpAddress
      table: DeviceNetworkEvents
      source_column: DeviceId
      target_column: RemoteIP
      strength: weak
  tables:
    - name: IdentityInfo
      columns:
        - { name: AccountObjectId, type: guid, required: true }
        - { name: AccountDisplayName, type: string }
        - { name: AccountUPN, type: string }
        - { name: AccountAgeDays, type: integer }
        - { name: AssignedRoles, type: string }
        - { name: UserState, type: string }
        - { name: Department, type: string }
        - { name: TimeGenerated, type: datetime, required: true }
    - name: DeviceInfo
      columns:
        - { name: DeviceId, type: string, required: true }
        - { name: DeviceName, type: string }
        - { name: OSPlatform, type: string }
        - { name: RiskScore, type: float }
        - { name: Timestamp, type: datetime }
    - name: DeviceNetworkInfo
      columns:
        - { name: IPAddress, type: string, required: true }
        - { name: SubnetPrefix, type: string }
    - name: UserPeerEvents
      columns:
        - { name: SourceAccountId, type: guid, required: true }
        - { name: TargetAccountId, type: guid, required: true }
    - name: DeviceOwnership
      columns:
        - { name: AccountObjectId, type: guid, required: true }
        - { name: DeviceId, type: string, required: true }
    - name: SigninLogs
      columns:
        - { name: UserId, type: guid, required: true }
        - { name: DeviceId, type: string }
    - name: DeviceNetworkEvents
      columns:
        - { name: DeviceId, type: string, required: true }
        - { name: RemoteIP, type: string, required: true }
"#;
