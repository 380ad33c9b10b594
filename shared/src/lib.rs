use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of client record. Individual clients have no contacts or members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    Organization,
    Individual,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Individual => "individual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "organization" => Some(Self::Organization),
            "individual" => Some(Self::Individual),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document attached to a client. Stored embedded in the client row as a
/// single JSON collection, not as separate relational rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientDocument {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub client_type: ClientType,
    pub description: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
    pub is_archived: bool,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub documents: Vec<ClientDocument>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientContact {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub position: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMember {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub document_url: Option<String>,
    pub document_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Slim trip row. Only the columns purge and reporting touch; the full
/// trip screen has its own payloads.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub origin: String,
    pub destination: String,
    pub trip_date: NaiveDate,
    pub price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub client_id: Option<Uuid>,
    pub number: String,
    pub amount: Decimal,
    pub status: String, // draft, sent, paid, overdue, cancelled
    pub issued_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_type_round_trips_through_strings() {
        assert_eq!(ClientType::parse("organization"), Some(ClientType::Organization));
        assert_eq!(ClientType::parse("individual"), Some(ClientType::Individual));
        assert_eq!(ClientType::parse("company"), None);
        assert_eq!(ClientType::Organization.to_string(), "organization");
    }

    #[test]
    fn client_type_serializes_lowercase() {
        let json = serde_json::to_string(&ClientType::Individual).unwrap();
        assert_eq!(json, "\"individual\"");
    }
}
