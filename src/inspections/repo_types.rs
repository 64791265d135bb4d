use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Inspection timestamps: RFC 3339 on output; on input RFC 3339, or an
/// offset-less ISO 8601 date-time taken as UTC.
mod inspection_date {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::{
        format_description::well_known::{Iso8601, Rfc3339},
        OffsetDateTime, PrimitiveDateTime,
    };

    pub fn serialize<S: Serializer>(date: &OffsetDateTime, s: S) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::serialize(date, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<OffsetDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(D::Error::custom)
    }

    fn parse(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(raw, &Rfc3339).or_else(|_| {
            PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).map(PrimitiveDateTime::assume_utc)
        })
    }
}

/// Per-wheel health reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "tyre_condition", rename_all = "lowercase")]
pub enum TyreCondition {
    Good,
    Bad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Inspection {
    pub id: i64,
    pub car_id: i64,
    #[serde(with = "inspection_date")]
    pub date: OffsetDateTime,
    #[serde(rename = "frontLeft")]
    pub front_left: TyreCondition,
    #[serde(rename = "frontRight")]
    pub front_right: TyreCondition,
    #[serde(rename = "rearLeft")]
    pub rear_left: TyreCondition,
    #[serde(rename = "rearRight")]
    pub rear_right: TyreCondition,
    pub notes: Option<String>,
}

impl Inspection {
    pub fn readings(&self) -> [TyreCondition; 4] {
        [self.front_left, self.front_right, self.rear_left, self.rear_right]
    }

    /// True when at least one wheel was recorded as bad.
    pub fn is_failing(&self) -> bool {
        self.readings().contains(&TyreCondition::Bad)
    }
}

/// Writable inspection fields, shared by create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionInput {
    #[serde(with = "inspection_date")]
    pub date: OffsetDateTime,
    #[serde(rename = "frontLeft")]
    pub front_left: TyreCondition,
    #[serde(rename = "frontRight")]
    pub front_right: TyreCondition,
    #[serde(rename = "rearLeft")]
    pub rear_left: TyreCondition,
    #[serde(rename = "rearRight")]
    pub rear_right: TyreCondition,
    #[serde(default)]
    pub notes: Option<String>,
}
