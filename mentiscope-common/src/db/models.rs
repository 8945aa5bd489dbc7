//! Database models
//!
//! Enumerated columns are stored as their snake_case names. The same names
//! are used on the wire, so these types serialize straight into API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Declares a string-backed enum with `as_str`, `Display` and `FromStr`
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// All variants in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored / wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

text_enum! {
    /// Account role
    UserRole {
        Parent => "parent",
        Admin => "admin",
        Counselor => "counselor",
    }
}

text_enum! {
    /// Payment subscription state of a user
    SubscriptionStatus {
        Active => "active",
        Inactive => "inactive",
        Canceled => "canceled",
    }
}

text_enum! {
    /// Kind of check-in round
    AssessmentType {
        Onboarding => "onboarding",
        WeeklyCheckin => "weekly_checkin",
        AdHoc => "ad_hoc",
    }
}

text_enum! {
    /// Insight card category
    InsightType {
        Risk => "risk",
        Strength => "strength",
        Habit => "habit",
        Trend => "trend",
    }
}

text_enum! {
    /// Who an action plan is addressed to
    RoleTarget {
        Parent => "parent",
        Student => "student",
    }
}

text_enum! {
    /// Progress of an action plan
    ActionStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
    }
}

/// Parent (or staff) account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque id issued by the identity provider
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_subscribed: bool,
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
}

/// Child being assessed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub parent_id: String,
    pub name: String,
    pub grade_level: String,
    pub school_type: Option<String>,
    /// Latest readiness score, 0-100
    pub readiness_score: i64,
    pub created_at: DateTime<Utc>,
}

/// One submitted round of questionnaire answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    pub student_id: Uuid,
    #[serde(rename = "type")]
    pub assessment_type: AssessmentType,
    /// Raw answers, e.g. `{"q2_sleep_hours": 7}`
    pub data: Value,
    /// JSON object returned by the analysis, once available
    pub analysis_results: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// AI-derived observation card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub student_id: Uuid,
    pub assessment_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub observation: String,
    pub interpretation: String,
    pub confidence_score: i64,
    /// Reference catalog key this insight relates to
    pub dimension: Option<String>,
    /// APA citations backing the insight
    pub scientific_references: Option<Value>,
    pub is_viewed: bool,
    pub created_at: DateTime<Utc>,
}

/// Recommended task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub id: Uuid,
    pub student_id: Uuid,
    pub insight_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub role_target: RoleTarget,
    pub status: ActionStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insight row to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewInsight {
    pub student_id: Uuid,
    pub assessment_id: Option<Uuid>,
    pub insight_type: InsightType,
    pub title: String,
    pub observation: String,
    pub interpretation: String,
    pub confidence_score: i64,
    pub dimension: Option<String>,
    pub scientific_references: Option<Value>,
}

/// Action plan row to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewActionPlan {
    pub student_id: Uuid,
    pub insight_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub role_target: RoleTarget,
}
