//! Status enums for orders and users.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Storage keeps the status as free text; [`OrderStatus::parse_lenient`]
/// maps it onto the four known states the console works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in display order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Interpret a stored status value.
    ///
    /// Missing or blank values count as pending; matching is
    /// case-insensitive. Unknown values yield `None`.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Option<Self> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Some(Self::Pending);
        }
        raw.parse().ok()
    }

    /// Value as stored in the `orders.status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Capitalised label for cards and chart legends.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Chart color for this status.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Pending => "#ffd700",
            Self::Processing => "#1976d2",
            Self::Completed => "#2e7d32",
            Self::Cancelled => "#d32f2f",
        }
    }

    /// CSS class for the status badge.
    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Pending => "badge badge-warning",
            Self::Processing => "badge badge-info",
            Self::Completed => "badge badge-success",
            Self::Cancelled => "badge badge-error",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Role of a backend user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// May operate the admin console.
    Admin,
    /// Regular shop customer.
    #[default]
    User,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_defaults_to_pending() {
        assert_eq!(OrderStatus::parse_lenient(None), Some(OrderStatus::Pending));
        assert_eq!(OrderStatus::parse_lenient(Some("  ")), Some(OrderStatus::Pending));
    }

    #[test]
    fn test_parse_lenient_ignores_case() {
        assert_eq!(
            OrderStatus::parse_lenient(Some("Completed")),
            Some(OrderStatus::Completed)
        );
        assert_eq!(
            OrderStatus::parse_lenient(Some("CANCELLED")),
            Some(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn test_parse_lenient_unknown_is_none() {
        assert_eq!(OrderStatus::parse_lenient(Some("refunded")), None);
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(OrderStatus::Pending.color(), "#ffd700");
        assert_eq!(OrderStatus::Processing.color(), "#1976d2");
        assert_eq!(OrderStatus::Completed.color(), "#2e7d32");
        assert_eq!(OrderStatus::Cancelled.color(), "#d32f2f");
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn test_user_role_round_trip() {
        for role in [UserRole::Admin, UserRole::User] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("owner".parse::<UserRole>().is_err());
    }
}
