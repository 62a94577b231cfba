//! RSS syndication module: update schedule hints.

use std::any::Any;
use std::fmt;

use time::OffsetDateTime;

use super::FeedExtension;
use crate::date::parse_date;
use crate::document::XPathScope;
use crate::namespaces;

pub const NAME: &str = "Syndication";

/// `sy:updatePeriod` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdatePeriod {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl UpdatePeriod {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hourly" => Some(UpdatePeriod::Hourly),
            "daily" => Some(UpdatePeriod::Daily),
            "weekly" => Some(UpdatePeriod::Weekly),
            "monthly" => Some(UpdatePeriod::Monthly),
            "yearly" => Some(UpdatePeriod::Yearly),
            _ => None,
        }
    }

    /// Length of the period in seconds; months are 30 days, years 365.
    pub fn seconds(self) -> u64 {
        match self {
            UpdatePeriod::Hourly => 3_600,
            UpdatePeriod::Daily => 86_400,
            UpdatePeriod::Weekly => 604_800,
            UpdatePeriod::Monthly => 2_592_000,
            UpdatePeriod::Yearly => 31_536_000,
        }
    }
}

impl fmt::Display for UpdatePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdatePeriod::Hourly => "hourly",
            UpdatePeriod::Daily => "daily",
            UpdatePeriod::Weekly => "weekly",
            UpdatePeriod::Monthly => "monthly",
            UpdatePeriod::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

pub struct Feed {
    scope: XPathScope,
}

impl Feed {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: scope.bind("sy", namespaces::SYNDICATION) }
    }

    /// The update period, `daily` when absent or unrecognised.
    pub fn update_period(&self) -> UpdatePeriod {
        match self.scope.trimmed(&self.scope.path("/sy:updatePeriod")) {
            Some(value) => UpdatePeriod::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "unrecognised sy:updatePeriod, assuming daily");
                UpdatePeriod::default()
            }),
            None => UpdatePeriod::default(),
        }
    }

    /// Updates per period, `1` when absent or not a positive integer.
    pub fn update_frequency(&self) -> u32 {
        self.scope
            .trimmed(&self.scope.path("/sy:updateFrequency"))
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|frequency| *frequency > 0)
            .unwrap_or(1)
    }

    pub fn update_base(&self) -> Option<OffsetDateTime> {
        self.scope
            .trimmed(&self.scope.path("/sy:updateBase"))
            .and_then(|value| parse_date(&value))
    }

    /// Seconds between updates.
    pub fn ticks(&self) -> u64 {
        self.update_period().seconds() / u64::from(self.update_frequency())
    }
}

impl FeedExtension for Feed {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
